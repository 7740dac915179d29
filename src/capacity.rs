use core::fmt::{Debug, Display};
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use num_traits::{CheckedAdd, One, Zero};

/// Relative tolerance used when comparing floating point flow values.
pub const FLOAT_TOLERANCE: f64 = 1e-9;

/// A trait representing an edge capacity (and therefore a flow amount).
///
/// Floating point capacities are only partially ordered, so `PartialOrd` is all that is
/// required. A capacity that does not compare as `>= 0` (negative or NaN) is rejected when
/// the residual network is built.
pub trait Capacity:
    Copy
    + Sum<Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + PartialOrd
    + AddAssign
    + SubAssign
    + Zero
    + One
    + Debug
    + Display
{
    /// Equality up to the rounding error accumulated by repeated augmentation.
    fn approx_eq(self, other: Self) -> bool {
        self == other
    }

    fn is_positive(self) -> bool {
        self > Self::zero()
    }

    fn is_valid_capacity(self) -> bool {
        self >= Self::zero()
    }

    /// Sum of two capacities, `None` if it is not representable.
    fn checked_add(self, other: Self) -> Option<Self>;
}

impl Capacity for i32 {
    fn checked_add(self, other: Self) -> Option<Self> {
        CheckedAdd::checked_add(&self, &other)
    }
}

impl Capacity for i64 {
    fn checked_add(self, other: Self) -> Option<Self> {
        CheckedAdd::checked_add(&self, &other)
    }
}

impl Capacity for u32 {
    fn checked_add(self, other: Self) -> Option<Self> {
        CheckedAdd::checked_add(&self, &other)
    }
}

impl Capacity for u64 {
    fn checked_add(self, other: Self) -> Option<Self> {
        CheckedAdd::checked_add(&self, &other)
    }
}

// Infinite capacities turn residual updates into `inf - inf`, so floats must stay finite.
impl Capacity for f32 {
    fn approx_eq(self, other: Self) -> bool {
        float_approx_eq(f64::from(self), f64::from(other))
    }

    fn is_valid_capacity(self) -> bool {
        self.is_finite() && self >= 0.0
    }

    fn checked_add(self, other: Self) -> Option<Self> {
        let sum = self + other;
        sum.is_finite().then_some(sum)
    }
}

impl Capacity for f64 {
    fn approx_eq(self, other: Self) -> bool {
        float_approx_eq(self, other)
    }

    fn is_valid_capacity(self) -> bool {
        self.is_finite() && self >= 0.0
    }

    fn checked_add(self, other: Self) -> Option<Self> {
        let sum = self + other;
        sum.is_finite().then_some(sum)
    }
}

fn float_approx_eq(a: f64, b: f64) -> bool {
    let diff = if a > b { a - b } else { b - a };
    let magnitude = [1.0, a, -a, b, -b].into_iter().fold(0.0, f64::max);
    diff <= FLOAT_TOLERANCE * magnitude
}
