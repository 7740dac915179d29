use alloc::format;
use core::fmt::Debug;

use crate::algo::{min_residual, AugmentingPath};
use crate::capacity::Capacity;
use crate::error::{Error, InvariantError};
use crate::residual::ResidualNetwork;

/// Applies augmenting paths to a residual network and keeps the running flow value.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowAccumulator<C> {
    value: C,
    augmentations: usize,
}

impl<C: Capacity> Default for FlowAccumulator<C> {
    fn default() -> Self {
        Self {
            value: C::zero(),
            augmentations: 0,
        }
    }
}

impl<C: Capacity> FlowAccumulator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> C {
        self.value
    }

    pub fn augmentations(&self) -> usize {
        self.augmentations
    }

    /// Pushes the bottleneck of `path` along every arc of it.
    ///
    /// The bottleneck must be strictly positive and equal to the smallest residual capacity
    /// on the path. Anything else means a search strategy is broken and is reported as an
    /// internal invariant violation before the network is touched.
    pub fn apply<N>(
        &mut self,
        network: &mut ResidualNetwork<N, C>,
        path: &AugmentingPath<C>,
    ) -> Result<(), Error>
    where
        N: Copy + Ord + Debug,
    {
        let bottleneck = path.bottleneck();
        let min = min_residual(network, path.arcs()).ok_or(InvariantError::EmptyPath)?;
        if !bottleneck.is_positive() {
            return Err(InvariantError::NonPositiveBottleneck(format!("{bottleneck:?}")).into());
        }
        if min != bottleneck {
            return Err(InvariantError::BottleneckMismatch(format!(
                "{bottleneck:?} (minimum {min:?})"
            ))
            .into());
        }

        let value = self
            .value
            .checked_add(bottleneck)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("flow value {:?}", self.value)))?;

        log::trace!(
            "augmenting {:?} along {}",
            bottleneck,
            path.describe(network)
        );
        for arc in path.arcs() {
            network.push(*arc, bottleneck)?;
        }

        self.value = value;
        self.augmentations += 1;
        Ok(())
    }
}
