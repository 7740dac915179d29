use alloc::string::String;

use displaydoc::Display;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Error {
    /// Invalid flow network: {0}
    Validation(ValidationError),
    /// Internal invariant violated: {0}
    InternalInvariant(InvariantError),
    /// Augmentation budget of {0} exhausted before the flow became maximal
    BudgetExhausted(usize),
    /// Arithmetic overflow: {0}
    ArithmeticOverflow(String),
}

/// Problems with the input network, reported before any search begins.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum ValidationError {
    /// flow networks require a directed graph
    UndirectedGraph,
    /// source vertex is not part of the graph
    MissingSource,
    /// sink vertex is not part of the graph
    MissingSink,
    /// invalid capacity on edge {0}, expected a non-negative value
    InvalidCapacity(String),
    /// more than one edge {0}, parallel edges are not supported
    ParallelEdge(String),
}

/// Signals a bug in a search strategy or in the residual bookkeeping.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum InvariantError {
    /// augmenting path without arcs
    EmptyPath,
    /// bottleneck {0} is not strictly positive
    NonPositiveBottleneck(String),
    /// bottleneck {0} differs from the minimum residual capacity on the path
    BottleneckMismatch(String),
    /// residual capacity of arc {0} became negative
    NegativeResidual(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<InvariantError> for Error {
    fn from(e: InvariantError) -> Self {
        Error::InternalInvariant(e)
    }
}
