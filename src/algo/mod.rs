use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use itertools::Itertools;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::capacity::Capacity;
use crate::residual::ResidualNetwork;

pub mod bfs;
pub mod blocking_flow;

/// Which augmenting-path search drives a solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Edmonds-Karp: shortest augmenting paths found by breadth-first search, O(V·E²)
    #[default]
    Bfs,
    /// Dinic: blocking flows over level graphs, O(V²·E)
    BlockingFlow,
}

/// A source-to-sink path in the residual network together with its bottleneck.
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentingPath<C> {
    arcs: Vec<EdgeIndex>,
    bottleneck: C,
}

impl<C: Capacity> AugmentingPath<C> {
    /// Creates a path over `arcs` (ordered from source to sink), using the smallest residual
    /// capacity along them as the bottleneck. Returns `None` for an empty arc list.
    pub fn new<N>(network: &ResidualNetwork<N, C>, arcs: Vec<EdgeIndex>) -> Option<Self>
    where
        N: Copy + Ord + Debug,
    {
        let bottleneck = min_residual(network, &arcs)?;
        Some(Self { arcs, bottleneck })
    }

    pub fn arcs(&self) -> &[EdgeIndex] {
        &self.arcs
    }

    pub fn bottleneck(&self) -> C {
        self.bottleneck
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Vertices visited by the path, source first.
    pub fn vertices<N>(&self, network: &ResidualNetwork<N, C>) -> Vec<N>
    where
        N: Copy + Ord + Debug,
    {
        let graph = network.graph();
        self.arcs
            .iter()
            .filter_map(|arc| graph.edge_endpoints(*arc))
            .enumerate()
            .flat_map(|(i, (u, v))| (i == 0).then_some(u).into_iter().chain([v]))
            .map(|n| network.vertex(n))
            .collect()
    }

    pub(crate) fn describe<N>(&self, network: &ResidualNetwork<N, C>) -> String
    where
        N: Copy + Ord + Debug,
    {
        self.vertices(network)
            .iter()
            .map(|n| format!("{n:?}"))
            .join(" -> ")
    }
}

/// Smallest residual capacity over `arcs`, `None` if there are none.
pub(crate) fn min_residual<N, C>(network: &ResidualNetwork<N, C>, arcs: &[EdgeIndex]) -> Option<C>
where
    N: Copy + Ord + Debug,
    C: Capacity,
{
    arcs.iter()
        .map(|arc| network.residual(*arc))
        .reduce(|min, r| if r < min { r } else { min })
}

/// An augmenting-path search over a residual network.
///
/// Searches never mutate the network; the caller applies each returned path (see
/// [`crate::accumulator::FlowAccumulator`]) before asking for the next one. A search may keep
/// state between calls as long as it stays valid across those augmentations.
pub trait AugmentingPathSearch<N, C> {
    /// Finds the next augmenting path from `source` to `sink`, or `None` once the flow is
    /// maximal.
    fn find_path(
        &mut self,
        network: &ResidualNetwork<N, C>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Option<AugmentingPath<C>>;

    /// Number of search phases run so far.
    fn phases(&self) -> usize;
}
