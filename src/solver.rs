use alloc::collections::BTreeMap;
use core::fmt::Debug;

use petgraph::visit::{EdgeRef, GraphProp, IntoEdgeReferences, IntoNodeIdentifiers};
use serde::{Deserialize, Serialize};

use crate::accumulator::FlowAccumulator;
use crate::algo::bfs::BfsSearch;
use crate::algo::blocking_flow::BlockingFlowSearch;
use crate::algo::{AugmentingPathSearch, Strategy};
use crate::capacity::Capacity;
use crate::cut::{extract_min_cut, MinCut};
use crate::error::Error;
use crate::residual::{build_residual, NodePair, ResidualNetwork};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub strategy: Strategy,
    /// Fail with [`Error::BudgetExhausted`] instead of applying more augmenting paths than
    /// this. Unlimited when `None`.
    pub max_augmentations: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlowStats {
    pub augmentations: usize,
    /// Level graphs built for the blocking-flow strategy, breadth-first searches that found
    /// a path for the BFS strategy.
    pub phases: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaxFlow<N, C> {
    /// Flow on every edge of the input graph.
    pub flows: BTreeMap<NodePair<N>, C>,
    pub value: C,
    pub stats: FlowStats,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solution<N, C> {
    pub flow: MaxFlow<N, C>,
    pub cut: MinCut<N, C>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrategyComparison<C> {
    pub bfs_value: C,
    pub blocking_value: C,
    pub bfs_stats: FlowStats,
    pub blocking_stats: FlowStats,
    pub equal: bool,
}

/// Runs one complete solve: build the residual network, augment until no path is left, then
/// extract the minimum cut.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        Self::new(SolverConfig {
            strategy,
            ..SolverConfig::default()
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves with the edge weights of `g` as capacities.
    pub fn solve<G, C>(
        &self,
        g: G,
        source: G::NodeId,
        sink: G::NodeId,
    ) -> Result<Solution<G::NodeId, C>, Error>
    where
        G: IntoEdgeReferences<EdgeWeight = C> + IntoNodeIdentifiers + GraphProp,
        G::NodeId: Ord + Debug,
        C: Capacity,
    {
        self.solve_with(g, source, sink, |e| Some(*e.weight()))
    }

    /// Solves with capacities read through `capacity_of`; `None` means a capacity of one.
    pub fn solve_with<G, C, F>(
        &self,
        g: G,
        source: G::NodeId,
        sink: G::NodeId,
        capacity_of: F,
    ) -> Result<Solution<G::NodeId, C>, Error>
    where
        G: IntoEdgeReferences + IntoNodeIdentifiers + GraphProp,
        G::NodeId: Ord + Debug,
        C: Capacity,
        F: FnMut(G::EdgeRef) -> Option<C>,
    {
        log::trace!("stage: build residual network ({:?})", self.config.strategy);
        let mut network = build_residual(g, source, sink, capacity_of)?;

        let (accumulator, phases) = match self.config.strategy {
            Strategy::Bfs => self.augment(&mut network, BfsSearch::new())?,
            Strategy::BlockingFlow => self.augment(&mut network, BlockingFlowSearch::new())?,
        };

        log::trace!("stage: extract cut");
        let cut = extract_min_cut(&network)?;
        if !cut.value.approx_eq(accumulator.value()) {
            log::warn!(
                "cut value {:?} differs from flow value {:?}",
                cut.value,
                accumulator.value()
            );
        }

        log::debug!(
            "max flow {:?} after {} augmentations in {} phases",
            accumulator.value(),
            accumulator.augmentations(),
            phases
        );
        log::trace!("stage: done");

        Ok(Solution {
            flow: MaxFlow {
                flows: network.flows(),
                value: accumulator.value(),
                stats: FlowStats {
                    augmentations: accumulator.augmentations(),
                    phases,
                },
            },
            cut,
        })
    }

    /// Alternates path search and augmentation until the search runs dry.
    fn augment<N, C, S>(
        &self,
        network: &mut ResidualNetwork<N, C>,
        mut search: S,
    ) -> Result<(FlowAccumulator<C>, usize), Error>
    where
        N: Copy + Ord + Debug,
        C: Capacity,
        S: AugmentingPathSearch<N, C>,
    {
        let mut accumulator = FlowAccumulator::new();
        let (source, sink) = (network.source(), network.sink());

        if source == sink {
            log::debug!("source and sink coincide, flow is zero");
            return Ok((accumulator, 0));
        }

        log::trace!("stage: find path");
        while let Some(path) = search.find_path(network, source, sink) {
            if let Some(limit) = self.config.max_augmentations {
                if accumulator.augmentations() >= limit {
                    return Err(Error::BudgetExhausted(limit));
                }
            }
            log::trace!("stage: augment");
            accumulator.apply(network, &path)?;
        }
        log::trace!("stage: no path found");

        Ok((accumulator, search.phases()))
    }
}

/// Maximum flow from `source` to `sink`, reading capacities from the edge weights of `g`.
pub fn max_flow<G, C>(
    g: G,
    source: G::NodeId,
    sink: G::NodeId,
    strategy: Strategy,
) -> Result<MaxFlow<G::NodeId, C>, Error>
where
    G: IntoEdgeReferences<EdgeWeight = C> + IntoNodeIdentifiers + GraphProp,
    G::NodeId: Ord + Debug,
    C: Capacity,
{
    Ok(Solver::with_strategy(strategy).solve(g, source, sink)?.flow)
}

/// Maximum flow with capacities read through `capacity_of` (`None` means one).
pub fn max_flow_with<G, C, F>(
    g: G,
    source: G::NodeId,
    sink: G::NodeId,
    strategy: Strategy,
    capacity_of: F,
) -> Result<MaxFlow<G::NodeId, C>, Error>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + GraphProp,
    G::NodeId: Ord + Debug,
    C: Capacity,
    F: FnMut(G::EdgeRef) -> Option<C>,
{
    Ok(Solver::with_strategy(strategy)
        .solve_with(g, source, sink, capacity_of)?
        .flow)
}

/// Minimum `source`/`sink` cut, found by running the default strategy to completion.
pub fn min_cut<G, C>(g: G, source: G::NodeId, sink: G::NodeId) -> Result<MinCut<G::NodeId, C>, Error>
where
    G: IntoEdgeReferences<EdgeWeight = C> + IntoNodeIdentifiers + GraphProp,
    G::NodeId: Ord + Debug,
    C: Capacity,
{
    Ok(Solver::default().solve(g, source, sink)?.cut)
}

/// Runs both strategies on `g` and reports whether they agree on the flow value.
pub fn compare_strategies<G, C>(
    g: G,
    source: G::NodeId,
    sink: G::NodeId,
) -> Result<StrategyComparison<C>, Error>
where
    G: IntoEdgeReferences<EdgeWeight = C> + IntoNodeIdentifiers + GraphProp,
    G::NodeId: Ord + Debug,
    C: Capacity,
{
    let bfs = max_flow(g, source, sink, Strategy::Bfs)?;
    let blocking = max_flow(g, source, sink, Strategy::BlockingFlow)?;

    let equal = bfs.value.approx_eq(blocking.value);
    if !equal {
        log::warn!(
            "strategies disagree: bfs {:?}, blocking flow {:?}",
            bfs.value,
            blocking.value
        );
    }

    Ok(StrategyComparison {
        bfs_value: bfs.value,
        blocking_value: blocking.value,
        bfs_stats: bfs.stats,
        blocking_stats: blocking.stats,
        equal,
    })
}
