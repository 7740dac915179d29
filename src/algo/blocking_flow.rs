use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;

use petgraph::graph::{EdgeIndex, NodeIndex, WalkNeighbors};

use crate::algo::{AugmentingPath, AugmentingPathSearch};
use crate::capacity::Capacity;
use crate::residual::{ArcGraph, ResidualNetwork};

/// Resume pointer into the outgoing arcs of one vertex.
///
/// The cursor only moves forward within a phase, so an arc proven useless is never looked
/// at again until the next level graph is built.
struct Cursor {
    walk: WalkNeighbors<u32>,
    current: Option<(EdgeIndex, NodeIndex)>,
}

impl Cursor {
    fn new<N, C>(graph: &ArcGraph<N, C>, u: NodeIndex) -> Self {
        let mut walk = graph.neighbors(u).detach();
        let current = walk.next(graph);
        Self { walk, current }
    }

    fn skip<N, C>(&mut self, graph: &ArcGraph<N, C>) {
        self.current = self.walk.next(graph);
    }
}

/// Blocking flows over level graphs (Dinic).
///
/// A phase starts by labelling every vertex with its breadth-first distance from the source
/// over arcs with residual capacity. Paths are then found by depth-first search that only
/// advances one level at a time, resuming every vertex from its cursor. When the level
/// graph holds no more paths the flow found in the phase is blocking and a new level graph
/// is built from the updated network; the search ends once the sink gets no level.
///
/// Runs in O(V²·E), and O(E·√V) on unit-capacity networks.
#[derive(Default)]
pub struct BlockingFlowSearch {
    levels: Vec<Option<usize>>,
    cursors: Vec<Cursor>,
    in_phase: bool,
    phases: usize,
}

impl BlockingFlowSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance of `u` from the source in the current level graph.
    pub fn level(&self, u: NodeIndex) -> Option<usize> {
        self.levels.get(u.index()).copied().flatten()
    }

    /// Labels vertices with their distance from `source`, returns whether `sink` got one.
    fn build_level_graph<N, C>(
        &mut self,
        network: &ResidualNetwork<N, C>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> bool
    where
        N: Copy + Ord + Debug,
        C: Capacity,
    {
        self.levels.clear();
        self.levels.resize(network.node_count(), None);
        self.levels[source.index()] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            let next = self.levels[u.index()].map(|l| l + 1);
            for (_, v, residual) in network.outgoing(u) {
                if residual.is_positive() && self.levels[v.index()].is_none() {
                    self.levels[v.index()] = next;
                    queue.push_back(v);
                }
            }
        }

        self.level(sink).is_some()
    }

    fn is_admissible(&self, u: NodeIndex, v: NodeIndex) -> bool {
        matches!((self.level(u), self.level(v)), (Some(lu), Some(lv)) if lv == lu + 1)
    }

    /// First arc at or after the cursor of `u` that is still part of the level graph.
    fn admissible_arc<N, C>(
        &mut self,
        network: &ResidualNetwork<N, C>,
        u: NodeIndex,
    ) -> Option<(EdgeIndex, NodeIndex)>
    where
        N: Copy + Ord + Debug,
        C: Capacity,
    {
        loop {
            let (arc, v) = self.cursors[u.index()].current?;
            if network.residual(arc).is_positive() && self.is_admissible(u, v) {
                return Some((arc, v));
            }
            self.cursors[u.index()].skip(network.graph());
        }
    }

    /// Depth-first search for the next path of the current level graph.
    ///
    /// A vertex whose cursor runs out is a dead end for the rest of the phase: it loses its
    /// level and the arc leading into it is skipped.
    fn advance<N, C>(
        &mut self,
        network: &ResidualNetwork<N, C>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Option<Vec<EdgeIndex>>
    where
        N: Copy + Ord + Debug,
        C: Capacity,
    {
        let mut stack: Vec<(EdgeIndex, NodeIndex)> = Vec::new();
        let mut u = source;
        while u != sink {
            match self.admissible_arc(network, u) {
                Some((arc, v)) => {
                    stack.push((arc, u));
                    u = v;
                }
                None => {
                    self.levels[u.index()] = None;
                    let (_, tail) = stack.pop()?;
                    self.cursors[tail.index()].skip(network.graph());
                    u = tail;
                }
            }
        }
        Some(stack.into_iter().map(|(arc, _)| arc).collect())
    }
}

impl<N, C> AugmentingPathSearch<N, C> for BlockingFlowSearch
where
    N: Copy + Ord + Debug,
    C: Capacity,
{
    fn find_path(
        &mut self,
        network: &ResidualNetwork<N, C>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Option<AugmentingPath<C>> {
        if source == sink {
            return None;
        }

        loop {
            if !self.in_phase {
                if !self.build_level_graph(network, source, sink) {
                    log::debug!("sink unreachable after {} phases", self.phases);
                    return None;
                }
                let graph = network.graph();
                self.cursors = graph
                    .node_indices()
                    .map(|u| Cursor::new(graph, u))
                    .collect();
                self.in_phase = true;
                self.phases += 1;
                log::debug!(
                    "phase {}: sink at level {:?}",
                    self.phases,
                    self.level(sink)
                );
            }

            if let Some(arcs) = self.advance(network, source, sink) {
                return AugmentingPath::new(network, arcs);
            }

            // blocking flow reached, the level graph is stale
            self.in_phase = false;
        }
    }

    fn phases(&self) -> usize {
        self.phases
    }
}
