use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::{VisitMap, Visitable};

use crate::algo::{AugmentingPath, AugmentingPathSearch};
use crate::capacity::Capacity;
use crate::residual::ResidualNetwork;

/// Shortest augmenting paths (Edmonds-Karp).
///
/// Every call runs one breadth-first traversal of the residual network, so each path found
/// has the fewest arcs among all augmenting paths. This bounds the number of augmentations
/// by O(V·E).
#[derive(Clone, Debug, Default)]
pub struct BfsSearch {
    // arc used to discover each vertex, with the vertex it was discovered from
    predecessor: Vec<Option<(EdgeIndex, NodeIndex)>>,
    queue: VecDeque<NodeIndex>,
    searches: usize,
}

impl BfsSearch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N, C> AugmentingPathSearch<N, C> for BfsSearch
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

        self.predecessor.clear();
        self.predecessor.resize(network.node_count(), None);
        self.queue.clear();

        let mut discovered = network.graph().visit_map();
        discovered.visit(source);
        self.queue.push_back(source);

        'search: while let Some(u) = self.queue.pop_front() {
            for (arc, v, residual) in network.outgoing(u) {
                if !residual.is_positive() || !discovered.visit(v) {
                    continue;
                }
                self.predecessor[v.index()] = Some((arc, u));
                if v == sink {
                    break 'search;
                }
                self.queue.push_back(v);
            }
        }

        if !discovered.is_visited(&sink) {
            return None;
        }

        let mut arcs = Vec::new();
        let mut v = sink;
        while let Some((arc, u)) = self.predecessor[v.index()] {
            arcs.push(arc);
            v = u;
        }
        arcs.reverse();

        self.searches += 1;
        AugmentingPath::new(network, arcs)
    }

    fn phases(&self) -> usize {
        self.searches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residual::build_residual;
    use alloc::vec;
    use petgraph::graph::DiGraph;

    #[test]
    fn finds_the_path_with_fewest_arcs() {
        // s -> a -> b -> t is wider, but s -> c -> t is shorter
        let mut g = DiGraph::<&str, i64>::new();
        let s = g.add_node("s");
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        let t = g.add_node("t");
        g.extend_with_edges([(s, a, 10), (a, b, 10), (b, t, 10), (s, c, 1), (c, t, 2)]);

        let network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let path = BfsSearch::new()
            .find_path(&network, network.source(), network.sink())
            .unwrap();

        assert_eq!(path.vertices(&network), vec![s, c, t]);
        assert_eq!(path.bottleneck(), 1);
    }

    #[test]
    fn saturated_arcs_are_not_followed() {
        let mut g = DiGraph::<(), i64>::new();
        let s = g.add_node(());
        let m = g.add_node(());
        let t = g.add_node(());
        g.extend_with_edges([(s, m, 0), (m, t, 5)]);

        let network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let mut search = BfsSearch::new();
        assert!(search
            .find_path(&network, network.source(), network.sink())
            .is_none());
        assert_eq!(AugmentingPathSearch::<NodeIndex, i64>::phases(&search), 0);
    }

    #[test]
    fn no_path_when_source_is_sink() {
        let mut g = DiGraph::<(), i64>::new();
        let s = g.add_node(());
        let t = g.add_node(());
        g.add_edge(s, t, 3);

        let network = build_residual(&g, s, s, |e| Some(*e.weight())).unwrap();
        assert!(BfsSearch::new()
            .find_path(&network, network.source(), network.sink())
            .is_none());
    }
}
