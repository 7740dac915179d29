use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;

use petgraph::graph::NodeIndex;
use petgraph::visit::{Bfs, EdgeFiltered, EdgeRef, Visitable};
use serde::Serialize;

use crate::capacity::Capacity;
use crate::error::Error;
use crate::residual::ResidualNetwork;

/// A source/sink partition of the vertices and the capacity of the edges crossing it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MinCut<N, C> {
    pub source_side: BTreeSet<N>,
    pub sink_side: BTreeSet<N>,
    pub value: C,
}

impl<N: Ord, C> MinCut<N, C> {
    pub fn separates(&self, u: &N, v: &N) -> bool {
        self.source_side.contains(u) && self.sink_side.contains(v)
    }
}

/// Extracts the minimum cut from a residual network that has no augmenting path left.
///
/// The source side is everything still reachable from the source over arcs with residual
/// capacity. When source and sink coincide nothing can be separated and every vertex lands
/// on the source side.
///
/// With several minimum cuts of equal value this is the one with the smallest source side.
pub fn extract_min_cut<N, C>(network: &ResidualNetwork<N, C>) -> Result<MinCut<N, C>, Error>
where
    N: Copy + Ord + Debug,
    C: Capacity,
{
    let graph = network.graph();

    if network.source() == network.sink() {
        return Ok(MinCut {
            source_side: network.vertices().collect(),
            sink_side: BTreeSet::new(),
            value: C::zero(),
        });
    }

    let residual_graph = EdgeFiltered::from_fn(graph, |e| e.weight().residual().is_positive());
    let mut reachable = graph.visit_map();
    let mut bfs = Bfs::new(&residual_graph, network.source());
    while let Some(n) = bfs.next(&residual_graph) {
        reachable.insert(n.index());
    }

    let value = network
        .arc_references()
        .filter(|e| {
            e.weight().is_original()
                && reachable.contains(e.source().index())
                && !reachable.contains(e.target().index())
        })
        .try_fold(C::zero(), |acc, e| acc.checked_add(e.weight().capacity()))
        .ok_or_else(|| Error::ArithmeticOverflow("cut value".into()))?;

    let (source_side, sink_side): (Vec<NodeIndex>, Vec<NodeIndex>) = graph
        .node_indices()
        .partition(|n| reachable.contains(n.index()));
    let to_vertices = |side: Vec<NodeIndex>| -> BTreeSet<N> {
        side.into_iter().map(|n| network.vertex(n)).collect()
    };

    Ok(MinCut {
        source_side: to_vertices(source_side),
        sink_side: to_vertices(sink_side),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::FlowAccumulator;
    use crate::algo::bfs::BfsSearch;
    use crate::algo::AugmentingPathSearch;
    use crate::residual::build_residual;
    use petgraph::graph::DiGraph;

    #[test]
    fn exhausted_network_is_cut_at_the_saturated_source_edges() {
        let mut g = DiGraph::<&str, f64>::new();
        let s = g.add_node("s");
        let a = g.add_node("a");
        let b = g.add_node("b");
        let t = g.add_node("t");
        g.extend_with_edges([
            (s, a, 3.0),
            (s, b, 2.0),
            (a, b, 1.0),
            (a, t, 2.0),
            (b, t, 3.0),
        ]);

        let mut network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let mut search = BfsSearch::new();
        let mut accumulator = FlowAccumulator::new();
        while let Some(path) = search.find_path(&network, s, t) {
            accumulator.apply(&mut network, &path).unwrap();
        }

        // {s, a, b} / {t} has the same value, but a and b are not reachable once s -> a
        // and s -> b are saturated
        let cut = extract_min_cut(&network).unwrap();
        assert_eq!(cut.source_side, BTreeSet::from([s]));
        assert_eq!(cut.sink_side, BTreeSet::from([a, b, t]));
        assert_eq!(cut.value, 5.0);
        assert_eq!(cut.value, accumulator.value());
        assert!(cut.separates(&s, &a));
        assert!(!cut.separates(&a, &t));
    }

    #[test]
    fn reverse_edges_do_not_count_towards_the_cut() {
        // t -> s points backwards across the cut and must not be counted
        let mut g = DiGraph::<(), f64>::new();
        let s = g.add_node(());
        let t = g.add_node(());
        g.extend_with_edges([(s, t, 1.0), (t, s, 9.0)]);

        let mut network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let path = BfsSearch::new().find_path(&network, s, t).unwrap();
        FlowAccumulator::new().apply(&mut network, &path).unwrap();

        let cut = extract_min_cut(&network).unwrap();
        assert_eq!(cut.source_side, BTreeSet::from([s]));
        assert_eq!(cut.value, 1.0);
    }

    #[test]
    fn cut_value_overflow_is_an_error() {
        let mut g = DiGraph::<(), u32>::new();
        let s = g.add_node(());
        let a = g.add_node(());
        let b = g.add_node(());
        let t = g.add_node(());
        g.extend_with_edges([(s, a, u32::MAX), (s, b, u32::MAX), (a, t, 1), (b, t, 1)]);

        // saturate both source edges so their capacities are summed into the cut
        let mut network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let saturated: Vec<_> = network
            .outgoing(s)
            .filter(|(_, _, residual)| *residual > 0)
            .map(|(arc, _, _)| arc)
            .collect();
        assert_eq!(saturated.len(), 2);
        for arc in saturated {
            network.push(arc, u32::MAX).unwrap();
        }

        assert!(matches!(
            extract_min_cut(&network),
            Err(Error::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn same_source_and_sink_keeps_everything_on_the_source_side() {
        let mut g = DiGraph::<(), f64>::new();
        let s = g.add_node(());
        let other = g.add_node(());
        g.add_edge(s, other, 1.0);

        let network = build_residual(&g, s, s, |e| Some(*e.weight())).unwrap();
        let cut = extract_min_cut(&network).unwrap();
        assert_eq!(cut.source_side, BTreeSet::from([s, other]));
        assert!(cut.sink_side.is_empty());
        assert_eq!(cut.value, 0.0);
    }
}
