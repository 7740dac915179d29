use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::vec::Vec;
use core::fmt::Debug;

use petgraph::graph::{EdgeIndex, EdgeReferences, NodeIndex};
use petgraph::visit::{EdgeRef, GraphProp, IntoEdgeReferences, IntoNodeIdentifiers};
use petgraph::Graph;

use crate::capacity::Capacity;
use crate::error::{Error, InvariantError, ValidationError};

pub type NodePair<NodeId> = (NodeId, NodeId);

pub(crate) type ArcGraph<N, C> = Graph<N, ResidualArc<C>>;

/// One direction of a residual pair.
///
/// Arcs are always inserted two at a time, so the partner of arc `e` is `e ^ 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResidualArc<C> {
    residual: C,
    // original capacity in this direction, zero for a pure reverse arc
    capacity: C,
    original: bool,
}

impl<C: Capacity> ResidualArc<C> {
    fn original(capacity: C) -> Self {
        Self {
            residual: capacity,
            capacity,
            original: true,
        }
    }

    fn reverse() -> Self {
        Self {
            residual: C::zero(),
            capacity: C::zero(),
            original: false,
        }
    }

    pub fn residual(&self) -> C {
        self.residual
    }

    pub fn capacity(&self) -> C {
        self.capacity
    }

    pub fn is_original(&self) -> bool {
        self.original
    }

    /// Flow carried by this arc as an edge of the input graph, clamped to `[0, capacity]`.
    ///
    /// Flow on an antiparallel pair is reported as net flow in the direction it travels.
    pub fn flow(&self) -> C {
        if self.residual >= self.capacity {
            C::zero()
        } else {
            self.capacity - self.residual
        }
    }
}

/// Residual network of a single solve.
///
/// Vertices of the input graph are enumerated into a petgraph arena, every original edge
/// `(u, v)` owns a residual pair `(u, v)`/`(v, u)`, and an original edge whose reverse is
/// also original shares that pair instead of creating a second one.
#[derive(Clone, Debug)]
pub struct ResidualNetwork<N, C> {
    graph: ArcGraph<N, C>,
    node_map: BTreeMap<N, NodeIndex>,
    arcs: BTreeMap<NodePair<NodeIndex>, EdgeIndex>,
    self_loops: Vec<(N, C)>,
    source: NodeIndex,
    sink: NodeIndex,
}

/// Builds the residual network of `g` for a solve between `source` and `sink`.
///
/// `capacity_of` returns the capacity of an edge; `None` falls back to a capacity of one.
/// Fails if the graph is undirected, a terminal is missing, a capacity is negative (or NaN)
/// or an ordered vertex pair carries more than one edge.
pub fn build_residual<G, C, F>(
    g: G,
    source: G::NodeId,
    sink: G::NodeId,
    mut capacity_of: F,
) -> Result<ResidualNetwork<G::NodeId, C>, Error>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + GraphProp,
    G::NodeId: Ord + Debug,
    C: Capacity,
    F: FnMut(G::EdgeRef) -> Option<C>,
{
    if !g.is_directed() {
        return Err(ValidationError::UndirectedGraph.into());
    }

    let mut graph = ArcGraph::new();
    let mut node_map = BTreeMap::new();
    for n in g.node_identifiers() {
        node_map.entry(n).or_insert_with(|| graph.add_node(n));
    }

    let source = *node_map.get(&source).ok_or(ValidationError::MissingSource)?;
    let sink = *node_map.get(&sink).ok_or(ValidationError::MissingSink)?;

    let mut arcs = BTreeMap::new();
    let mut originals = BTreeSet::new();
    let mut self_loops = Vec::new();

    for e in g.edge_references() {
        let (tail, head) = (e.source(), e.target());
        let capacity = capacity_of(e).unwrap_or_else(C::one);
        if !capacity.is_valid_capacity() {
            return Err(
                ValidationError::InvalidCapacity(format!("{tail:?} -> {head:?} ({capacity:?})"))
                    .into(),
            );
        }

        let (u, v) = (node_map[&tail], node_map[&head]);
        if !originals.insert((u, v)) {
            return Err(ValidationError::ParallelEdge(format!("{tail:?} -> {head:?}")).into());
        }

        if u == v {
            self_loops.push((tail, capacity));
            continue;
        }

        if let Some(&arc) = arcs.get(&(u, v)) {
            // the reverse arc of a genuine `(v, u)` edge
            graph[arc] = ResidualArc::original(capacity);
        } else {
            arcs.insert((u, v), graph.add_edge(u, v, ResidualArc::original(capacity)));
            arcs.insert((v, u), graph.add_edge(v, u, ResidualArc::reverse()));
        }
    }

    log::debug!(
        "residual network: {} vertices, {} arcs, {} self-loops",
        graph.node_count(),
        graph.edge_count(),
        self_loops.len()
    );

    Ok(ResidualNetwork {
        graph,
        node_map,
        arcs,
        self_loops,
        source,
        sink,
    })
}

impl<N: Copy + Ord + Debug, C: Capacity> ResidualNetwork<N, C> {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn sink(&self) -> NodeIndex {
        self.sink
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertex(&self, n: NodeIndex) -> N {
        self.graph[n]
    }

    pub fn vertices(&self) -> impl Iterator<Item = N> + '_ {
        self.graph.node_weights().copied()
    }

    pub fn index_of(&self, vertex: &N) -> Option<NodeIndex> {
        self.node_map.get(vertex).copied()
    }

    pub fn arc(&self, arc: EdgeIndex) -> &ResidualArc<C> {
        &self.graph[arc]
    }

    pub fn residual(&self, arc: EdgeIndex) -> C {
        self.graph[arc].residual
    }

    /// Residual capacity of the ordered pair `(u, v)`, `None` if no edge joins them.
    pub fn residual_between(&self, u: &N, v: &N) -> Option<C> {
        let key = (self.index_of(u)?, self.index_of(v)?);
        self.arcs.get(&key).map(|arc| self.residual(*arc))
    }

    /// Outgoing arcs of `u` as `(arc, head, residual)`, whether saturated or not.
    pub fn outgoing(&self, u: NodeIndex) -> impl Iterator<Item = (EdgeIndex, NodeIndex, C)> + '_ {
        self.graph
            .edges(u)
            .map(|e| (e.id(), e.target(), e.weight().residual))
    }

    pub(crate) fn graph(&self) -> &ArcGraph<N, C> {
        &self.graph
    }

    pub(crate) fn arc_references(&self) -> EdgeReferences<'_, ResidualArc<C>> {
        self.graph.edge_references()
    }

    /// Moves `amount` of residual capacity from `arc` to its partner.
    ///
    /// The two directions of a pair are only ever updated together, here.
    pub(crate) fn push(&mut self, arc: EdgeIndex, amount: C) -> Result<(), Error> {
        let pair = EdgeIndex::new(arc.index() ^ 1);

        // both directions are checked before either one changes
        if self.graph[arc].residual < amount {
            let (u, v) = self.endpoints(arc);
            return Err(InvariantError::NegativeResidual(format!("{u:?} -> {v:?}")).into());
        }
        let Some(reverse) = self.graph[pair].residual.checked_add(amount) else {
            let (v, u) = self.endpoints(pair);
            return Err(Error::ArithmeticOverflow(format!(
                "residual capacity of {v:?} -> {u:?}"
            )));
        };
        self.graph[arc].residual -= amount;
        self.graph[pair].residual = reverse;
        Ok(())
    }

    fn endpoints(&self, arc: EdgeIndex) -> (N, N) {
        let edge = &self.graph.raw_edges()[arc.index()];
        (self.graph[edge.source()], self.graph[edge.target()])
    }

    /// Per-edge flow over every edge of the input graph, self-loops included with zero.
    pub fn flows(&self) -> BTreeMap<NodePair<N>, C> {
        self.arc_references()
            .filter(|e| e.weight().original)
            .map(|e| {
                (
                    (self.graph[e.source()], self.graph[e.target()]),
                    e.weight().flow(),
                )
            })
            .chain(self.self_loops.iter().map(|(n, _)| ((*n, *n), C::zero())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::{DiGraph, UnGraph};

    fn scenario() -> (DiGraph<&'static str, f64>, [NodeIndex; 4]) {
        let mut g = DiGraph::new();
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
        (g, [s, a, b, t])
    }

    #[test]
    fn every_edge_gets_a_reverse_arc() {
        let (g, [s, a, b, t]) = scenario();
        let network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();

        assert_eq!(network.node_count(), 4);
        assert_eq!(network.arc_count(), 10);
        assert_eq!(network.residual_between(&s, &a), Some(3.0));
        assert_eq!(network.residual_between(&a, &s), Some(0.0));
        assert_eq!(network.residual_between(&b, &a), Some(0.0));
        assert_eq!(network.residual_between(&s, &t), None);
    }

    #[test]
    fn antiparallel_edges_share_one_pair() {
        let mut g = DiGraph::<(), f64>::new();
        let u = g.add_node(());
        let v = g.add_node(());
        g.add_edge(u, v, 4.0);
        g.add_edge(v, u, 1.5);

        let network = build_residual(&g, u, v, |e| Some(*e.weight())).unwrap();
        assert_eq!(network.arc_count(), 2);
        assert_eq!(network.residual_between(&u, &v), Some(4.0));
        assert_eq!(network.residual_between(&v, &u), Some(1.5));
        assert!(network.arcs.values().all(|arc| network.arc(*arc).is_original()));
    }

    #[test]
    fn push_moves_capacity_to_the_partner_arc() {
        let (g, [s, a, _, t]) = scenario();
        let mut network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        let arc = network.arcs[&(network.index_of(&s).unwrap(), network.index_of(&a).unwrap())];

        network.push(arc, 2.0).unwrap();
        assert_eq!(network.residual_between(&s, &a), Some(1.0));
        assert_eq!(network.residual_between(&a, &s), Some(2.0));
        assert_eq!(network.flows()[&(s, a)], 2.0);

        assert_eq!(
            network.push(arc, 5.0),
            Err(Error::from(InvariantError::NegativeResidual(format!(
                "{s:?} -> {a:?}"
            ))))
        );
        assert_eq!(network.residual_between(&s, &a), Some(1.0));
    }

    #[test]
    fn unsigned_flow_on_a_shared_pair() {
        let mut g = DiGraph::<(), u32>::new();
        let u = g.add_node(());
        let v = g.add_node(());
        g.extend_with_edges([(u, v, 2), (v, u, 3)]);

        let mut network = build_residual(&g, u, v, |e| Some(*e.weight())).unwrap();
        let back = network.arcs[&(v, u)];
        network.push(back, 3).unwrap();

        assert_eq!(network.residual_between(&u, &v), Some(5));
        assert_eq!(network.flows()[&(u, v)], 0);
        assert_eq!(network.flows()[&(v, u)], 3);
    }

    #[test]
    fn missing_capacity_defaults_to_one() {
        let (g, [s, _, _, t]) = scenario();
        let network = build_residual::<_, f64, _>(&g, s, t, |_| None).unwrap();
        assert!(network
            .arc_references()
            .filter(|e| e.weight().is_original())
            .all(|e| e.weight().capacity() == 1.0));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let (mut g, [s, a, _, t]) = scenario();
        g.add_edge(t, a, -1.0);
        let err = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn nan_capacity_is_rejected() {
        let (mut g, [s, a, _, t]) = scenario();
        g.add_edge(t, a, f64::NAN);
        assert!(build_residual(&g, s, t, |e| Some(*e.weight())).is_err());
    }

    #[test]
    fn infinite_capacity_is_rejected() {
        let (mut g, [s, a, _, t]) = scenario();
        g.add_edge(t, a, f64::INFINITY);
        assert!(matches!(
            build_residual(&g, s, t, |e| Some(*e.weight())),
            Err(Error::Validation(ValidationError::InvalidCapacity(_)))
        ));
    }

    #[test]
    fn overflowing_push_leaves_the_pair_untouched() {
        let mut g = DiGraph::<(), u32>::new();
        let u = g.add_node(());
        let v = g.add_node(());
        g.extend_with_edges([(u, v, u32::MAX), (v, u, 1)]);

        let mut network = build_residual(&g, u, v, |e| Some(*e.weight())).unwrap();
        let arc = network.arcs[&(u, v)];
        assert!(matches!(
            network.push(arc, u32::MAX),
            Err(Error::ArithmeticOverflow(_))
        ));
        assert_eq!(network.residual_between(&u, &v), Some(u32::MAX));
        assert_eq!(network.residual_between(&v, &u), Some(1));
    }

    #[test]
    fn terminals_must_exist() {
        let (g, [s, _, _, t]) = scenario();
        let ghost = NodeIndex::new(17);
        assert_eq!(
            build_residual(&g, ghost, t, |e| Some(*e.weight())).unwrap_err(),
            Error::from(ValidationError::MissingSource)
        );
        assert_eq!(
            build_residual(&g, s, ghost, |e| Some(*e.weight())).unwrap_err(),
            Error::from(ValidationError::MissingSink)
        );
    }

    #[test]
    fn undirected_graphs_are_rejected() {
        let mut g = UnGraph::<(), f64>::new_undirected();
        let u = g.add_node(());
        let v = g.add_node(());
        g.add_edge(u, v, 1.0);
        assert_eq!(
            build_residual(&g, u, v, |e| Some(*e.weight())).unwrap_err(),
            Error::from(ValidationError::UndirectedGraph)
        );
    }

    #[test]
    fn parallel_edges_are_rejected() {
        let (mut g, [s, a, _, t]) = scenario();
        g.add_edge(s, a, 1.0);
        assert!(matches!(
            build_residual(&g, s, t, |e| Some(*e.weight())),
            Err(Error::Validation(ValidationError::ParallelEdge(_)))
        ));
    }

    #[test]
    fn self_loops_carry_no_arcs() {
        let (mut g, [s, a, _, t]) = scenario();
        g.add_edge(a, a, 7.0);
        let network = build_residual(&g, s, t, |e| Some(*e.weight())).unwrap();
        assert_eq!(network.arc_count(), 10);
        assert_eq!(network.flows()[&(a, a)], 0.0);
        assert_eq!(network.flows().len(), 6);
        assert_eq!(network.vertices().count(), 4);
    }
}
