//! Canned flow networks with known optima, used by the solver tests.
//!
//! Each constructor returns `(network, source, sink)`.

use crate::network::FlowNetwork;

/// A single two-hop route: 0 -> 1 -> 2, capacity 2, per-unit path cost 3.
pub fn mock_single_path() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(3);
    net.add_edge(0, 1, 2, 1);
    net.add_edge(1, 2, 2, 2);
    (net, 0, 2)
}

/// Two disjoint routes from 0 to 3: a cheap one (per-unit cost 2,
/// capacity 2) and an expensive one (per-unit cost 8, capacity 3).
/// Optimum: flow 5, cost 28.
pub fn mock_parallel_routes() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(4);
    net.add_edge(0, 1, 2, 1);
    net.add_edge(1, 3, 2, 1);
    net.add_edge(0, 2, 3, 4);
    net.add_edge(2, 3, 3, 4);
    (net, 0, 3)
}

/// A diamond where the cheapest first path (0 -> 1 -> 2 -> 3, cost 3)
/// blocks the only outlet of node 2; the second augmentation must undo the
/// crossing edge through its backward arc. Optimum: flow 2, cost 11.
pub fn mock_crossing_diamond() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(4);
    net.add_edge(0, 1, 1, 1);
    net.add_edge(0, 2, 1, 4);
    net.add_edge(1, 2, 1, 1);
    net.add_edge(1, 3, 1, 5);
    net.add_edge(2, 3, 1, 1);
    (net, 0, 3)
}

/// One unit is forced through the costly edge 1 -> 2 by a [1, 1] bound;
/// the rest of the network is free. Feasible, with one extra unit of
/// optimizable flow on 0 -> 1 -> 3.
pub fn mock_forced_detour() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(4);
    net.add_edge(0, 1, 2, 0);
    net.add_edge(1, 3, 2, 0);
    net.add_bounded_edge(1, 2, 1, 1, 5);
    net.add_edge(2, 3, 1, 0);
    (net, 0, 3)
}

/// A [2, 2] bound on an edge whose tail has no inflow at all; the
/// feasibility phase cannot route the forced units.
pub fn mock_unroutable_demand() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(4);
    net.add_edge(0, 3, 1, 0);
    net.add_bounded_edge(1, 2, 2, 2, 0);
    (net, 0, 3)
}

/// A profitable (negative-cost) edge 0 -> 1 inserted through
/// `add_signed_edge`, draining into the sink. The edge is pre-saturated,
/// crediting its full profit of 6 to the cost offset.
pub fn mock_profitable_edge() -> (FlowNetwork, usize, usize) {
    let mut net = FlowNetwork::with_nodes(3);
    net.add_signed_edge(0, 1, 2, -3);
    net.add_edge(1, 2, 2, 0);
    (net, 0, 2)
}
