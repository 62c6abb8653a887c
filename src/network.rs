//! Residual flow network storage.
//!
//! Arcs live in an append-only arena as forward/backward pairs; adjacency is
//! a per-node chain of arena indices, so traversal allocates nothing.

use crate::{Cost, FlowRate};

/// Slack node indices reserved past the caller-visible range, used as the
/// virtual super source/sink of the feasibility phase.
const VIRTUAL_NODES: usize = 2;

/// Capacity stand-in for "unbounded". Kept well below `FlowRate::MAX` so
/// bottleneck arithmetic cannot overflow.
pub const UNBOUNDED: FlowRate = FlowRate::MAX / 4;

/// One directed arc of the residual graph.
///
/// Arcs are stored pairwise: the partner of the arc at position `i` is at
/// `i ^ 1`, with the backward arc holding capacity 0 and negated cost.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Arc {
    pub from: usize,
    pub to: usize,
    /// Next arc index in `from`'s adjacency chain; 0 terminates.
    pub next: usize,
    /// Remaining capacity. Never negative.
    pub residual: FlowRate,
    pub cost: Cost,
}

impl Arc {
    fn dummy() -> Self {
        Arc {
            from: 0,
            to: 0,
            next: 0,
            residual: 0,
            cost: 0,
        }
    }
}

/// A forward (caller-inserted) edge, as seen from outside the arena.
#[derive(Debug, Clone, Copy)]
pub struct ForwardEdge {
    pub from: usize,
    pub to: usize,
    /// Capacity left after solving; 0 means the edge is fully used.
    pub residual: FlowRate,
    pub cost: Cost,
}

/// Flow network over nodes `0..node_count()`, plus two hidden virtual nodes
/// for the feasibility phase.
///
/// An instance is exclusively owned by one solve invocation. Reuse requires
/// [`reset`](FlowNetwork::reset) (or a fresh allocation), which clears the
/// arena and reseeds the two dummy arcs so real pairs start at position 2
/// and position 0 can double as the adjacency terminator.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    nodes: usize,
    arcs: Vec<Arc>,
    /// Adjacency heads, one per node (virtual nodes included).
    head: Vec<usize>,
    /// Forced net supply (+) or demand (-) per node, introduced by
    /// lower-bound edges. Consumed by the feasibility phase.
    imbalance: Vec<FlowRate>,
    /// Cost pre-credited by pre-saturated negative-cost edges.
    cost_offset: Cost,
}

impl FlowNetwork {
    pub fn with_nodes(nodes: usize) -> Self {
        let mut net = FlowNetwork {
            nodes: 0,
            arcs: Vec::new(),
            head: Vec::new(),
            imbalance: Vec::new(),
            cost_offset: 0,
        };
        net.reset(nodes);
        net
    }

    /// Clear all storage and re-size for `nodes` nodes.
    pub fn reset(&mut self, nodes: usize) {
        self.nodes = nodes;
        self.arcs.clear();
        self.arcs.push(Arc::dummy());
        self.arcs.push(Arc::dummy());
        let limit = nodes + VIRTUAL_NODES;
        self.head.clear();
        self.head.resize(limit, 0);
        self.imbalance.clear();
        self.imbalance.resize(limit, 0);
        self.cost_offset = 0;
    }

    /// Number of caller-visible nodes.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Upper bound on node indices, virtual nodes included.
    pub(crate) fn node_limit(&self) -> usize {
        self.nodes + VIRTUAL_NODES
    }

    pub(crate) fn super_source(&self) -> usize {
        self.nodes
    }

    pub(crate) fn super_sink(&self) -> usize {
        self.nodes + 1
    }

    pub(crate) fn arc(&self, at: usize) -> &Arc {
        &self.arcs[at]
    }

    pub(crate) fn arc_mut(&mut self, at: usize) -> &mut Arc {
        &mut self.arcs[at]
    }

    pub(crate) fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub(crate) fn adjacency_head(&self, node: usize) -> usize {
        self.head[node]
    }

    pub(crate) fn imbalance(&self, node: usize) -> FlowRate {
        self.imbalance[node]
    }

    pub(crate) fn cost_offset(&self) -> Cost {
        self.cost_offset
    }

    fn push_arc(&mut self, from: usize, to: usize, residual: FlowRate, cost: Cost) {
        let at = self.arcs.len();
        self.arcs.push(Arc {
            from,
            to,
            next: self.head[from],
            residual,
            cost,
        });
        self.head[from] = at;
    }

    /// Insert an edge `u -> v` with the given capacity and per-unit cost.
    /// Returns the forward arc's arena position; the backward arc is at
    /// the position with the low bit toggled.
    pub fn add_edge(&mut self, u: usize, v: usize, capacity: FlowRate, cost: Cost) -> usize {
        debug_assert!(u < self.node_limit() && v < self.node_limit());
        debug_assert!(capacity >= 0);
        let at = self.arcs.len();
        debug_assert!(at % 2 == 0, "arc pairs must start at even positions");
        self.push_arc(u, v, capacity, cost);
        self.push_arc(v, u, 0, -cost);
        at
    }

    /// Insert an edge whose flow must lie within `[lower, upper]`.
    ///
    /// Standard lower-bound reduction: the forced `lower` units become node
    /// supply/demand (`+lower` at `v`, `-lower` at `u`) and the edge itself
    /// keeps only the free `upper - lower` capacity. The solver's
    /// feasibility phase routes the forced units.
    pub fn add_bounded_edge(
        &mut self,
        u: usize,
        v: usize,
        lower: FlowRate,
        upper: FlowRate,
        cost: Cost,
    ) -> usize {
        debug_assert!(0 <= lower && lower <= upper);
        self.imbalance[v] += lower;
        self.imbalance[u] -= lower;
        self.add_edge(u, v, upper - lower, cost)
    }

    /// Insert an edge whose cost may be negative.
    ///
    /// A negative-cost edge is profitable, so it is pre-saturated: the
    /// reversed edge is inserted at `[0, capacity]` with the cost negated
    /// (undoing a unit costs the forgone profit), `cost * capacity` is
    /// credited to the network's cost offset, and the full capacity is
    /// recorded as forced imbalance. Unused by the assignment application,
    /// which only supplies non-negative costs.
    pub fn add_signed_edge(&mut self, u: usize, v: usize, capacity: FlowRate, cost: Cost) {
        if cost >= 0 {
            self.add_bounded_edge(u, v, 0, capacity, cost);
        } else {
            self.imbalance[v] += capacity;
            self.imbalance[u] -= capacity;
            self.add_bounded_edge(v, u, 0, capacity, -cost);
            self.cost_offset += cost * capacity;
        }
    }

    /// Zero out both directions of the pair at `at`. The solver uses this to
    /// retire feasibility plumbing before the optimization phase.
    pub(crate) fn close_pair(&mut self, at: usize) {
        self.arcs[at].residual = 0;
        self.arcs[at ^ 1].residual = 0;
    }

    /// Iterate over the forward arcs in insertion order, skipping the seeded
    /// dummies and every backward partner.
    pub fn forward_edges(&self) -> impl Iterator<Item = ForwardEdge> + '_ {
        self.arcs.iter().skip(2).step_by(2).map(|arc| ForwardEdge {
            from: arc.from,
            to: arc.to,
            residual: arc.residual,
            cost: arc.cost,
        })
    }

    /// Arena sanity checks, meant for `debug_assert!` call sites in tests
    /// and the solver.
    pub(crate) fn is_consistent(&self) -> bool {
        self.arcs.len() % 2 == 0
            && self.arcs.iter().all(|arc| arc.residual >= 0)
            && self
                .arcs
                .iter()
                .skip(2)
                .step_by(2)
                .enumerate()
                .all(|(pair, arc)| {
                    let partner = &self.arcs[2 + 2 * pair + 1];
                    partner.from == arc.to && partner.to == arc.from && partner.cost == -arc.cost
                })
    }
}
