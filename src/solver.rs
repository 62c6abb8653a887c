//! Two-phase minimum-cost maximum-flow solver.
//!
//! Phase 1 routes the forced units recorded by lower-bound edges through a
//! virtual super source/sink (and reports [`Infeasible`] when they cannot
//! all be routed). Phase 2 is plain successive shortest paths between the
//! true source and sink, layered on the feasible base flow.

use crate::network::{FlowNetwork, UNBOUNDED};
use crate::{Cost, FlowRate};
use log::{debug, trace};
use std::collections::VecDeque;
use thiserror::Error;

/// Distance label for nodes the current labeling pass cannot reach.
const FAR: Cost = Cost::MAX / 2;

/// The lower bounds admit no feasible flow: `unmet` forced units could not
/// be routed during the feasibility phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lower bounds admit no feasible flow ({unmet} forced units unroutable)")]
pub struct Infeasible {
    pub unmet: FlowRate,
}

/// Totals of one solve. `cost` folds in both phases and any offset credited
/// by pre-saturated negative-cost edges; `flow` counts the units pushed in
/// the optimization phase (forced base flow is not included, and is always
/// zero on networks without lower bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSummary {
    pub flow: FlowRate,
    pub cost: Cost,
}

/// Successive-shortest-path state: per-node labels plus running totals.
/// Sized once per solve; labeling itself allocates nothing.
struct Augmenter {
    dist: Vec<Cost>,
    bottleneck: Vec<FlowRate>,
    /// Arena index of the arc that labeled each node.
    pred: Vec<usize>,
    queued: Vec<bool>,
    queue: VecDeque<usize>,
    flow: FlowRate,
    cost: Cost,
}

impl Augmenter {
    fn new(limit: usize) -> Self {
        Augmenter {
            dist: vec![FAR; limit],
            bottleneck: vec![0; limit],
            pred: vec![0; limit],
            queued: vec![false; limit],
            queue: VecDeque::new(),
            flow: 0,
            cost: 0,
        }
    }

    /// Label every node reachable in the residual graph with its cheapest
    /// distance from `source`. Queue-based Bellman-Ford, not Dijkstra:
    /// backward residual arcs carry negative cost. Returns whether `sink`
    /// was reached.
    ///
    /// Relaxation is strict and adjacency order is fixed by insertion, so
    /// ties between equal-cost paths break the same way on every run.
    fn label(&mut self, net: &FlowNetwork, source: usize, sink: usize) -> bool {
        for d in self.dist.iter_mut() {
            *d = FAR;
        }
        for q in self.queued.iter_mut() {
            *q = false;
        }
        self.queue.clear();
        self.dist[source] = 0;
        self.bottleneck[source] = UNBOUNDED;
        self.queue.push_back(source);
        self.queued[source] = true;
        // A well-formed construction has no negative residual cycle; bound
        // the relaxation count anyway so a malformed one fails loudly.
        let bound = net.node_limit().saturating_mul(net.arc_count());
        let mut relaxed = 0usize;
        while let Some(u) = self.queue.pop_front() {
            self.queued[u] = false;
            let du = self.dist[u];
            let mut at = net.adjacency_head(u);
            while at != 0 {
                let arc = *net.arc(at);
                if arc.residual > 0 && du + arc.cost < self.dist[arc.to] {
                    let v = arc.to;
                    self.dist[v] = du + arc.cost;
                    self.pred[v] = at;
                    self.bottleneck[v] = self.bottleneck[u].min(arc.residual);
                    relaxed += 1;
                    assert!(relaxed <= bound, "negative cycle in residual graph");
                    if !self.queued[v] {
                        self.queue.push_back(v);
                        self.queued[v] = true;
                    }
                }
                at = arc.next;
            }
        }
        self.dist[sink] < FAR
    }

    /// Push the sink's bottleneck along the predecessor chain and update the
    /// running totals.
    fn push(&mut self, net: &mut FlowNetwork, source: usize, sink: usize) {
        let amount = self.bottleneck[sink];
        debug_assert!(amount > 0);
        let mut v = sink;
        while v != source {
            let at = self.pred[v];
            net.arc_mut(at).residual -= amount;
            net.arc_mut(at ^ 1).residual += amount;
            v = net.arc(at).from;
        }
        self.flow += amount;
        self.cost += self.dist[sink] * amount;
        trace!("augmented {} units at distance {}", amount, self.dist[sink]);
    }

    /// Augment until no path remains.
    fn run(&mut self, net: &mut FlowNetwork, source: usize, sink: usize) {
        while self.label(net, source, sink) {
            self.push(net, source, sink);
        }
    }
}

/// Solve minimum-cost maximum-flow from `source` to `sink` on `net`,
/// honoring any lower-bound edges inserted via
/// [`add_bounded_edge`](FlowNetwork::add_bounded_edge).
///
/// The network must be freshly built (or reset) for this call; the solve
/// consumes its residual capacities.
pub fn solve(
    net: &mut FlowNetwork,
    source: usize,
    sink: usize,
) -> Result<FlowSummary, Infeasible> {
    debug_assert!(net.is_consistent());
    let (super_source, super_sink) = (net.super_source(), net.super_sink());

    // Phase 1: turn node imbalances into super-source/super-sink edges and
    // route the forced units. The sink->source loopback keeps the idle true
    // endpoints from obstructing circulation.
    let mut required: FlowRate = 0;
    for v in 0..net.node_count() {
        let b = net.imbalance(v);
        if b > 0 {
            net.add_edge(super_source, v, b, 0);
            required += b;
        } else if b < 0 {
            net.add_edge(v, super_sink, -b, 0);
        }
    }
    let loopback = net.add_edge(sink, source, UNBOUNDED, 0);
    let mut aug = Augmenter::new(net.node_limit());
    aug.run(net, super_source, super_sink);
    if aug.flow < required {
        return Err(Infeasible {
            unmet: required - aug.flow,
        });
    }
    debug!(
        "feasibility: routed {}/{} forced units, cost {}",
        aug.flow, required, aug.cost
    );

    // Phase 2: retire the loopback and optimize between the true endpoints.
    // The super edges are saturated at this point, so they cannot re-enter
    // an augmenting path.
    let base_cost = net.cost_offset() + aug.cost;
    net.close_pair(loopback);
    aug.flow = 0;
    aug.cost = 0;
    aug.run(net, source, sink);
    debug!("optimization: flow {}, cost {}", aug.flow, base_cost + aug.cost);
    Ok(FlowSummary {
        flow: aug.flow,
        cost: base_cost + aug.cost,
    })
}
