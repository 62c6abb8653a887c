//! Participant-to-slot assignment over one week of day-partitioned slots.
//!
//! The assignment rules are encoded purely as network topology and edge
//! costs: three increasingly priced source edges per participant (the
//! fairness tiers), a capacity-1 day layer per participant and day (the
//! one-slot-per-day cap), and a capacity-1 sink edge per slot (single
//! grantee). Solving minimum-cost maximum-flow on that network yields the
//! fair maximum assignment.

use crate::network::FlowNetwork;
use crate::solver::{solve, Infeasible};
use crate::Cost;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slots are partitioned into a fixed seven-day week.
pub const DAYS: usize = 7;

/// Per-participant grant prices, cheapest tier first. The convex schedule
/// makes the cheapest-path solver hand out every first grant before any
/// second, and every second before any third.
const TIER_COSTS: [Cost; 3] = [20, 50, 100];

/// A participant and their ordered preference list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: u64,
    /// Indices into the slot collection.
    pub preferences: Vec<usize>,
}

/// One grantable slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    /// Identifier local to the slot's day.
    pub stamp: u64,
    /// Day of the week, in `0..7`.
    pub day: u32,
}

/// Grants of one participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub id: u64,
    /// Granted slot indices, ascending.
    pub slots: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("slot collection declares {declared} entries but holds {actual}")]
    SlotCountMismatch { declared: usize, actual: usize },
    #[error("participant {participant}: preference {index} is out of range ({slot_count} slots)")]
    PreferenceOutOfRange {
        participant: u64,
        index: usize,
        slot_count: usize,
    },
    #[error("slot {slot}: day {day} is outside the week")]
    DayOutOfRange { slot: usize, day: u32 },
    #[error(transparent)]
    Infeasible(#[from] Infeasible),
}

/// Node roles of the assignment network. Converted to flat indices in
/// exactly one place ([`Layout::index`]) so the range invariants stay
/// auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeId {
    Source,
    /// Per-participant entry node, fed by the three tier edges.
    Base(usize),
    /// One node per participant and day; its capacity-1 inlet is the
    /// day cap.
    Day(usize, usize),
    Slot(usize),
    Sink,
}

/// Flat node numbering for P participants and S slots. The ranges are
/// contiguous and disjoint:
///
/// - source: `0`
/// - bases: `1 ..= P`
/// - day layers: `1 + P .. 1 + 8P` (day-major, participant-minor)
/// - slots: `1 + 8P .. 1 + 8P + S`
/// - sink: `1 + 8P + S`
#[derive(Debug, Clone, Copy)]
struct Layout {
    participants: usize,
    slots: usize,
}

impl Layout {
    fn node_count(&self) -> usize {
        8 * self.participants + self.slots + 2
    }

    fn index(&self, id: NodeId) -> usize {
        match id {
            NodeId::Source => 0,
            NodeId::Base(p) => {
                debug_assert!(p < self.participants);
                1 + p
            }
            NodeId::Day(p, d) => {
                debug_assert!(p < self.participants && d < DAYS);
                1 + self.participants + d * self.participants + p
            }
            NodeId::Slot(s) => {
                debug_assert!(s < self.slots);
                1 + 8 * self.participants + s
            }
            NodeId::Sink => 1 + 8 * self.participants + self.slots,
        }
    }

    /// Participant owning a day-layer index, or None if the index lies
    /// outside the day-layer range.
    fn day_layer(&self, index: usize) -> Option<usize> {
        let start = 1 + self.participants;
        let end = 1 + 8 * self.participants;
        if (start..end).contains(&index) {
            Some((index - start) % self.participants)
        } else {
            None
        }
    }

    /// Slot at a flat index, or None if the index is no slot node.
    fn slot_at(&self, index: usize) -> Option<usize> {
        let start = 1 + 8 * self.participants;
        if (start..start + self.slots).contains(&index) {
            Some(index - start)
        } else {
            None
        }
    }
}

/// A validated assignment problem.
#[derive(Debug, Clone)]
pub struct Instance {
    participants: Vec<Participant>,
    slots: Vec<Slot>,
}

impl Instance {
    /// Validate the inputs. `slot_count` is the size the slot collection
    /// claims to have; a mismatch with `slots.len()` is rejected, as is any
    /// preference index outside the slot range or any day outside the week.
    pub fn new(
        participants: Vec<Participant>,
        slots: Vec<Slot>,
        slot_count: usize,
    ) -> Result<Self, AssignError> {
        if slot_count != slots.len() {
            return Err(AssignError::SlotCountMismatch {
                declared: slot_count,
                actual: slots.len(),
            });
        }
        for (s, slot) in slots.iter().enumerate() {
            if slot.day as usize >= DAYS {
                return Err(AssignError::DayOutOfRange {
                    slot: s,
                    day: slot.day,
                });
            }
        }
        for participant in participants.iter() {
            for &index in participant.preferences.iter() {
                if index >= slots.len() {
                    return Err(AssignError::PreferenceOutOfRange {
                        participant: participant.id,
                        index,
                        slot_count: slots.len(),
                    });
                }
            }
        }
        Ok(Instance {
            participants,
            slots,
        })
    }

    /// Build the network, solve it, and read the grants back. Results
    /// follow participant input order; each grant list is ascending.
    pub fn solve(&self) -> Result<Vec<Assignment>, AssignError> {
        let layout = Layout {
            participants: self.participants.len(),
            slots: self.slots.len(),
        };
        let mut net = FlowNetwork::with_nodes(layout.node_count());
        self.build(&mut net, &layout);
        let summary = solve(
            &mut net,
            layout.index(NodeId::Source),
            layout.index(NodeId::Sink),
        )?;
        debug!(
            "granted {} of {} slots to {} participants (tier cost {})",
            summary.flow,
            self.slots.len(),
            self.participants.len(),
            summary.cost
        );
        Ok(self.extract(&net, &layout))
    }

    fn build(&self, net: &mut FlowNetwork, layout: &Layout) {
        let source = layout.index(NodeId::Source);
        let sink = layout.index(NodeId::Sink);
        for p in 0..self.participants.len() {
            let base = layout.index(NodeId::Base(p));
            for &cost in TIER_COSTS.iter() {
                net.add_bounded_edge(source, base, 0, 1, cost);
            }
        }
        for d in 0..DAYS {
            for p in 0..self.participants.len() {
                let base = layout.index(NodeId::Base(p));
                let day = layout.index(NodeId::Day(p, d));
                net.add_bounded_edge(base, day, 0, 1, 0);
            }
        }
        for (p, participant) in self.participants.iter().enumerate() {
            for &s in participant.preferences.iter() {
                // The day layer is the slot's own day, not the preference
                // position.
                let day = self.slots[s].day as usize;
                let from = layout.index(NodeId::Day(p, day));
                let to = layout.index(NodeId::Slot(s));
                net.add_bounded_edge(from, to, 0, 1, 0);
            }
        }
        for s in 0..self.slots.len() {
            net.add_bounded_edge(layout.index(NodeId::Slot(s)), sink, 0, 1, 0);
        }
    }

    fn extract(&self, net: &FlowNetwork, layout: &Layout) -> Vec<Assignment> {
        let mut granted: Vec<Assignment> = self
            .participants
            .iter()
            .map(|participant| Assignment {
                id: participant.id,
                slots: Vec::new(),
            })
            .collect();
        for edge in net.forward_edges() {
            if edge.residual != 0 {
                continue;
            }
            // Saturated day-layer -> slot edges are exactly the grants.
            if let (Some(p), Some(s)) = (layout.day_layer(edge.from), layout.slot_at(edge.to)) {
                granted[p].slots.push(s);
            }
        }
        for assignment in granted.iter_mut() {
            assignment.slots.sort_unstable();
        }
        granted
    }
}

/// Assign `slots` to `participants`; convenience wrapper around
/// [`Instance`].
pub fn assign(participants: &[Participant], slots: &[Slot]) -> Result<Vec<Assignment>, AssignError> {
    Instance::new(participants.to_vec(), slots.to_vec(), slots.len())?.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    fn participant(id: u64, preferences: Vec<usize>) -> Participant {
        Participant { id, preferences }
    }

    fn slot(stamp: u64, day: u32) -> Slot {
        Slot { stamp, day }
    }

    /// Total price of `grants` consumed tiers.
    fn cumulative_tier_cost(grants: usize) -> Cost {
        [0, 20, 70, 170][grants]
    }

    /// Exhaustively choose a grantee (or nobody) per slot, honoring the
    /// quota and day caps; returns the maximum grant count and, among
    /// maxima, the minimum tier cost.
    fn brute_force(participants: &[Participant], slots: &[Slot]) -> (usize, Cost) {
        let mut wanters: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
        for (p, participant) in participants.iter().enumerate() {
            for &s in participant.preferences.iter() {
                if !wanters[s].contains(&p) {
                    wanters[s].push(p);
                }
            }
        }
        fn go(
            s: usize,
            wanters: &[Vec<usize>],
            slots: &[Slot],
            counts: &mut [usize],
            day_used: &mut [[bool; DAYS]],
            granted: usize,
            best: &mut (usize, Cost),
        ) {
            if s == slots.len() {
                let cost = counts.iter().map(|&k| cumulative_tier_cost(k)).sum();
                if granted > best.0 || (granted == best.0 && cost < best.1) {
                    *best = (granted, cost);
                }
                return;
            }
            go(s + 1, wanters, slots, counts, day_used, granted, best);
            for &p in wanters[s].iter() {
                let day = slots[s].day as usize;
                if counts[p] < 3 && !day_used[p][day] {
                    counts[p] += 1;
                    day_used[p][day] = true;
                    go(s + 1, wanters, slots, counts, day_used, granted + 1, best);
                    counts[p] -= 1;
                    day_used[p][day] = false;
                }
            }
        }
        let mut counts = vec![0; participants.len()];
        let mut day_used = vec![[false; DAYS]; participants.len()];
        let mut best = (0, Cost::MAX);
        go(
            0,
            &wanters,
            slots,
            &mut counts,
            &mut day_used,
            0,
            &mut best,
        );
        best
    }

    fn check_caps(granted: &[Assignment], slots: &[Slot]) {
        let mut taken = vec![false; slots.len()];
        for assignment in granted.iter() {
            assert!(assignment.slots.len() <= 3);
            assert!(assignment.slots.windows(2).all(|w| w[0] < w[1]));
            let mut days = [false; DAYS];
            for &s in assignment.slots.iter() {
                assert!(!taken[s], "slot {} granted twice", s);
                taken[s] = true;
                let day = slots[s].day as usize;
                assert!(!days[day], "two grants on day {}", day);
                days[day] = true;
            }
        }
    }

    #[test]
    fn two_participants_two_distinct_days() {
        let participants = vec![participant(7, vec![0]), participant(8, vec![1])];
        let slots = vec![slot(0, 1), slot(0, 4)];
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots, vec![0]);
        assert_eq!(granted[1].slots, vec![1]);
        assert_eq!(granted[0].id, 7);
        assert_eq!(granted[1].id, 8);
    }

    #[test]
    fn day_cap_allows_one_of_four_same_day_slots() {
        let participants = vec![participant(1, vec![0, 1, 2, 3])];
        let slots = vec![slot(0, 2), slot(1, 2), slot(2, 2), slot(3, 2)];
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots.len(), 1);
    }

    #[test]
    fn contended_slot_goes_to_exactly_one() {
        let participants = vec![
            participant(1, vec![0]),
            participant(2, vec![0]),
            participant(3, vec![0]),
        ];
        let slots = vec![slot(0, 0)];
        let granted = assign(&participants, &slots).unwrap();
        let total: usize = granted.iter().map(|a| a.slots.len()).sum();
        assert_eq!(total, 1);
        check_caps(&granted, &slots);
    }

    #[test]
    fn quota_caps_at_three_grants() {
        let participants = vec![participant(1, vec![0, 1, 2, 3, 4])];
        let slots = (0..5).map(|d| slot(0, d)).collect::<Vec<_>>();
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots.len(), 3);
        check_caps(&granted, &slots);
    }

    #[test]
    fn first_grants_come_before_seconds() {
        // Participant 0 wants everything; participant 1 only slot 0. A
        // greedy hand-out to participant 0 would cost them their only
        // option, and a grant to 1 is cheaper than a third to 0 anyway.
        let participants = vec![participant(0, vec![0, 1, 2, 3]), participant(1, vec![0])];
        let slots = vec![slot(0, 0), slot(0, 1), slot(0, 2), slot(0, 3)];
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots, vec![1, 2, 3]);
        assert_eq!(granted[1].slots, vec![0]);
    }

    #[test]
    fn grants_are_sorted_even_when_preferred_backwards() {
        let participants = vec![participant(1, vec![2, 0])];
        let slots = vec![slot(0, 0), slot(0, 1), slot(0, 2)];
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots, vec![0, 2]);
    }

    #[test]
    fn duplicate_preferences_grant_once() {
        let participants = vec![participant(1, vec![0, 0, 0])];
        let slots = vec![slot(0, 0)];
        let granted = assign(&participants, &slots).unwrap();
        assert_eq!(granted[0].slots, vec![0]);
    }

    #[test]
    fn empty_inputs() {
        assert!(assign(&[], &[]).unwrap().is_empty());
        let granted = assign(&[participant(1, vec![])], &[slot(0, 0)]).unwrap();
        assert!(granted[0].slots.is_empty());
        let granted = assign(&[], &[slot(0, 0), slot(1, 3)]).unwrap();
        assert!(granted.is_empty());
    }

    #[test]
    fn declared_slot_count_must_match() {
        let err = Instance::new(vec![], vec![slot(0, 0)], 2).unwrap_err();
        assert_eq!(
            err,
            AssignError::SlotCountMismatch {
                declared: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn preference_out_of_range_is_rejected() {
        let err = assign(&[participant(9, vec![1])], &[slot(0, 0)]).unwrap_err();
        assert_eq!(
            err,
            AssignError::PreferenceOutOfRange {
                participant: 9,
                index: 1,
                slot_count: 1
            }
        );
    }

    #[test]
    fn day_out_of_range_is_rejected() {
        let err = assign(&[], &[slot(0, 7)]).unwrap_err();
        assert_eq!(err, AssignError::DayOutOfRange { slot: 0, day: 7 });
    }

    #[test]
    fn resolving_is_deterministic() {
        let participants = vec![
            participant(0, vec![0, 1, 2]),
            participant(1, vec![0, 1, 2]),
            participant(2, vec![0, 1, 2]),
        ];
        let slots = vec![slot(0, 0), slot(1, 0), slot(2, 0)];
        let first = assign(&participants, &slots).unwrap();
        let second = assign(&participants, &slots).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn matches_brute_force_on_random_instances() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(842);
        for round in 0..40 {
            let participant_count: usize = rng.gen_range(1..=4);
            let slot_count: usize = rng.gen_range(1..=6);
            let slots: Vec<Slot> = (0..slot_count)
                .map(|s| slot(s as u64, rng.gen_range(0..DAYS as u32)))
                .collect();
            let participants: Vec<Participant> = (0..participant_count)
                .map(|p| {
                    let preferences = (0..slot_count).filter(|_| rng.gen_bool(0.6)).collect();
                    participant(p as u64, preferences)
                })
                .collect();
            let granted = assign(&participants, &slots).unwrap();
            check_caps(&granted, &slots);
            let total: usize = granted.iter().map(|a| a.slots.len()).sum();
            let cost: Cost = granted
                .iter()
                .map(|a| cumulative_tier_cost(a.slots.len()))
                .sum();
            let (best_total, best_cost) = brute_force(&participants, &slots);
            assert_eq!(total, best_total, "round {}: grant count not maximal", round);
            assert_eq!(cost, best_cost, "round {}: tier cost not minimal", round);
        }
    }
}
