//! Fair assignment of participants to scarce, day-partitioned time slots,
//! solved as a minimum-cost maximum-flow problem.
//!
//! Each participant submits a preference list over slots; every slot belongs
//! to one day of a seven-day week and admits a single grantee. A participant
//! receives at most three grants overall and at most one per day, and the
//! three grants are priced at increasing tiers (20, 50, 100) so that the
//! cheapest-path solver hands out everyone's first grant before anyone's
//! second. The flow engine itself is generic: it supports edges with
//! mandatory lower bounds, resolved by a feasibility pass before the usual
//! cost optimization.
//!
//! # Example
//! ```rust
//! use slot_assign::{assign, Participant, Slot};
//! let participants = vec![
//!     Participant { id: 10, preferences: vec![0, 1] },
//!     Participant { id: 11, preferences: vec![1] },
//! ];
//! let slots = vec![Slot { stamp: 0, day: 0 }, Slot { stamp: 0, day: 1 }];
//! let granted = assign(&participants, &slots).unwrap();
//! // Participant 11 only wants slot 1, so participant 10 yields it.
//! assert_eq!(granted[0].slots, vec![0]);
//! assert_eq!(granted[1].slots, vec![1]);
//! ```

pub mod assign;
pub mod mocks;
pub mod network;
pub mod solver;

pub use crate::assign::{assign, AssignError, Assignment, Instance, Participant, Slot, DAYS};
pub use crate::network::FlowNetwork;
pub use crate::solver::{solve, FlowSummary, Infeasible};

/// Amount of flow carried by an edge.
pub type FlowRate = i64;

/// Cost per unit of flow on an edge.
pub type Cost = i64;
