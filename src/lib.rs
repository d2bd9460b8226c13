//! GateQUBO builds penalty models for logic gates and stitches them into
//! binary quadratic models whose ground states are the valid circuit
//! configurations, so that an annealing sampler can diagnose gate faults.
//!
//! # Examples
//!
//! ## Penalty model for a single gate
//! ```
//! # extern crate gatequbo;
//! # use gatequbo::{gate_model, Gate, ProjectionOracle, Vartype, DEFAULT_MAX_SIZE};
//! let oracle = ProjectionOracle::default();
//! let model = gate_model(Gate::And, Vartype::Spin, 0.5, &oracle, DEFAULT_MAX_SIZE).unwrap();
//! // valid inputs sit at the ground energy, invalid ones at least a gap above
//! let ground = model.decision_energy(&[false, false, false]);
//! let excited = model.decision_energy(&[false, false, true]);
//! assert!(excited >= ground + model.gap() - 1e-6);
//! ```
//!
//! ## Fault diagnosis on a multiplier
//! ```
//! # extern crate gatequbo;
//! # use gatequbo::{three_bit_multiplier, Circuit, ProjectionOracle, Vartype};
//! # use std::collections::BTreeMap;
//! let oracle = ProjectionOracle::default();
//! let circuit = Circuit::build(three_bit_multiplier(), Vartype::Spin, 0.5, &oracle).unwrap();
//! let mut fixed = circuit.fix(&BTreeMap::new()).unwrap();
//! fixed.fix_number(&["a2", "a1", "a0"], 3).unwrap();
//! fixed.fix_number(&["b2", "b1", "b0"], 5).unwrap();
//! assert!(fixed.bqm().num_variables() < circuit.bqm().num_variables());
//! ```
use std::cmp::Ord;
use std::fmt::Debug;
use std::hash::Hash;

extern crate rand;
extern crate rayon;

pub trait LabelType: PartialEq + Eq + Clone + std::fmt::Debug {}
/// Variable labels: anything orderable, hashable and cloneable.
pub trait VarLabel: LabelType + Hash + Ord {}
/// Gate-instance labels.
pub trait GateLabel: LabelType + Hash + Ord {}

impl<T> LabelType for T where T: PartialEq + Eq + Clone + Debug {}
impl<T> VarLabel for T where T: LabelType + Hash + Ord {}
impl<T> GateLabel for T where T: LabelType + Hash + Ord {}

mod anneal;
mod bqm;
mod circuit;
mod error;
mod fault;
mod gates;
mod oracle;
mod penalty;
pub mod solve;
mod stitch;

pub use bqm::{Bqm, Vartype};
pub use circuit::{number_to_bits, three_bit_multiplier, Circuit, FixedCircuit, GateInstance};
pub use error::{Error, Result};
pub use fault::{EnergyTable, DEFAULT_FAULT_GAP};
pub use gates::{ConstraintTable, Gate};
pub use oracle::ProjectionOracle;
pub use penalty::{find_penalty_model, gate_model, PenaltyModel, PenaltyOracle, Realization, Var, DEFAULT_MAX_SIZE};
pub use solve::{Retry, SampleRecord, SampleSet, Sampler, SimulatedAnnealer, Timing};
pub use stitch::stitch;
