use crate::bqm::{Bqm, Vartype};
use crate::error::{Error, Result};
use crate::fault::EnergyTable;
use crate::gates::Gate;
use crate::VarLabel;
use std::collections::BTreeMap;
use tracing::debug;

/// Hard limit on the size search; beyond this the constraint is reported
/// unrealizable rather than letting the loop run away.
pub const DEFAULT_MAX_SIZE: usize = 8;

/// A variable of a realized model: either one of the constraint's own
/// (interface) variables, or an auxiliary introduced by the realization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Var<Tq>
where
	Tq: VarLabel,
{
	Wire(Tq),
	Aux(usize),
}

/// Bias assignment on the complete graph with `linear.len()` vertices,
/// as returned by a [`PenaltyOracle`]. Vertices below the constraint's arity
/// are its interface variables in order; the rest are auxiliaries.
#[derive(Clone, Debug)]
pub struct Realization {
	pub linear: Vec<f64>,
	pub quadratic: Vec<(usize, usize, f64)>,
	pub offset: f64,
}

/// The realization search itself: given an energy table and a candidate
/// graph size, either produce a gap-respecting bias assignment or report
/// that none exists at that size.
pub trait PenaltyOracle {
	fn realize(&self, table: &EnergyTable, size: usize, vartype: Vartype) -> Result<Realization>;
}

/// An energy table realized as linear biases and couplings, possibly over
/// auxiliary variables beyond the constraint's own. Immutable once built;
/// renamed copies are independent values.
#[derive(Clone, Debug)]
pub struct PenaltyModel<Tq>
where
	Tq: VarLabel,
{
	bqm: Bqm<Var<Tq>>,
	decision: Vec<Tq>,
	gap: f64,
}

impl<Tq> PenaltyModel<Tq>
where
	Tq: VarLabel,
{
	pub fn bqm(&self) -> &Bqm<Var<Tq>> {
		&self.bqm
	}

	pub fn decision(&self) -> &[Tq] {
		&self.decision
	}

	pub fn gap(&self) -> f64 {
		self.gap
	}

	pub fn size(&self) -> usize {
		self.bqm.num_variables()
	}

	pub fn num_aux(&self) -> usize {
		self.size() - self.decision.len()
	}

	/// Energy at an interface assignment, minimized over the auxiliaries.
	pub fn decision_energy(&self, values: &[bool]) -> f64 {
		assert_eq!(values.len(), self.decision.len());
		let mut sample: BTreeMap<Var<Tq>, bool> = self
			.decision
			.iter()
			.zip(values.iter())
			.map(|(q, v)| (Var::Wire(q.clone()), *v))
			.collect();
		let num_aux = self.num_aux();
		let mut best = f64::INFINITY;
		for aux in 0..1usize << num_aux {
			for i in 0..num_aux {
				sample.insert(Var::Aux(i), aux >> i & 1 == 1);
			}
			best = best.min(self.bqm.energy(&sample).unwrap());
		}
		best
	}
}

/// Find the smallest complete graph on which `table` can be realized,
/// starting with no auxiliary variables and adding one per failed size.
pub fn find_penalty_model<Tq, O>(
	decision: &[Tq],
	table: &EnergyTable,
	vartype: Vartype,
	oracle: &O,
	max_size: usize,
) -> Result<PenaltyModel<Tq>>
where
	Tq: VarLabel,
	O: PenaltyOracle + ?Sized,
{
	let n = table.arity();
	assert_eq!(decision.len(), n, "one name per interface variable");
	for size in n..=max_size {
		match oracle.realize(table, size, vartype) {
			Ok(realization) => {
				debug!(size, "penalty model fits on K{}", size);
				let var = |i: usize| {
					if i < n {
						Var::Wire(decision[i].clone())
					} else {
						Var::Aux(i - n)
					}
				};
				let mut bqm = Bqm::new(vartype);
				bqm.add_offset(realization.offset);
				for (i, h) in realization.linear.iter().enumerate() {
					bqm.add_linear(var(i), *h);
				}
				for (i, j, coupling) in realization.quadratic.iter() {
					bqm.add_quadratic(var(*i), var(*j), *coupling);
				}
				return Ok(PenaltyModel {
					bqm,
					decision: decision.to_vec(),
					gap: table.gap(),
				});
			}
			Err(Error::ImpossiblePenaltyModel { .. }) => {
				debug!(size, "penalty model does not fit on K{}", size);
			}
			Err(e) => return Err(e),
		}
	}
	Err(Error::UnrealizableConstraint { max_size })
}

/// Penalty model for a registered gate kind with the given fault gap.
pub fn gate_model<O>(
	gate: Gate,
	vartype: Vartype,
	gap: f64,
	oracle: &O,
	max_size: usize,
) -> Result<PenaltyModel<&'static str>>
where
	O: PenaltyOracle + ?Sized,
{
	let table = gate.table();
	let energies = EnergyTable::from_table(table, gap)?;
	find_penalty_model(table.variables(), &energies, vartype, oracle, max_size)
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NeverFits;

	impl PenaltyOracle for NeverFits {
		fn realize(&self, _: &EnergyTable, size: usize, _: Vartype) -> Result<Realization> {
			Err(Error::ImpossiblePenaltyModel { size })
		}
	}

	struct FitsAt {
		size: usize,
	}

	impl PenaltyOracle for FitsAt {
		fn realize(&self, _: &EnergyTable, size: usize, _: Vartype) -> Result<Realization> {
			if size < self.size {
				return Err(Error::ImpossiblePenaltyModel { size });
			}
			Ok(Realization {
				linear: vec![0.0; size],
				quadratic: Vec::new(),
				offset: 0.0,
			})
		}
	}

	#[test]
	fn search_gives_up_at_max_size() {
		let table = EnergyTable::from_table(Gate::And.table(), 0.5).unwrap();
		match find_penalty_model(&["in1", "in2", "out"], &table, Vartype::Spin, &NeverFits, 5) {
			Err(Error::UnrealizableConstraint { max_size }) => assert_eq!(max_size, 5),
			other => panic!("expected UnrealizableConstraint, got {:?}", other),
		}
	}

	#[test]
	fn search_takes_smallest_feasible_size() {
		let table = EnergyTable::from_table(Gate::And.table(), 0.5).unwrap();
		let oracle = FitsAt { size: 5 };
		let model =
			find_penalty_model(&["in1", "in2", "out"], &table, Vartype::Spin, &oracle, 8).unwrap();
		assert_eq!(model.size(), 5);
		assert_eq!(model.num_aux(), 2);
		assert_eq!(model.decision(), &["in1", "in2", "out"]);
	}
}
