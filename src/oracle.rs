use crate::bqm::Vartype;
use crate::error::{Error, Result};
use crate::fault::EnergyTable;
use crate::penalty::{PenaltyOracle, Realization};
use itertools::Itertools;
use tracing::trace;

/// Default realization search.
///
/// Finding biases whose ground states match an energy table is a linear
/// feasibility problem once we decide, for each accepting configuration,
/// which auxiliary setting attains the minimum. The oracle enumerates those
/// attainer choices and solves each candidate system by cyclic projection
/// (each violated constraint in turn projects the current point onto its
/// hyperplane or half-space). Projection converges on feasible systems;
/// hitting the sweep cap on every choice is the infeasibility signal that
/// drives the size search to the next graph.
///
/// Biases are bounded like annealing hardware: `|h| <= 2`, `|J| <= 1`.
/// Deterministic: fixed enumeration order, zero starting point, no
/// randomness.
#[derive(Clone, Debug)]
pub struct ProjectionOracle {
	pub linear_bound: f64,
	pub quadratic_bound: f64,
	pub tolerance: f64,
	/// Cheap pass first: feasible systems usually converge quickly, so a
	/// short cap finds them without paying the long cap on every
	/// infeasible attainer choice.
	pub sweep_caps: [usize; 2],
	/// Upper bound on attainer choices per size before declaring the size
	/// impossible outright.
	pub max_choices: usize,
}

impl Default for ProjectionOracle {
	fn default() -> Self {
		Self {
			linear_bound: 2.0,
			quadratic_bound: 1.0,
			tolerance: 1e-8,
			sweep_caps: [300, 3000],
			max_choices: 4096,
		}
	}
}

#[derive(Clone)]
struct Constraint {
	row: usize,
	rhs: f64,
	eq: bool,
}

impl PenaltyOracle for ProjectionOracle {
	fn realize(&self, table: &EnergyTable, size: usize, vartype: Vartype) -> Result<Realization> {
		let n = table.arity();
		debug_assert!(size >= n);
		let num_aux = size - n;
		let aux_configs = 1usize << num_aux;
		let decision_mask = (1usize << n) - 1;

		let accepting: Vec<usize> = (0..table.len()).filter(|&d| table.is_accepting(d)).collect();
		let mut choices: u128 = 1;
		for _ in accepting.iter() {
			choices = choices.saturating_mul(aux_configs as u128);
			if choices > self.max_choices as u128 {
				trace!(size, "attainer choice space too large");
				return Err(Error::ImpossiblePenaltyModel { size });
			}
		}
		let choices = choices as usize;

		let pairs: Vec<(usize, usize)> = (0..size).tuple_combinations().collect();
		let dim = size + pairs.len() + 1;

		// one row per configuration of the K_size variables, then one row
		// per bias bound
		let mut rows: Vec<Vec<f64>> = Vec::new();
		let mut base: Vec<Constraint> = Vec::new();
		for config in 0..1usize << size {
			let mut row = vec![0.0; dim];
			for i in 0..size {
				row[i] = vartype.value(config >> i & 1 == 1);
			}
			for (p, (i, j)) in pairs.iter().enumerate() {
				row[size + p] = row[*i] * row[*j];
			}
			row[dim - 1] = 1.0;
			rows.push(row);
			let decision = config & decision_mask;
			base.push(Constraint {
				row: config,
				rhs: if table.is_accepting(decision) {
					0.0
				} else {
					table.energy(decision)
				},
				eq: false,
			});
		}
		for k in 0..size + pairs.len() {
			let bound = if k < size {
				self.linear_bound
			} else {
				self.quadratic_bound
			};
			let mut upper = vec![0.0; dim];
			upper[k] = -1.0; // -p_k >= -bound
			rows.push(upper);
			base.push(Constraint {
				row: rows.len() - 1,
				rhs: -bound,
				eq: false,
			});
			let mut lower = vec![0.0; dim];
			lower[k] = 1.0;
			rows.push(lower);
			base.push(Constraint {
				row: rows.len() - 1,
				rhs: -bound,
				eq: false,
			});
		}
		let norms: Vec<f64> = rows
			.iter()
			.map(|row| row.iter().map(|a| a * a).sum())
			.collect();

		for &cap in self.sweep_caps.iter() {
			for choice in 0..choices {
				let mut constraints = base.clone();
				let mut rest = choice;
				for &d in accepting.iter() {
					let attain = rest % aux_configs;
					rest /= aux_configs;
					constraints[d | attain << n].eq = true;
				}
				if let Some(p) = project(&rows, &norms, &constraints, dim, cap, self.tolerance) {
					trace!(size, choice, "feasible bias assignment");
					let quadratic = pairs
						.iter()
						.enumerate()
						.map(|(k, (i, j))| (*i, *j, p[size + k]))
						.filter(|(_, _, c)| c.abs() > 1e-9)
						.collect();
					return Ok(Realization {
						linear: p[..size].to_vec(),
						quadratic,
						offset: p[dim - 1],
					});
				}
			}
		}
		Err(Error::ImpossiblePenaltyModel { size })
	}
}

/// Cyclic projection onto the half-spaces `row . p >= rhs` (hyperplanes for
/// equalities). Returns a point satisfying everything within `tolerance`,
/// or `None` when the sweep cap runs out.
fn project(
	rows: &[Vec<f64>],
	norms: &[f64],
	constraints: &[Constraint],
	dim: usize,
	cap: usize,
	tolerance: f64,
) -> Option<Vec<f64>> {
	let mut p = vec![0.0; dim];
	for _ in 0..cap {
		let mut worst = 0.0f64;
		for c in constraints.iter() {
			let row = &rows[c.row];
			let r = row.iter().zip(p.iter()).map(|(a, b)| a * b).sum::<f64>() - c.rhs;
			let violation = if c.eq { r.abs() } else { -r };
			if violation > tolerance {
				let scale = -r / norms[c.row];
				for (pk, a) in p.iter_mut().zip(row.iter()) {
					*pk += scale * a;
				}
			}
			worst = worst.max(violation);
		}
		if worst <= tolerance {
			return Some(p);
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fault::{decode, EnergyTable, DEFAULT_FAULT_GAP};
	use crate::gates::Gate;
	use crate::penalty::{gate_model, DEFAULT_MAX_SIZE};

	fn assert_ground_states(gate: Gate, vartype: Vartype) {
		let oracle = ProjectionOracle::default();
		let model = gate_model(gate, vartype, DEFAULT_FAULT_GAP, &oracle, DEFAULT_MAX_SIZE)
			.unwrap_or_else(|e| panic!("{:?} {:?}: {}", gate, vartype, e));
		let n = gate.arity();
		let energies: Vec<f64> = (0..1usize << n)
			.map(|i| model.decision_energy(&decode(i, n)))
			.collect();
		let emin = energies.iter().cloned().fold(f64::INFINITY, f64::min);
		for (i, energy) in energies.iter().enumerate() {
			let tuple = decode(i, n);
			if gate.accepts(&tuple) {
				assert!(
					energy - emin < 1e-6,
					"{:?}: accepting {:?} not a ground state ({} vs {})",
					gate,
					tuple,
					energy,
					emin
				);
			} else {
				assert!(
					energy - emin >= DEFAULT_FAULT_GAP - 1e-6,
					"{:?}: rejecting {:?} within the gap ({} vs {})",
					gate,
					tuple,
					energy,
					emin
				);
			}
		}
	}

	#[test]
	fn spin_gates_are_faithful() {
		for gate in Gate::ALL.iter() {
			assert_ground_states(*gate, Vartype::Spin);
		}
	}

	#[test]
	fn binary_and_is_faithful() {
		assert_ground_states(Gate::And, Vartype::Binary);
	}

	#[test]
	fn and_ground_states_exactly() {
		let oracle = ProjectionOracle::default();
		let model =
			gate_model(Gate::And, Vartype::Spin, DEFAULT_FAULT_GAP, &oracle, DEFAULT_MAX_SIZE)
				.unwrap();
		let accepting = [
			[false, false, false],
			[false, true, false],
			[true, false, false],
			[true, true, true],
		];
		let ground = model.decision_energy(&accepting[0]);
		for tuple in accepting.iter() {
			assert!((model.decision_energy(tuple) - ground).abs() < 1e-6);
		}
		for i in 0..8usize {
			let tuple = decode(i, 3);
			if !accepting.iter().any(|t| t[..] == tuple[..]) {
				assert!(model.decision_energy(&tuple) > ground + DEFAULT_FAULT_GAP - 1e-6);
			}
		}
	}

	#[test]
	fn xor_needs_an_auxiliary() {
		let oracle = ProjectionOracle::default();
		let table = EnergyTable::from_table(Gate::Xor.table(), DEFAULT_FAULT_GAP).unwrap();
		match oracle.realize(&table, 3, Vartype::Spin) {
			Err(Error::ImpossiblePenaltyModel { size }) => assert_eq!(size, 3),
			other => panic!("expected ImpossiblePenaltyModel, got {:?}", other),
		}
		let model =
			gate_model(Gate::Xor, Vartype::Spin, DEFAULT_FAULT_GAP, &oracle, DEFAULT_MAX_SIZE)
				.unwrap();
		assert!(model.num_aux() >= 1);
	}

	#[test]
	fn realization_respects_bias_bounds() {
		let oracle = ProjectionOracle::default();
		let table = EnergyTable::from_table(Gate::FullAdd.table(), DEFAULT_FAULT_GAP).unwrap();
		let realization = oracle.realize(&table, 5, Vartype::Spin).unwrap();
		for h in realization.linear.iter() {
			assert!(h.abs() <= oracle.linear_bound + 1e-6);
		}
		for (_, _, j) in realization.quadratic.iter() {
			assert!(j.abs() <= oracle.quadratic_bound + 1e-6);
		}
	}
}
