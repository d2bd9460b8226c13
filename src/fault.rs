use crate::error::{Error, Result};
use crate::gates::ConstraintTable;

/// Default separation between accepting and rejecting configurations.
pub const DEFAULT_FAULT_GAP: f64 = 0.5;

/// A dense energy assignment over every configuration of `arity` variables.
///
/// Configuration `i` of variable `v` is bit `v` of the index, so index 0 is
/// the all-false tuple and index `2^arity - 1` the all-true one. Accepting
/// configurations sit at energy zero, every other configuration at least
/// `gap` above them.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyTable {
	arity: usize,
	energies: Vec<f64>,
	gap: f64,
}

impl EnergyTable {
	/// Expand a constraint table into a full energy table: accepting tuples
	/// at zero, all others at `gap`.
	pub fn from_table(table: &ConstraintTable, gap: f64) -> Result<Self> {
		if table.arity() == 0 || table.accepting().is_empty() {
			return Err(Error::EmptyConstraint);
		}
		if gap <= 0.0 {
			return Err(Error::NonPositiveGap { gap });
		}
		let arity = table.arity();
		let energies = (0..1usize << arity)
			.map(|index| {
				if table.accepts(&decode(index, arity)) {
					0.0
				} else {
					gap
				}
			})
			.collect();
		Ok(Self {
			arity,
			energies,
			gap,
		})
	}

	pub fn arity(&self) -> usize {
		self.arity
	}

	pub fn gap(&self) -> f64 {
		self.gap
	}

	pub fn len(&self) -> usize {
		self.energies.len()
	}

	pub fn energy(&self, index: usize) -> f64 {
		self.energies[index]
	}

	pub fn is_accepting(&self, index: usize) -> bool {
		self.energies[index] == 0.0
	}
}

/// Configuration index to value tuple, bit `v` of the index is variable `v`.
pub(crate) fn decode(index: usize, arity: usize) -> Vec<bool> {
	(0..arity).map(|v| index >> v & 1 == 1).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gates::Gate;

	#[test]
	fn and_expansion() {
		let table = EnergyTable::from_table(Gate::And.table(), DEFAULT_FAULT_GAP).unwrap();
		assert_eq!(table.len(), 8);
		let zeros = (0..table.len()).filter(|&i| table.is_accepting(i)).count();
		assert_eq!(zeros, 4);
		for index in 0..table.len() {
			let energy = table.energy(index);
			assert!(energy == 0.0 || energy == DEFAULT_FAULT_GAP);
			assert_eq!(
				energy == 0.0,
				Gate::And.accepts(&decode(index, table.arity()))
			);
		}
	}

	#[test]
	fn empty_table_is_an_error() {
		static EMPTY: ConstraintTable = ConstraintTable::new(&[], &[]);
		assert_eq!(
			EnergyTable::from_table(&EMPTY, 0.5),
			Err(Error::EmptyConstraint)
		);
		static NO_ACCEPT: ConstraintTable = ConstraintTable::new(&["x"], &[]);
		assert_eq!(
			EnergyTable::from_table(&NO_ACCEPT, 0.5),
			Err(Error::EmptyConstraint)
		);
	}

	#[test]
	fn gap_must_be_positive() {
		match EnergyTable::from_table(Gate::And.table(), 0.0) {
			Err(Error::NonPositiveGap { .. }) => (),
			other => panic!("expected NonPositiveGap, got {:?}", other),
		}
	}

	#[test]
	fn decode_is_lsb_first() {
		assert_eq!(decode(0b101, 3), vec![true, false, true]);
		assert_eq!(decode(0, 3), vec![false, false, false]);
	}
}
