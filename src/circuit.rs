use crate::bqm::{Bqm, Vartype};
use crate::error::{Error, Result};
use crate::gates::Gate;
use crate::penalty::{gate_model, PenaltyModel, PenaltyOracle, Var, DEFAULT_MAX_SIZE};
use crate::stitch::stitch;
use crate::{GateLabel, VarLabel};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One gate in a circuit: a gate kind with its local variables aliased to
/// circuit-level wire names.
#[derive(Clone, Debug)]
pub struct GateInstance<Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	label: Tg,
	gate: Gate,
	wires: Vec<Tw>,
}

impl<Tg, Tw> GateInstance<Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	pub fn new(label: Tg, gate: Gate, wires: Vec<Tw>) -> Result<Self> {
		if wires.len() != gate.arity() {
			return Err(Error::WireCountMismatch {
				gate: gate.name(),
				expected: gate.arity(),
				got: wires.len(),
			});
		}
		Ok(Self { label, gate, wires })
	}

	fn of(label: Tg, gate: Gate, wires: Vec<Tw>) -> Self {
		debug_assert_eq!(wires.len(), gate.arity());
		Self { label, gate, wires }
	}

	pub fn label(&self) -> &Tg {
		&self.label
	}

	pub fn gate(&self) -> Gate {
		self.gate
	}

	pub fn wires(&self) -> &[Tw] {
		&self.wires
	}
}

/// Mints circuit-unique auxiliary ids; scoped to one build call so there is
/// no cross-circuit shared state.
struct AuxAllocator {
	next: usize,
}

impl AuxAllocator {
	fn new() -> Self {
		Self { next: 0 }
	}

	fn fresh(&mut self) -> usize {
		self.next += 1;
		self.next - 1
	}
}

/// A stitched circuit model plus the per-instance wire bookkeeping needed to
/// judge each gate against a full assignment.
#[derive(Clone, Debug)]
pub struct Circuit<Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	bqm: Bqm<Var<Tw>>,
	gates: Vec<GateInstance<Tg, Tw>>,
	vartype: Vartype,
}

impl<Tg, Tw> Circuit<Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	/// Compile every gate kind used by `gates` (once per kind), alias each
	/// instance's model onto its wires with fresh auxiliary names, and
	/// stitch the copies into one model.
	pub fn build<O>(
		gates: Vec<GateInstance<Tg, Tw>>,
		vartype: Vartype,
		gap: f64,
		oracle: &O,
	) -> Result<Self>
	where
		O: PenaltyOracle + ?Sized,
	{
		let mut cache: HashMap<Gate, PenaltyModel<&'static str>> = HashMap::new();
		let mut aux = AuxAllocator::new();
		let mut parts = Vec::with_capacity(gates.len());
		for instance in gates.iter() {
			let model = match cache.entry(instance.gate) {
				Entry::Occupied(entry) => entry.into_mut(),
				Entry::Vacant(entry) => entry.insert(gate_model(
					instance.gate,
					vartype,
					gap,
					oracle,
					DEFAULT_MAX_SIZE,
				)?),
			};
			let locals = instance.gate.table().variables();
			let mut rename: BTreeMap<Var<&'static str>, Var<Tw>> = BTreeMap::new();
			for var in model.bqm().variables() {
				let target = match var {
					Var::Wire(name) => {
						let position = locals.iter().position(|l| l == name).unwrap();
						Var::Wire(instance.wires[position].clone())
					}
					Var::Aux(_) => Var::Aux(aux.fresh()),
				};
				rename.insert(var.clone(), target);
			}
			parts.push(model.bqm().map_labels(|var| rename[var].clone()));
		}
		let bqm = stitch(&parts);
		debug!(
			gates = gates.len(),
			variables = bqm.num_variables(),
			"circuit assembled"
		);
		Ok(Self {
			bqm,
			gates,
			vartype,
		})
	}

	pub fn bqm(&self) -> &Bqm<Var<Tw>> {
		&self.bqm
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn gates(&self) -> &[GateInstance<Tg, Tw>] {
		&self.gates
	}

	/// Per gate instance, whether the assignment restricted to its wires is
	/// one of the gate kind's accepting configurations.
	pub fn check(&self, assignment: &BTreeMap<Tw, bool>) -> Result<BTreeMap<Tg, bool>> {
		let mut verdicts = BTreeMap::new();
		for instance in self.gates.iter() {
			let mut values = Vec::with_capacity(instance.wires.len());
			for wire in instance.wires.iter() {
				values.push(*assignment.get(wire).ok_or_else(|| Error::UnknownVariable {
					name: format!("{:?}", wire),
				})?);
			}
			verdicts.insert(instance.label.clone(), instance.gate.accepts(&values));
		}
		Ok(verdicts)
	}

	/// Fold known wire values into a copy of the circuit's model.
	pub fn fix(&self, assignment: &BTreeMap<Tw, bool>) -> Result<FixedCircuit<'_, Tg, Tw>> {
		let mut fixed = FixedCircuit {
			circuit: self,
			bqm: self.bqm.clone(),
			fixed: BTreeMap::new(),
			dont_care: Vec::new(),
		};
		fixed.fix_more(assignment)?;
		Ok(fixed)
	}
}

/// A circuit model with some variables fixed. Keeps the fixed values around
/// so later `check` calls see the complete assignment.
#[derive(Clone, Debug)]
pub struct FixedCircuit<'a, Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	circuit: &'a Circuit<Tg, Tw>,
	bqm: Bqm<Var<Tw>>,
	fixed: BTreeMap<Var<Tw>, bool>,
	dont_care: Vec<Var<Tw>>,
}

impl<'a, Tg, Tw> FixedCircuit<'a, Tg, Tw>
where
	Tg: GateLabel,
	Tw: VarLabel,
{
	/// Fix further wires. Re-fixing a wire to its current value is a no-op;
	/// a different value is an error, and nothing is applied unless the
	/// whole batch validates.
	pub fn fix_more(&mut self, assignment: &BTreeMap<Tw, bool>) -> Result<()> {
		let mut pending = Vec::with_capacity(assignment.len());
		for (wire, value) in assignment.iter() {
			let var = Var::Wire(wire.clone());
			if let Some(previous) = self.fixed.get(&var) {
				if previous == value {
					continue;
				}
				return Err(Error::ConflictingFix {
					name: format!("{:?}", wire),
				});
			}
			if !self.bqm.contains(&var) {
				return Err(Error::UnknownVariable {
					name: format!("{:?}", wire),
				});
			}
			pending.push((var, *value));
		}
		for (var, value) in pending {
			self.bqm.fix_variable(&var, value)?;
			self.fixed.insert(var, value);
		}
		// fixing can leave an auxiliary with no remaining contribution;
		// pin those to false so the reduced model stays evaluable
		for var in self.bqm.isolated_variables() {
			self.bqm.fix_variable(&var, false)?;
			self.fixed.insert(var.clone(), false);
			self.dont_care.push(var);
		}
		Ok(())
	}

	/// Fix an unsigned value onto wires given most significant first, the
	/// convention the demos use for inputs and products.
	pub fn fix_number(&mut self, wires_msb_first: &[Tw], value: u64) -> Result<()> {
		self.fix_more(&number_to_bits(wires_msb_first, value)?)
	}

	pub fn bqm(&self) -> &Bqm<Var<Tw>> {
		&self.bqm
	}

	pub fn fixed(&self) -> &BTreeMap<Var<Tw>, bool> {
		&self.fixed
	}

	/// Variables that came loose while fixing and were pinned to a default.
	pub fn dont_care(&self) -> &[Var<Tw>] {
		&self.dont_care
	}

	/// Judge every gate instance against a sample over the remaining
	/// variables, merged with the fixed values.
	pub fn check(&self, sample: &BTreeMap<Var<Tw>, bool>) -> Result<BTreeMap<Tg, bool>> {
		let mut wires = BTreeMap::new();
		for (var, value) in self.fixed.iter().chain(sample.iter()) {
			if let Var::Wire(wire) = var {
				wires.insert(wire.clone(), *value);
			}
		}
		self.circuit.check(&wires)
	}
}

/// Map a value onto wires most significant first: value 3 on `[a2, a1, a0]`
/// gives `a2 = 0, a1 = 1, a0 = 1`.
pub fn number_to_bits<Tw>(wires_msb_first: &[Tw], value: u64) -> Result<BTreeMap<Tw, bool>>
where
	Tw: VarLabel,
{
	let bits = wires_msb_first.len();
	if bits < 64 && value >> bits != 0 {
		return Err(Error::ValueOutOfRange { value, bits });
	}
	Ok(wires_msb_first
		.iter()
		.enumerate()
		.map(|(i, wire)| (wire.clone(), value >> (bits - 1 - i) & 1 == 1))
		.collect())
}

/// The three-bit multiplier topology: nine partial products feeding a
/// carry-save adder chain onto the product wires.
///
/// ```text
///                       and20  and10  and00
///                and21  and11  and01
///         and22  and12  and02
/// ----------------------------------------
///    p5     p4     p3     p2     p1     p0
/// ```
pub fn three_bit_multiplier() -> Vec<GateInstance<&'static str, &'static str>> {
	vec![
		GateInstance::of("and00", Gate::And, vec!["a0", "b0", "p0"]),
		GateInstance::of("and01", Gate::And, vec!["a0", "b1", "and01"]),
		GateInstance::of("and02", Gate::And, vec!["a0", "b2", "and02"]),
		GateInstance::of("and10", Gate::And, vec!["a1", "b0", "and10"]),
		GateInstance::of("and11", Gate::And, vec!["a1", "b1", "and11"]),
		GateInstance::of("and12", Gate::And, vec!["a1", "b2", "and12"]),
		GateInstance::of("and20", Gate::And, vec!["a2", "b0", "and20"]),
		GateInstance::of("and21", Gate::And, vec!["a2", "b1", "and21"]),
		GateInstance::of("and22", Gate::And, vec!["a2", "b2", "and22"]),
		GateInstance::of("add01", Gate::HalfAdd, vec!["and01", "and10", "p1", "carry01"]),
		GateInstance::of(
			"add02",
			Gate::FullAdd,
			vec!["and02", "sum11", "carry01", "p2", "carry02"],
		),
		GateInstance::of("add03", Gate::HalfAdd, vec!["carry02", "sum12", "p3", "carry03"]),
		GateInstance::of("add11", Gate::HalfAdd, vec!["and11", "and20", "sum11", "carry11"]),
		GateInstance::of(
			"add12",
			Gate::FullAdd,
			vec!["and12", "and21", "carry11", "sum12", "carry12"],
		),
		GateInstance::of(
			"add13",
			Gate::FullAdd,
			vec!["carry03", "and22", "carry12", "p4", "p5"],
		),
	]
}
