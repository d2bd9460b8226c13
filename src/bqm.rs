use crate::error::{Error, Result};
use crate::VarLabel;
use std::collections::BTreeMap;
use std::ops::{AddAssign, Mul};

/// Domain of the model's variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vartype {
	/// Values in {-1, +1}.
	Spin,
	/// Values in {0, 1}.
	Binary,
}

impl Vartype {
	pub fn value(&self, bit: bool) -> f64 {
		match (self, bit) {
			(Vartype::Spin, false) => -1.0,
			(Vartype::Spin, true) => 1.0,
			(Vartype::Binary, false) => 0.0,
			(Vartype::Binary, true) => 1.0,
		}
	}
}

/// A binary quadratic model: linear biases, pairwise couplings keyed by the
/// ordered variable pair, and a scalar offset.
///
/// Every variable mentioned by a coupling also has a linear entry (possibly
/// zero), so `variables` is just the linear key set.
#[derive(Clone, Debug, PartialEq)]
pub struct Bqm<Tq>
where
	Tq: VarLabel,
{
	linear: BTreeMap<Tq, f64>,
	quadratic: BTreeMap<(Tq, Tq), f64>,
	offset: f64,
	vartype: Vartype,
}

impl<Tq> Bqm<Tq>
where
	Tq: VarLabel,
{
	pub fn new(vartype: Vartype) -> Self {
		Self {
			linear: BTreeMap::new(),
			quadratic: BTreeMap::new(),
			offset: 0.0,
			vartype,
		}
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn offset(&self) -> f64 {
		self.offset
	}

	pub fn add_offset(&mut self, offset: f64) {
		self.offset += offset;
	}

	pub fn linear(&self) -> &BTreeMap<Tq, f64> {
		&self.linear
	}

	pub fn quadratic(&self) -> &BTreeMap<(Tq, Tq), f64> {
		&self.quadratic
	}

	pub fn variables(&self) -> impl Iterator<Item = &Tq> {
		self.linear.keys()
	}

	pub fn num_variables(&self) -> usize {
		self.linear.len()
	}

	pub fn contains(&self, q: &Tq) -> bool {
		self.linear.contains_key(q)
	}

	/// Accumulate a linear bias, creating the variable if needed.
	pub fn add_linear(&mut self, q: Tq, bias: f64) {
		*self.linear.entry(q).or_insert(0.0) += bias;
	}

	/// Accumulate a coupling, creating both endpoints if needed. The pair is
	/// stored with the lesser label first.
	pub fn add_quadratic(&mut self, u: Tq, v: Tq, bias: f64) {
		assert!(u != v, "cannot couple a variable to itself");
		let key = if u <= v { (u, v) } else { (v, u) };
		self.linear.entry(key.0.clone()).or_insert(0.0);
		self.linear.entry(key.1.clone()).or_insert(0.0);
		*self.quadratic.entry(key).or_insert(0.0) += bias;
	}

	/// Energy of a full assignment. Every variable of the model must be
	/// present in `sample`.
	pub fn energy(&self, sample: &BTreeMap<Tq, bool>) -> Result<f64> {
		let mut energy = self.offset;
		for (q, h) in self.linear.iter() {
			let bit = sample.get(q).ok_or_else(|| Error::UnknownVariable {
				name: format!("{:?}", q),
			})?;
			energy += h * self.vartype.value(*bit);
		}
		for ((u, v), j) in self.quadratic.iter() {
			energy += j * self.vartype.value(sample[u]) * self.vartype.value(sample[v]);
		}
		Ok(energy)
	}

	/// Permanently assign `value` to `q`, folding its contributions into the
	/// remaining biases and the offset.
	pub fn fix_variable(&mut self, q: &Tq, value: bool) -> Result<()> {
		let h = self.linear.remove(q).ok_or_else(|| Error::UnknownVariable {
			name: format!("{:?}", q),
		})?;
		let x = self.vartype.value(value);
		self.offset += h * x;
		let involved: Vec<(Tq, Tq)> = self
			.quadratic
			.keys()
			.filter(|(u, v)| u == q || v == q)
			.cloned()
			.collect();
		for key in involved {
			let j = self.quadratic.remove(&key).unwrap();
			let other = if &key.0 == q { key.1 } else { key.0 };
			*self.linear.entry(other).or_insert(0.0) += j * x;
		}
		Ok(())
	}

	pub fn fix_variables(&mut self, assignment: &BTreeMap<Tq, bool>) -> Result<()> {
		for (q, value) in assignment.iter() {
			self.fix_variable(q, *value)?;
		}
		Ok(())
	}

	/// Variables with zero linear bias and no remaining coupling. Fixing can
	/// strand an auxiliary this way; evaluating energy still needs a value
	/// for it, so callers should pin these to a known default.
	pub fn isolated_variables(&self) -> Vec<Tq> {
		self.linear
			.iter()
			.filter(|(q, h)| {
				**h == 0.0 && !self.quadratic.keys().any(|(u, v)| u == *q || v == *q)
			})
			.map(|(q, _)| q.clone())
			.collect()
	}

	/// A relabeled copy. The mapping must be injective over the model's
	/// variables; colliding labels would silently merge their biases.
	pub fn map_labels<U, F>(&self, mut f: F) -> Bqm<U>
	where
		U: VarLabel,
		F: FnMut(&Tq) -> U,
	{
		let mut out = Bqm::new(self.vartype);
		out.offset = self.offset;
		for (q, h) in self.linear.iter() {
			out.add_linear(f(q), *h);
		}
		for ((u, v), j) in self.quadratic.iter() {
			out.add_quadratic(f(u), f(v), *j);
		}
		out
	}

	/// The same energy function over {0, 1} variables.
	pub fn to_binary(&self) -> Bqm<Tq> {
		match self.vartype {
			Vartype::Binary => self.clone(),
			Vartype::Spin => {
				// s = 2x - 1
				let mut out = Bqm::new(Vartype::Binary);
				out.offset = self.offset;
				for (q, h) in self.linear.iter() {
					out.add_linear(q.clone(), 2.0 * h);
					out.offset -= h;
				}
				for ((u, v), j) in self.quadratic.iter() {
					out.add_quadratic(u.clone(), v.clone(), 4.0 * j);
					out.add_linear(u.clone(), -2.0 * j);
					out.add_linear(v.clone(), -2.0 * j);
					out.offset += j;
				}
				out
			}
		}
	}
}

impl<Tq> AddAssign<&Bqm<Tq>> for Bqm<Tq>
where
	Tq: VarLabel,
{
	fn add_assign(&mut self, other: &Bqm<Tq>) {
		assert_eq!(
			self.vartype, other.vartype,
			"cannot combine models of different vartypes"
		);
		for (q, h) in other.linear.iter() {
			self.add_linear(q.clone(), *h);
		}
		for ((u, v), j) in other.quadratic.iter() {
			self.add_quadratic(u.clone(), v.clone(), *j);
		}
		self.offset += other.offset;
	}
}

impl<Tq> Mul<f64> for Bqm<Tq>
where
	Tq: VarLabel,
{
	type Output = Self;

	fn mul(mut self, rhs: f64) -> Self::Output {
		for h in self.linear.values_mut() {
			*h *= rhs;
		}
		for j in self.quadratic.values_mut() {
			*j *= rhs;
		}
		self.offset *= rhs;
		self
	}
}
