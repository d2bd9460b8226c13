use crate::error::{Error, Result};

const F: bool = false;
const T: bool = true;

/// An ordered tuple of variable names plus the set of accepting
/// configurations over those variables.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintTable {
	variables: &'static [&'static str],
	accepting: &'static [&'static [bool]],
}

impl ConstraintTable {
	pub const fn new(
		variables: &'static [&'static str],
		accepting: &'static [&'static [bool]],
	) -> Self {
		Self {
			variables,
			accepting,
		}
	}

	pub fn arity(&self) -> usize {
		self.variables.len()
	}

	pub fn variables(&self) -> &'static [&'static str] {
		self.variables
	}

	pub fn accepting(&self) -> &'static [&'static [bool]] {
		self.accepting
	}

	pub fn accepts(&self, values: &[bool]) -> bool {
		self.accepting.iter().any(|&t| t == values)
	}
}

// (in1, in2, out)
static AND: ConstraintTable = ConstraintTable::new(
	&["in1", "in2", "out"],
	&[&[F, F, F], &[F, T, F], &[T, F, F], &[T, T, T]],
);

// (in1, in2, out)
static OR: ConstraintTable = ConstraintTable::new(
	&["in1", "in2", "out"],
	&[&[F, F, F], &[F, T, T], &[T, F, T], &[T, T, T]],
);

// (in1, in2, out)
static XOR: ConstraintTable = ConstraintTable::new(
	&["in1", "in2", "out"],
	&[&[F, F, F], &[F, T, T], &[T, F, T], &[T, T, F]],
);

// (augend, addend, sum, carry_out)
static HALF_ADD: ConstraintTable = ConstraintTable::new(
	&["augend", "addend", "sum", "carry_out"],
	&[
		&[F, F, F, F],
		&[F, T, T, F],
		&[T, F, T, F],
		&[T, T, F, T],
	],
);

// (augend, addend, carry_in, sum, carry_out)
static FULL_ADD: ConstraintTable = ConstraintTable::new(
	&["augend", "addend", "carry_in", "sum", "carry_out"],
	&[
		&[F, F, F, F, F],
		&[F, F, T, T, F],
		&[F, T, F, T, F],
		&[F, T, T, F, T],
		&[T, F, F, T, F],
		&[T, F, T, F, T],
		&[T, T, F, F, T],
		&[T, T, T, T, T],
	],
);

/// The registered gate kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gate {
	And,
	Or,
	Xor,
	HalfAdd,
	FullAdd,
}

impl Gate {
	pub const ALL: [Gate; 5] = [Gate::And, Gate::Or, Gate::Xor, Gate::HalfAdd, Gate::FullAdd];

	pub fn name(&self) -> &'static str {
		match self {
			Gate::And => "AND",
			Gate::Or => "OR",
			Gate::Xor => "XOR",
			Gate::HalfAdd => "HALF_ADD",
			Gate::FullAdd => "FULL_ADD",
		}
	}

	pub fn from_name(name: &str) -> Result<Gate> {
		match name {
			"AND" => Ok(Gate::And),
			"OR" => Ok(Gate::Or),
			"XOR" => Ok(Gate::Xor),
			"HALF_ADD" => Ok(Gate::HalfAdd),
			"FULL_ADD" => Ok(Gate::FullAdd),
			_ => Err(Error::UnknownGateKind {
				name: name.to_string(),
			}),
		}
	}

	pub fn table(&self) -> &'static ConstraintTable {
		match self {
			Gate::And => &AND,
			Gate::Or => &OR,
			Gate::Xor => &XOR,
			Gate::HalfAdd => &HALF_ADD,
			Gate::FullAdd => &FULL_ADD,
		}
	}

	pub fn arity(&self) -> usize {
		self.table().arity()
	}

	pub fn accepts(&self, values: &[bool]) -> bool {
		self.table().accepts(values)
	}
}
