use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a constraint table and a sample set.
///
/// `ImpossiblePenaltyModel` is recoverable: the size search consumes it and
/// retries with one more auxiliary variable. Everything else is surfaced to
/// the caller as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
	#[error("unknown gate kind `{name}`")]
	UnknownGateKind { name: String },

	#[error("constraint table has no variables or no accepting configuration")]
	EmptyConstraint,

	#[error("energy gap must be positive, got {gap}")]
	NonPositiveGap { gap: f64 },

	#[error("no penalty model fits on K{size}")]
	ImpossiblePenaltyModel { size: usize },

	#[error("constraint cannot be realized on any graph up to K{max_size}")]
	UnrealizableConstraint { max_size: usize },

	#[error("unknown variable {name}")]
	UnknownVariable { name: String },

	#[error("variable {name} is already fixed to a different value")]
	ConflictingFix { name: String },

	#[error("gate {gate} takes {expected} wires, got {got}")]
	WireCountMismatch {
		gate: &'static str,
		expected: usize,
		got: usize,
	},

	#[error("value {value} does not fit in {bits} bits")]
	ValueOutOfRange { value: u64, bits: usize },

	#[error("solver is offline")]
	SolverOffline,

	#[error("solver still unavailable after {attempts} attempts")]
	SolverUnavailable { attempts: usize },
}
