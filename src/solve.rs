use crate::anneal::{Annealer, BitState};
use crate::bqm::Bqm;
use crate::error::{Error, Result};
use crate::VarLabel;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Optional timing metadata attached to a sample set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timing {
	pub qpu_process_time_ms: Option<u64>,
	pub queue_time_ms: Option<u64>,
}

/// One distinct assignment with its energy and how often it was drawn.
#[derive(Clone, Debug)]
pub struct SampleRecord<Tq>
where
	Tq: VarLabel,
{
	pub assignment: BTreeMap<Tq, bool>,
	pub energy: f64,
	pub num_occurrences: usize,
}

/// A histogram of drawn assignments, lowest energy first.
#[derive(Clone, Debug)]
pub struct SampleSet<Tq>
where
	Tq: VarLabel,
{
	records: Vec<SampleRecord<Tq>>,
	timing: Timing,
}

impl<Tq> SampleSet<Tq>
where
	Tq: VarLabel,
{
	pub fn from_reads(reads: Vec<(BTreeMap<Tq, bool>, f64)>, timing: Timing) -> Self {
		let mut histogram: BTreeMap<BTreeMap<Tq, bool>, (f64, usize)> = BTreeMap::new();
		for (assignment, energy) in reads {
			let entry = histogram.entry(assignment).or_insert((energy, 0));
			entry.1 += 1;
		}
		let mut records: Vec<SampleRecord<Tq>> = histogram
			.into_iter()
			.map(|(assignment, (energy, num_occurrences))| SampleRecord {
				assignment,
				energy,
				num_occurrences,
			})
			.collect();
		records.sort_by(|a, b| a.energy.total_cmp(&b.energy));
		Self { records, timing }
	}

	pub fn records(&self) -> &[SampleRecord<Tq>] {
		&self.records
	}

	/// The lowest-energy record seen.
	pub fn best(&self) -> Option<&SampleRecord<Tq>> {
		self.records.first()
	}

	pub fn timing(&self) -> &Timing {
		&self.timing
	}

	pub fn total_reads(&self) -> usize {
		self.records.iter().map(|r| r.num_occurrences).sum()
	}
}

/// A backend that draws low-energy assignments from a model. The annealing
/// cloud service and the classical fallback below both look like this.
pub trait Sampler<Tq>
where
	Tq: VarLabel,
{
	fn sample(&self, bqm: &Bqm<Tq>, num_reads: usize) -> Result<SampleSet<Tq>>;
}

/// Classical fallback sampler: independent simulated-annealing restarts in
/// parallel, one per read.
pub struct SimulatedAnnealer {
	pub beta_count: usize,
	pub sweeps_per_beta: usize,
	pub seed: u64,
}

impl Default for SimulatedAnnealer {
	fn default() -> Self {
		Self {
			beta_count: 100,
			sweeps_per_beta: 30,
			seed: 0x5eed,
		}
	}
}

impl SimulatedAnnealer {
	pub fn with_seed(seed: u64) -> Self {
		Self {
			seed,
			..Self::default()
		}
	}

	fn beta_schedule(beta_min: f64, beta_max: f64, count: usize) -> Vec<f64> {
		if count < 2 {
			return vec![beta_min];
		}
		let r = f64::ln(beta_max / beta_min) / (count as f64 - 1.0);
		(0..count)
			.map(|index| beta_min * f64::exp(index as f64 * r))
			.collect()
	}

	/// Hot enough to accept the largest single flip, cold enough to freeze
	/// the smallest nonzero one.
	fn beta_range(h: &[f64], neighbors: &[Vec<(usize, f64)>]) -> (f64, f64) {
		let couplings = neighbors.iter().flat_map(|edges| edges.iter().map(|(_, w)| w));
		let smallest = h
			.iter()
			.chain(couplings)
			.map(|value| value.abs())
			.filter(|value| *value > 0.0)
			.fold(f64::INFINITY, f64::min);
		let largest = h
			.iter()
			.enumerate()
			.map(|(i, bias)| {
				bias.abs() + neighbors[i].iter().map(|(_, w)| w.abs()).sum::<f64>()
			})
			.fold(f64::NEG_INFINITY, f64::max);
		if smallest.is_finite() && largest.is_finite() && largest > 0.0 {
			(f64::ln(2.0) / largest, f64::ln(100.0) / smallest)
		} else {
			(0.1, 1.0)
		}
	}
}

/// Dense arrays for the annealer: variables in sorted order, neighbor lists
/// holding both directions of every coupling.
fn to_arrays<Tq>(bqm: &Bqm<Tq>) -> (Vec<&Tq>, Vec<f64>, Vec<Vec<(usize, f64)>>)
where
	Tq: VarLabel,
{
	let qubits: Vec<&Tq> = bqm.variables().collect();
	let index: BTreeMap<&Tq, usize> = qubits.iter().enumerate().map(|(i, q)| (*q, i)).collect();
	let mut h = vec![0.0; qubits.len()];
	for (q, bias) in bqm.linear().iter() {
		h[index[q]] = *bias;
	}
	let mut neighbors = vec![Vec::new(); qubits.len()];
	for ((u, v), weight) in bqm.quadratic().iter() {
		let (i, j) = (index[u], index[v]);
		neighbors[i].push((j, *weight));
		neighbors[j].push((i, *weight));
	}
	(qubits, h, neighbors)
}

impl<Tq> Sampler<Tq> for SimulatedAnnealer
where
	Tq: VarLabel + Send + Sync,
{
	fn sample(&self, bqm: &Bqm<Tq>, num_reads: usize) -> Result<SampleSet<Tq>> {
		let start = Instant::now();
		let binary = bqm.to_binary();
		let (qubits, h, neighbors) = to_arrays(&binary);
		if qubits.is_empty() {
			let reads = (0..num_reads.max(1))
				.map(|_| (BTreeMap::new(), bqm.offset()))
				.collect();
			return Ok(SampleSet::from_reads(reads, Timing::default()));
		}
		let (beta_min, beta_max) = Self::beta_range(&h, &neighbors);
		let schedule = Self::beta_schedule(beta_min, beta_max, self.beta_count);
		let reads: Vec<(BTreeMap<Tq, bool>, f64)> = (0..num_reads)
			.into_par_iter()
			.map(|read| {
				let mut rng =
					SmallRng::seed_from_u64(self.seed ^ (read as u64).wrapping_mul(0x9e3779b97f4a7c15));
				let annealer = Annealer::new(self.sweeps_per_beta, schedule.clone());
				let mut state = BitState::random(qubits.len(), &mut rng);
				annealer.run(&mut state, &mut rng, &h, &neighbors);
				let assignment: BTreeMap<Tq, bool> = qubits
					.iter()
					.enumerate()
					.map(|(i, q)| ((*q).clone(), state.get(i)))
					.collect();
				let energy = bqm.energy(&assignment).unwrap();
				(assignment, energy)
			})
			.collect();
		let timing = Timing {
			qpu_process_time_ms: Some(start.elapsed().as_millis() as u64),
			queue_time_ms: None,
		};
		let set = SampleSet::from_reads(reads, timing);
		debug!(
			reads = set.total_reads(),
			distinct = set.records().len(),
			"annealing finished"
		);
		Ok(set)
	}
}

/// Bounded retry with doubling backoff around a sampler whose backend can
/// be transiently offline. Gives up with `SolverUnavailable` instead of
/// looping forever.
pub struct Retry<S> {
	inner: S,
	pub max_attempts: usize,
	pub base_delay: Duration,
}

impl<S> Retry<S> {
	pub fn new(inner: S) -> Self {
		Self {
			inner,
			max_attempts: 5,
			base_delay: Duration::from_millis(100),
		}
	}
}

impl<Tq, S> Sampler<Tq> for Retry<S>
where
	Tq: VarLabel,
	S: Sampler<Tq>,
{
	fn sample(&self, bqm: &Bqm<Tq>, num_reads: usize) -> Result<SampleSet<Tq>> {
		let mut delay = self.base_delay;
		for attempt in 0..self.max_attempts {
			match self.inner.sample(bqm, num_reads) {
				Err(Error::SolverOffline) => {
					warn!(attempt, "solver offline, backing off");
					std::thread::sleep(delay);
					delay *= 2;
				}
				other => return other,
			}
		}
		Err(Error::SolverUnavailable {
			attempts: self.max_attempts,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bqm::Vartype;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn frustrated_pair() -> Bqm<u32> {
		// ground states are the two anti-aligned configurations
		let mut bqm = Bqm::new(Vartype::Spin);
		bqm.add_quadratic(0, 1, 1.0);
		bqm
	}

	#[test]
	fn annealer_finds_ground_states() {
		let bqm = frustrated_pair();
		let sampler = SimulatedAnnealer::default();
		let set = sampler.sample(&bqm, 8).unwrap();
		let best = set.best().unwrap();
		assert!((best.energy - -1.0).abs() < 1e-12);
		assert_ne!(best.assignment[&0], best.assignment[&1]);
		assert_eq!(set.total_reads(), 8);
	}

	#[test]
	fn histogram_merges_identical_reads() {
		let a: BTreeMap<u32, bool> = vec![(0, true)].into_iter().collect();
		let set = SampleSet::from_reads(
			vec![(a.clone(), 1.0), (a.clone(), 1.0), (a, 1.0)],
			Timing::default(),
		);
		assert_eq!(set.records().len(), 1);
		assert_eq!(set.records()[0].num_occurrences, 3);
	}

	#[test]
	fn all_variables_fixed_leaves_the_offset() {
		let mut bqm = frustrated_pair();
		bqm.fix_variable(&0, true).unwrap();
		bqm.fix_variable(&1, false).unwrap();
		let sampler = SimulatedAnnealer::default();
		let set = sampler.sample(&bqm, 4).unwrap();
		assert!((set.best().unwrap().energy - -1.0).abs() < 1e-12);
	}

	struct Flaky {
		failures: AtomicUsize,
	}

	impl Sampler<u32> for Flaky {
		fn sample(&self, bqm: &Bqm<u32>, num_reads: usize) -> Result<SampleSet<u32>> {
			if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
				if n > 0 {
					Some(n - 1)
				} else {
					None
				}
			})
			.is_ok()
			{
				return Err(Error::SolverOffline);
			}
			SimulatedAnnealer::default().sample(bqm, num_reads)
		}
	}

	#[test]
	fn retry_recovers_from_transient_outage() {
		let mut retry = Retry::new(Flaky {
			failures: AtomicUsize::new(2),
		});
		retry.base_delay = Duration::from_millis(0);
		let set = retry.sample(&frustrated_pair(), 2).unwrap();
		assert!(set.best().is_some());
	}

	#[test]
	fn retry_gives_up_eventually() {
		let mut retry = Retry::new(Flaky {
			failures: AtomicUsize::new(100),
		});
		retry.base_delay = Duration::from_millis(0);
		retry.max_attempts = 3;
		match retry.sample(&frustrated_pair(), 2) {
			Err(Error::SolverUnavailable { attempts }) => assert_eq!(attempts, 3),
			other => panic!("expected SolverUnavailable, got {:?}", other),
		}
	}
}
