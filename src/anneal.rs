use rand::Rng;

/// Maximum energy increase worth a Metropolis draw; anything steeper is
/// rejected without touching the rng.
const ACCEPT_CUTOFF: f64 = 44.0;

/// Bit-packed assignment over 0/1 variables.
pub struct BitState {
	bits: Vec<u8>,
	len: usize,
}

impl BitState {
	pub fn random<R: Rng>(len: usize, rng: &mut R) -> Self {
		let mut bits = vec![0u8; (len + 7) / 8];
		rng.fill_bytes(&mut bits);
		Self { bits, len }
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn get(&self, loc: usize) -> bool {
		assert!(loc < self.len);
		self.bits[loc / 8] & 1 << (loc % 8) != 0
	}

	#[inline]
	pub fn flip(&mut self, loc: usize) {
		assert!(loc < self.len);
		self.bits[loc / 8] ^= 1 << (loc % 8);
	}
}

impl std::fmt::Debug for BitState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for i in 0..self.len {
			f.write_str(if self.get(i) { "1" } else { "0" })?;
		}
		Ok(())
	}
}

/// Single-spin-flip Metropolis annealer over a 0/1 model given as dense
/// linear terms and symmetric neighbor lists. Flip costs are kept
/// incrementally, so a sweep is linear in the number of couplings.
#[derive(Clone)]
pub struct Annealer {
	pub sweeps_per_beta: usize,
	pub beta_schedule: Vec<f64>,
}

impl Annealer {
	pub fn new(sweeps_per_beta: usize, beta_schedule: Vec<f64>) -> Self {
		Self {
			sweeps_per_beta,
			beta_schedule,
		}
	}

	pub fn run<R: Rng>(
		&self,
		state: &mut BitState,
		rng: &mut R,
		h: &[f64],
		neighbors: &[Vec<(usize, f64)>],
	) {
		assert_eq!(state.len(), h.len());
		assert_eq!(state.len(), neighbors.len());
		let mut flip_costs = Vec::with_capacity(state.len());
		for (i, edges) in neighbors.iter().enumerate() {
			let mut cost = h[i];
			for (j, weight) in edges.iter() {
				if state.get(*j) {
					cost += weight;
				}
			}
			if state.get(i) {
				cost = -cost;
			}
			flip_costs.push(cost);
		}
		for beta in self.beta_schedule.iter() {
			for _ in 0..self.sweeps_per_beta {
				for i in 0..state.len() {
					let cost = flip_costs[i];
					if cost * beta > ACCEPT_CUTOFF {
						continue;
					}
					if cost <= 0.0 || f64::exp(-cost * beta) > rng.gen_range(0.0, 1.0) {
						state.flip(i);
						let on = state.get(i);
						for (j, weight) in neighbors[i].iter() {
							if on != state.get(*j) {
								flip_costs[*j] += weight;
							} else {
								flip_costs[*j] -= weight;
							}
						}
						flip_costs[i] = -flip_costs[i];
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::SmallRng;
	use rand::SeedableRng;

	#[test]
	fn bit_state_round_trip() {
		let mut rng = SmallRng::seed_from_u64(7);
		let mut state = BitState::random(13, &mut rng);
		let before: Vec<bool> = (0..13).map(|i| state.get(i)).collect();
		state.flip(5);
		state.flip(12);
		for (i, b) in before.iter().enumerate() {
			let expect = if i == 5 || i == 12 { !*b } else { *b };
			assert_eq!(state.get(i), expect);
		}
	}

	#[test]
	fn finds_the_ground_state_of_a_chain() {
		// three 0/1 variables, energy minimized by 1, 0, 1
		let h = vec![-1.0, 2.0, -1.0];
		let neighbors = vec![
			vec![(1, 1.5)],
			vec![(0, 1.5), (2, 1.5)],
			vec![(1, 1.5)],
		];
		let schedule: Vec<f64> = (0..50).map(|i| 0.1 * 1.15f64.powi(i)).collect();
		let annealer = Annealer::new(10, schedule);
		let mut rng = SmallRng::seed_from_u64(42);
		let mut state = BitState::random(3, &mut rng);
		annealer.run(&mut state, &mut rng, &h, &neighbors);
		assert!(state.get(0));
		assert!(!state.get(1));
		assert!(state.get(2));
	}
}
