use crate::bqm::{Bqm, Vartype};
use crate::VarLabel;
use std::collections::BTreeMap;

/// Combine penalty models into one model by summing linear biases, couplings
/// and offsets over shared variables and pairs.
///
/// The result is independent of the order of `models`: each key's
/// contributions are folded in `total_cmp` order, so any permutation of the
/// same multiset of models produces bit-identical maps. (Plain left-to-right
/// folding would not, since float addition is not associative.)
pub fn stitch<Tq>(models: &[Bqm<Tq>]) -> Bqm<Tq>
where
	Tq: VarLabel,
{
	let vartype = models
		.first()
		.map(|m| m.vartype())
		.unwrap_or(Vartype::Spin);
	let mut linear: BTreeMap<Tq, Vec<f64>> = BTreeMap::new();
	let mut quadratic: BTreeMap<(Tq, Tq), Vec<f64>> = BTreeMap::new();
	let mut offsets = Vec::with_capacity(models.len());
	for model in models {
		assert_eq!(
			model.vartype(),
			vartype,
			"cannot stitch models of different vartypes"
		);
		for (q, h) in model.linear().iter() {
			linear.entry(q.clone()).or_default().push(*h);
		}
		for ((u, v), j) in model.quadratic().iter() {
			quadratic.entry((u.clone(), v.clone())).or_default().push(*j);
		}
		offsets.push(model.offset());
	}
	let mut out = Bqm::new(vartype);
	for (q, biases) in linear {
		out.add_linear(q, ordered_sum(biases));
	}
	for ((u, v), biases) in quadratic {
		out.add_quadratic(u, v, ordered_sum(biases));
	}
	out.add_offset(ordered_sum(offsets));
	out
}

fn ordered_sum(mut values: Vec<f64>) -> f64 {
	values.sort_by(|a, b| a.total_cmp(b));
	values.into_iter().sum()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn part(entries: &[(u32, f64)], couplings: &[(u32, u32, f64)], offset: f64) -> Bqm<u32> {
		let mut bqm = Bqm::new(Vartype::Spin);
		for (q, h) in entries {
			bqm.add_linear(*q, *h);
		}
		for (u, v, j) in couplings {
			bqm.add_quadratic(*u, *v, *j);
		}
		bqm.add_offset(offset);
		bqm
	}

	#[test]
	fn sums_shared_terms() {
		let a = part(&[(0, 0.5), (1, -1.0)], &[(0, 1, 0.25)], 1.0);
		let b = part(&[(1, 0.5), (2, 2.0)], &[(0, 1, 0.25), (1, 2, -1.0)], 0.5);
		let stitched = stitch(&[a.clone(), b.clone()]);
		assert_eq!(stitched.linear()[&0], 0.5);
		assert_eq!(stitched.linear()[&1], -0.5);
		assert_eq!(stitched.linear()[&2], 2.0);
		assert_eq!(stitched.quadratic()[&(0, 1)], 0.5);
		assert_eq!(stitched.quadratic()[&(1, 2)], -1.0);
		assert_eq!(stitched.offset(), 1.5);

		// pairwise accumulation agrees on two models
		let mut acc = a;
		acc += &b;
		assert_eq!(acc, stitched);
	}

	#[test]
	fn empty_input() {
		let stitched: Bqm<u32> = stitch(&[]);
		assert_eq!(stitched.num_variables(), 0);
		assert_eq!(stitched.offset(), 0.0);
	}

	proptest! {
		// any ordering of the same models stitches bit-identically
		#[test]
		fn order_independent(
			biases in proptest::collection::vec((-1000i32..1000, -1000i32..1000, -1000i32..1000), 3..7),
			perm in proptest::collection::vec(0usize..6, 6),
		) {
			let models: Vec<Bqm<u32>> = biases
				.iter()
				.map(|(h0, h1, j)| {
					part(
						&[(0, *h0 as f64 / 8.0), (1, *h1 as f64 / 8.0)],
						&[(0, 1, *j as f64 / 8.0)],
						*j as f64 / 16.0,
					)
				})
				.collect();
			let mut shuffled = models.clone();
			for (i, p) in perm.iter().enumerate() {
				let len = shuffled.len();
				let j = p % len;
				shuffled.swap(i % len, j);
			}
			let a = stitch(&models);
			let b = stitch(&shuffled);
			for (q, h) in a.linear().iter() {
				prop_assert_eq!(h.to_bits(), b.linear()[q].to_bits());
			}
			for (key, j) in a.quadratic().iter() {
				prop_assert_eq!(j.to_bits(), b.quadratic()[key].to_bits());
			}
			prop_assert_eq!(a.offset().to_bits(), b.offset().to_bits());
		}
	}
}
