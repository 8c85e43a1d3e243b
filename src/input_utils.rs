//! Utility functions for fabricating regression instances for demos,
//! benchmarks and tests. Real deployments load their inputs elsewhere.

use rand::{CryptoRng, Rng};

/// Generate a random n-by-d sample matrix and a length-n target vector.
pub fn random_instance<RNG: CryptoRng + Rng>(
    num_samples: usize,
    num_features: usize,
    rng: &mut RNG,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let data = (0..num_samples)
        .map(|_| {
            (0..num_features)
                .map(|_| rng.gen_range(-100.0..100.0))
                .collect()
        })
        .collect();
    let target = (0..num_samples)
        .map(|_| rng.gen_range(-100.0..100.0))
        .collect();
    (data, target)
}

/// Split the feature rows evenly across the data parties.
///
/// Returns ownership boundaries for `num_parties` parties (the trusted
/// initializer's slot included); the target row falls to the last party.
pub fn even_partition(num_parties: usize, num_features: usize) -> Vec<usize> {
    let data_parties = num_parties.saturating_sub(1).max(1);
    let mut index_owned = vec![0, 0];
    for k in 2..num_parties {
        index_owned.push((k - 1) * num_features / data_parties);
    }
    index_owned
}
