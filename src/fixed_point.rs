//! Fixed-point encoding of real-valued inputs into Z_{2^64}.
//!
//! Protocol arithmetic is modulo 2^64, so every input value is scaled down
//! before the round: a Gram entry sums `n` products of `d`-dimensional
//! values, and dividing each operand by `sqrt(2^p * d * n)` keeps those sums
//! inside 64 bits for typical regression inputs. The signed interpretation
//! of an encoded word is two's complement with `p` fractional bits.

/// The rescale divisor `sqrt(2^p * d * n)`.
pub fn scale_factor(precision: u32, num_features: usize, num_samples: usize) -> f64 {
    (2f64.powi(precision as i32) * num_features as f64 * num_samples as f64).sqrt()
}

/// Scale one value down and round it to a signed 64-bit fixed-point word.
pub fn encode(v: f64, precision: u32, num_features: usize, num_samples: usize) -> u64 {
    (v / scale_factor(precision, num_features, num_samples)).round() as i64 as u64
}

/// Interpret a word as signed fixed-point with `precision` fractional bits.
/// Display only; the rescale divisor is not undone here.
pub fn decode(w: u64, precision: u32) -> f64 {
    (w as i64 as f64) * 2f64.powi(-(precision as i32))
}

/// Encode the n-by-d sample matrix into its `d` feature rows of length `n`
/// (the transposed, rescaled matrix the pair sweep walks).
pub fn encode_features(data: &[Vec<f64>], precision: u32) -> Vec<Vec<u64>> {
    let n = data.len();
    let d = data.first().map_or(0, Vec::len);
    (0..d)
        .map(|r| {
            data.iter()
                .map(|sample| encode(sample[r], precision, d, n))
                .collect()
        })
        .collect()
}

/// Encode the length-n target vector with the same divisor as the matrix.
pub fn encode_target(target: &[f64], precision: u32, num_features: usize) -> Vec<u64> {
    let n = target.len();
    target
        .iter()
        .map(|&v| encode(v, precision, num_features, n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use scuttlebutt::AesRng;

    #[test]
    fn test_encode_identity_scale() {
        // p = 0, d = 1, n = 1: the divisor is 1 and encoding is rounding.
        assert_eq!(encode(3.0, 0, 1, 1), 3);
        assert_eq!(encode(3.4, 0, 1, 1), 3);
        assert_eq!(encode(-2.5, 0, 1, 1), (-3i64) as u64);
    }

    #[test]
    fn test_decode_precision() {
        assert_eq!(decode(1u64 << 16, 16), 1.0);
        assert_eq!(decode((-4i64) as u64, 2), -1.0);
    }

    #[test]
    fn test_round_trip_error_bound() {
        let mut rng = AesRng::new();
        let (precision, d, n) = (8, 4, 16);
        let scale = scale_factor(precision, d, n);

        for _ in 0..100 {
            let v = rng.gen_range(-1e6..1e6);
            let w = encode(v, precision, d, n) as i64 as f64;
            // Rounding loses at most half a step of the divisor.
            assert!((w * scale - v).abs() <= scale / 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_encode_features_transposes() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let rows = encode_features(&data, 0);
        let scale = scale_factor(0, 2, 2);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0][1], encode(3.0, 0, 2, 2));
        assert_eq!(rows[1][0], encode(2.0, 0, 2, 2));
        assert_eq!(rows[0][0] as i64 as f64, (1.0 / scale).round());
    }

    #[test]
    fn test_encode_target_matches_matrix_divisor() {
        let target = vec![8.0, -8.0];
        let encoded = encode_target(&target, 0, 2);
        // d = 2, n = 2: divisor is 2.
        assert_eq!(encoded, vec![4, (-4i64) as u64]);
    }
}
