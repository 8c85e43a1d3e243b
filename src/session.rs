//! Session configuration shared by every participant: dimensions,
//! fixed-point precision, and the ownership partition of the Gram rows.
//!
//! Party 0 is always the trusted initializer; data parties are numbered
//! `1..num_parties`, and that numbering is used everywhere, on the wire and
//! off. Gram rows run over `0..=d`: rows below `d` are feature rows of the
//! sample matrix, and the synthetic row `d` is the target vector, owned by
//! the last data party.

use thiserror::Error;

/// usize is used as a party ID. The trusted initializer's ID is always 0.
pub type PartyId = usize;

/// Configuration and partition errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The row index is outside `0..=d`.
    #[error("invalid row {row} (rows run over 0..={max})")]
    InvalidRow {
        /// Offending row index.
        row: usize,
        /// Largest legal row index (the target row).
        max: usize,
    },
    /// The partition assigns the row to no data party.
    #[error("row {row} has no data-party owner")]
    InvalidOwner {
        /// Offending row index.
        row: usize,
    },
    /// The ownership boundaries are malformed.
    #[error("malformed ownership partition: {0}")]
    InvalidPartition(&'static str),
    /// The dimensions or precision are unusable.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(&'static str),
}

/// Immutable description of one sharing round. Built by the caller before
/// the round starts and read-only afterwards.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Total number of parties including the trusted initializer.
    pub num_parties: usize,
    /// Number of samples `n` (rows of the data matrix, length of the target).
    pub num_samples: usize,
    /// Number of features `d` (columns of the data matrix).
    pub num_features: usize,
    /// `index_owned[k]` is the first Gram row owned by data party `k`; the
    /// boundaries are non-decreasing and entries 0 and 1 are both 0 (the
    /// initializer owns nothing, the first data party starts at row 0).
    pub index_owned: Vec<usize>,
    /// Fixed-point precision in fractional bits.
    pub precision: u32,
}

impl SessionConfig {
    /// Build and validate a configuration.
    pub fn new(
        num_parties: usize,
        num_samples: usize,
        num_features: usize,
        index_owned: Vec<usize>,
        precision: u32,
    ) -> Result<Self, SessionError> {
        let config = Self {
            num_parties,
            num_samples,
            num_features,
            index_owned,
            precision,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants every participant relies on.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.num_parties < 3 {
            return Err(SessionError::InvalidPartition(
                "at least one initializer and two data parties are required",
            ));
        }
        if self.num_samples == 0 || self.num_features == 0 {
            return Err(SessionError::InvalidDimensions(
                "sample and feature counts must be positive",
            ));
        }
        if self.precision >= 64 {
            return Err(SessionError::InvalidDimensions(
                "precision must be below 64 bits",
            ));
        }
        if self.index_owned.len() != self.num_parties {
            return Err(SessionError::InvalidPartition(
                "one boundary per party is required",
            ));
        }
        if self.index_owned[0] != 0 || self.index_owned[1] != 0 {
            return Err(SessionError::InvalidPartition(
                "the first data party must start at row 0",
            ));
        }
        if self.index_owned.windows(2).any(|w| w[0] > w[1]) {
            return Err(SessionError::InvalidPartition(
                "boundaries must be non-decreasing",
            ));
        }
        if *self.index_owned.last().unwrap() > self.num_features {
            return Err(SessionError::InvalidPartition(
                "the last boundary is past the target row",
            ));
        }
        Ok(())
    }

    /// Index of the synthetic target row.
    pub fn target_row(&self) -> usize {
        self.num_features
    }

    /// The data party that owns Gram row `row`: the last party whose
    /// boundary does not exceed it.
    pub fn owner_of(&self, row: usize) -> Result<PartyId, SessionError> {
        if row > self.target_row() {
            return Err(SessionError::InvalidRow {
                row,
                max: self.target_row(),
            });
        }
        let mut party = 0;
        while party + 1 < self.num_parties && self.index_owned[party + 1] <= row {
            party += 1;
        }
        if party == 0 {
            return Err(SessionError::InvalidOwner { row });
        }
        Ok(party)
    }
}

/// Row-major lower-triangular pair enumeration: `(i, j)` for `i` over
/// `0..=d` and `j` over `0..=min(i, d - 1)`.
///
/// All participants walk this exact sequence, which makes it the implicit
/// clock of the round; no explicit synchronization messages exist.
pub fn pair_sweep(num_features: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..=num_features).flat_map(move |i| (0..(i + 1).min(num_features)).map(move |j| (i, j)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use scuttlebutt::AesRng;

    fn random_config(rng: &mut AesRng) -> SessionConfig {
        let num_parties = rng.gen_range(3..6);
        let num_features = rng.gen_range(1..10);
        let mut index_owned = vec![0, 0];
        for _ in 2..num_parties {
            let prev = *index_owned.last().unwrap();
            index_owned.push(rng.gen_range(prev..=num_features));
        }
        SessionConfig::new(num_parties, rng.gen_range(1..8), num_features, index_owned, 16)
            .unwrap()
    }

    #[test]
    fn test_owner_total_and_in_range() {
        let mut rng = AesRng::new();
        for _ in 0..50 {
            let config = random_config(&mut rng);
            let mut prev = 1;
            for row in 0..=config.target_row() {
                let owner = config.owner_of(row).unwrap();
                assert!(owner >= 1 && owner < config.num_parties);
                // Ownership is monotone in the row index.
                assert!(owner >= prev);
                prev = owner;
            }
            assert_eq!(
                config.owner_of(config.target_row()).unwrap(),
                config.num_parties - 1
            );
        }
    }

    #[test]
    fn test_owner_matches_partition() {
        let config = SessionConfig::new(4, 2, 4, vec![0, 0, 2, 3], 0).unwrap();
        assert_eq!(config.owner_of(0).unwrap(), 1);
        assert_eq!(config.owner_of(1).unwrap(), 1);
        assert_eq!(config.owner_of(2).unwrap(), 2);
        assert_eq!(config.owner_of(3).unwrap(), 3);
        assert_eq!(config.owner_of(4).unwrap(), 3);
    }

    #[test]
    fn test_row_out_of_range() {
        let config = SessionConfig::new(3, 2, 2, vec![0, 0, 1], 0).unwrap();
        assert_eq!(
            config.owner_of(3),
            Err(SessionError::InvalidRow { row: 3, max: 2 })
        );
    }

    #[test]
    fn test_bad_partitions_rejected() {
        assert!(SessionConfig::new(2, 2, 2, vec![0, 0], 0).is_err());
        assert!(SessionConfig::new(3, 2, 2, vec![0, 1, 2], 0).is_err());
        assert!(SessionConfig::new(3, 2, 2, vec![0, 0, 3], 0).is_err());
        assert!(SessionConfig::new(3, 2, 2, vec![0, 0], 0).is_err());
        assert!(SessionConfig::new(3, 2, 2, vec![0, 0, 1], 64).is_err());
        assert!(SessionConfig::new(3, 0, 2, vec![0, 0, 1], 0).is_err());
        let err = SessionConfig::new(4, 2, 4, vec![0, 0, 3, 2], 0).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPartition(_)));
    }

    #[test]
    fn test_pair_sweep_smallest() {
        let pairs: Vec<_> = pair_sweep(1).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_pair_sweep_shape() {
        let d = 5;
        let pairs: Vec<_> = pair_sweep(d).collect();
        assert_eq!(pairs.len(), d * (d + 1) / 2 + d);
        for &(i, j) in pairs.iter() {
            assert!(i <= d);
            assert!(j <= i);
            assert!(j < d);
        }
        // Row-major order.
        for w in pairs.windows(2) {
            assert!(w[0].0 < w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1));
        }
    }

    #[test]
    fn test_diagonal_pairs_have_one_owner() {
        let mut rng = AesRng::new();
        for _ in 0..20 {
            let config = random_config(&mut rng);
            for (i, j) in pair_sweep(config.num_features) {
                if i == j {
                    assert_eq!(config.owner_of(i), config.owner_of(j));
                }
            }
        }
    }
}
