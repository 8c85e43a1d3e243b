//! Additive secret sharing of the Gram matrix and cross vector.
//!
//! The round jointly computes, for every ordered pair of Gram rows `(i, j)`
//! with `j <= i`, additive shares in Z_{2^64} of the inner product of the
//! two rows. Rows below `d` are feature rows of the sample matrix; the
//! synthetic row `d` is the target vector, so row pairs `(d, j)` produce the
//! cross vector `X^T y` and the rest produce the lower triangle of
//! `X^T X`.
//!
//! Three kinds of participants walk the same pair sequence:
//!
//! - the [TrustedInitializer] (party 0) deals one fresh multiplicative
//!   triple per pair whose two rows have different owners, and learns
//!   nothing else;
//! - the owner of both rows of a same-owner pair computes the inner product
//!   locally, without any message;
//! - the two owners of a cross-owner pair run one blinded exchange, with
//!   the owner of `j` sending first and the owner of `i` replying, so the
//!   round cannot deadlock regardless of scheduling skew.
//!
//! Each [DataParty] ends the sweep holding its [GramShares]; summing all
//! parties' buffers modulo 2^64 recovers the fixed-point Gram matrix and
//! cross vector. Neither party of an exchange learns anything about the
//! other's row: each sees only a row masked by half of the dealt triple.

use crate::channel_utils::{read_msg, write_msg, Msg};
use crate::fixed_point;
use crate::session::{pair_sweep, PartyId, SessionConfig};
use anyhow::{bail, Context, Result};
use rand::{CryptoRng, Rng};
use scuttlebutt::AbstractChannel;
use std::time::{Duration, Instant};
use thiserror::Error;

mod bin;
pub use bin::run;

/// Protocol-level errors raised during the sweep.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A received vector disagrees with the sample count.
    #[error("message vector has length {got}, expected {expected}")]
    DimensionMismatch {
        /// Received vector length.
        got: usize,
        /// Expected vector length.
        expected: usize,
    },
    /// No channel is connected to the party.
    #[error("no channel to party {0}")]
    UnknownPeer(PartyId),
}

// Inner product in Z_{2^64}.
fn inner_prod(x: &[u64], y: &[u64]) -> u64 {
    x.iter()
        .zip(y.iter())
        .fold(0u64, |acc, (&a, &b)| acc.wrapping_add(a.wrapping_mul(b)))
}

fn channel_to<C: AbstractChannel>(
    channels: &mut [(PartyId, C)],
    peer: PartyId,
) -> Result<&mut C> {
    match channels.iter_mut().find(|(p, _)| *p == peer) {
        Some((_, c)) => Ok(c),
        None => bail!(ProtocolError::UnknownPeer(peer)),
    }
}

fn check_len(msg: &Msg, expected: usize) -> Result<()> {
    if msg.vector.len() != expected {
        bail!(ProtocolError::DimensionMismatch {
            got: msg.vector.len(),
            expected,
        });
    }
    Ok(())
}

/// Dense lower-triangular index of the Gram entry `(i, j)`, `j <= i < d`.
pub fn tri_idx(i: usize, j: usize) -> usize {
    i * (i + 1) / 2 + j
}

/// One party's additive shares of the Gram matrix and cross vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GramShares {
    /// Lower-triangular Gram shares of length `d * (d + 1) / 2`, addressed
    /// by [tri_idx].
    pub share_a: Vec<u64>,
    /// Cross-vector shares of length `d`.
    pub share_b: Vec<u64>,
}

impl GramShares {
    fn empty(num_features: usize) -> Self {
        Self {
            share_a: vec![0; num_features * (num_features + 1) / 2],
            share_b: vec![0; num_features],
        }
    }

    // Pairs with i == d land in the cross vector, the rest in the triangle.
    fn record(&mut self, i: usize, j: usize, share: u64) {
        if i < self.share_b.len() {
            self.share_a[tri_idx(i, j)] = share;
        } else {
            self.share_b[j] = share;
        }
    }
}

/// Wrapping sum of every party's share buffers.
///
/// Recovering the plaintext defeats the secret sharing, so this belongs in
/// demos and tests where all shares already sit in one process, never in a
/// deployed initializer.
pub fn reconstruct(shares: &[GramShares]) -> (Vec<u64>, Vec<u64>) {
    let mut gram = Vec::new();
    let mut cross = Vec::new();
    for s in shares.iter() {
        if gram.is_empty() {
            gram = vec![0; s.share_a.len()];
            cross = vec![0; s.share_b.len()];
        }
        for (acc, w) in gram.iter_mut().zip(s.share_a.iter()) {
            *acc = acc.wrapping_add(*w);
        }
        for (acc, w) in cross.iter_mut().zip(s.share_b.iter()) {
            *acc = acc.wrapping_add(*w);
        }
    }
    (gram, cross)
}

/// Party 0. Deals Beaver-style correlated randomness to the two owners of
/// every cross-owner pair and retains nothing between pairs.
pub struct TrustedInitializer {
    config: SessionConfig,
}

impl TrustedInitializer {
    /// Validate the configuration and build the initializer.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        Ok(Self { config })
    }

    /// Deal one triple per cross-owner pair, in sweep order.
    ///
    /// For each such pair, fresh uniform vectors `x`, `y` and a scalar `r`
    /// are drawn; the owner of `i` receives `(y, xy - r)` and the owner of
    /// `j` receives `(x, r)`, in that fixed order.
    pub fn run<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &self,
        channels: &mut [(PartyId, C)],
        rng: &mut RNG,
    ) -> Result<()> {
        let n = self.config.num_samples;
        let mut x = vec![0u64; n];
        let mut y = vec![0u64; n];

        for (i, j) in pair_sweep(self.config.num_features) {
            let party_a = self
                .config
                .owner_of(i)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let party_b = self
                .config
                .owner_of(j)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            // A same-owner pair is computed locally by its owner.
            if party_a == party_b {
                continue;
            }

            rng.fill(&mut x[..]);
            rng.fill(&mut y[..]);
            let r: u64 = rng.gen();
            let xy = inner_prod(&x, &y);

            let msg_a = Msg {
                vector: y.clone(),
                value: xy.wrapping_sub(r),
            };
            write_msg(channel_to(channels, party_a)?, &msg_a).with_context(|| {
                format!("Could not send message to party A ({}) for pair ({}, {})", party_a, i, j)
            })?;

            let msg_b = Msg {
                vector: x.clone(),
                value: r,
            };
            write_msg(channel_to(channels, party_b)?, &msg_b).with_context(|| {
                format!("Could not send message to party B ({}) for pair ({}, {})", party_b, i, j)
            })?;
        }

        Ok(())
    }
}

/// One data party. Holds the full rescaled inputs; ownership of Gram rows
/// is logical, deciding which operand this party supplies per pair.
pub struct DataParty {
    id: PartyId,
    config: SessionConfig,
    features: Vec<Vec<u64>>,
    target: Vec<u64>,
}

impl DataParty {
    /// Check the inputs against the configuration, then rescale and
    /// transpose them into the feature rows the sweep walks.
    pub fn new(
        id: PartyId,
        config: SessionConfig,
        data: &[Vec<f64>],
        target: &[f64],
    ) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        if id == 0 || id >= config.num_parties {
            bail!(
                "party id must be in 1..{} (now {})",
                config.num_parties,
                id
            );
        }
        if data.len() != config.num_samples
            || data.iter().any(|row| row.len() != config.num_features)
            || target.len() != config.num_samples
        {
            bail!(
                "input dimensions invalid: ({}, {}) data, {} target; expected ({}, {})",
                data.len(),
                data.first().map_or(0, Vec::len),
                target.len(),
                config.num_samples,
                config.num_features
            );
        }

        let features = fixed_point::encode_features(data, config.precision);
        let target = fixed_point::encode_target(target, config.precision, config.num_features);

        Ok(Self {
            id,
            config,
            features,
            target,
        })
    }

    fn row(&self, r: usize) -> &[u64] {
        if r < self.config.num_features {
            &self.features[r]
        } else {
            &self.target
        }
    }

    /// Run the full pair sweep against the other parties.
    ///
    /// Returns this party's share buffers and the total wall time spent
    /// blocked on peer receives (waits on the initializer are not counted).
    /// On any failure the round aborts and no partial shares escape.
    pub fn run<C: AbstractChannel>(
        self,
        channels: &mut [(PartyId, C)],
    ) -> Result<(GramShares, Duration)> {
        let mut shares = GramShares::empty(self.config.num_features);
        let mut peer_wait = Duration::ZERO;

        for (i, j) in pair_sweep(self.config.num_features) {
            let owner_i = self
                .config
                .owner_of(i)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let owner_j = self
                .config
                .owner_of(j)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;

            // Pairs not involving this party cost no work and no I/O.
            if owner_i != self.id && owner_j != self.id {
                continue;
            }

            let share = if owner_i == owner_j {
                inner_prod(self.row(i), self.row(j))
            } else {
                // One triple message from the initializer precedes every
                // cross-owner exchange.
                let m_ti = read_msg(channel_to(channels, 0)?).with_context(|| {
                    format!("Could not receive message from TI for pair ({}, {})", i, j)
                })?;
                check_len(&m_ti, self.config.num_samples)?;

                if owner_i == self.id {
                    self.exchange_as_a(channels, owner_j, i, &m_ti, &mut peer_wait)?
                } else {
                    self.exchange_as_b(channels, owner_i, j, &m_ti, &mut peer_wait)?
                }
            };

            shares.record(i, j, share);
        }

        Ok((shares, peer_wait))
    }

    // Owner of row i. The triple message carries (y, xy - r). Receive the
    // peer's blinded row, reply with ours, then
    // share = <b + x, y> - (xy - r).
    fn exchange_as_a<C: AbstractChannel>(
        &self,
        channels: &mut [(PartyId, C)],
        peer: PartyId,
        i: usize,
        m_ti: &Msg,
        peer_wait: &mut Duration,
    ) -> Result<u64> {
        let channel = channel_to(channels, peer)?;

        let start = Instant::now();
        let m_peer = read_msg(channel)
            .with_context(|| format!("Could not receive message from party B ({})", peer))?;
        *peer_wait += start.elapsed();
        check_len(&m_peer, self.config.num_samples)?;

        let blinded = self
            .row(i)
            .iter()
            .zip(m_ti.vector.iter())
            .map(|(&a, &y)| a.wrapping_sub(y))
            .collect::<Vec<_>>();
        write_msg(
            channel,
            &Msg {
                vector: blinded,
                value: 0,
            },
        )
        .with_context(|| format!("Could not send message to party B ({})", peer))?;

        Ok(inner_prod(&m_peer.vector, &m_ti.vector).wrapping_sub(m_ti.value))
    }

    // Owner of row j. The triple message carries (x, r). Send our blinded
    // row first, then receive the reply; share = <a - y, b> - r.
    fn exchange_as_b<C: AbstractChannel>(
        &self,
        channels: &mut [(PartyId, C)],
        peer: PartyId,
        j: usize,
        m_ti: &Msg,
        peer_wait: &mut Duration,
    ) -> Result<u64> {
        let channel = channel_to(channels, peer)?;

        let blinded = self
            .row(j)
            .iter()
            .zip(m_ti.vector.iter())
            .map(|(&b, &x)| b.wrapping_add(x))
            .collect::<Vec<_>>();
        write_msg(
            channel,
            &Msg {
                vector: blinded,
                value: 0,
            },
        )
        .with_context(|| format!("Could not send message to party A ({})", peer))?;

        let start = Instant::now();
        let m_peer = read_msg(channel)
            .with_context(|| format!("Could not receive message from party A ({})", peer))?;
        *peer_wait += start.elapsed();
        check_len(&m_peer, self.config.num_samples)?;

        Ok(inner_prod(&m_peer.vector, self.row(j)).wrapping_sub(m_ti.value))
    }
}
