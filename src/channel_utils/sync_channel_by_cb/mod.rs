//! Module about native channel of Rust. See [crossbeam].
//! This module provides a function to create the full in-process channel
//! mesh for the trusted initializer and the data parties.

use itertools::Itertools;
use scuttlebutt::SyncChannel;
pub mod crossbeam_wrapper;
use crossbeam_wrapper::cbch_pair;
pub use crossbeam_wrapper::{CrossbeamReceiver, CrossbeamSender};

type Channel = (usize, SyncChannel<CrossbeamReceiver, CrossbeamSender>);

/// Create a full mesh of crossbeam channels.
///
/// Party 0 is the trusted initializer. Returns its channels first, then one
/// vector of channels per data party; every vector is sorted by peer index.
pub fn create_crossbeam_channels(nparties: usize) -> (Vec<Channel>, Vec<Vec<Channel>>) {
    let mut channels = (0..nparties)
        .map(|_| (0..nparties).map(|_| None).collect_vec())
        .collect_vec();

    for i in 0..nparties {
        for j in i + 1..nparties {
            let (sr, rl) = cbch_pair();
            let (sl, rr) = cbch_pair();
            let left = SyncChannel::new(rl, sl);
            let right = SyncChannel::new(rr, sr);
            channels[i][j] = Some((j, left));
            channels[j][i] = Some((i, right));
        }
    }

    let mut channels = channels
        .into_iter()
        .map(|cs| cs.into_iter().flatten().collect_vec())
        .collect_vec();

    let ti_channels = channels.remove(0);

    (ti_channels, channels)
}
