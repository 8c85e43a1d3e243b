//! Module about unix domain socket channel. See [UnixStream].
//! This module provides a function to create the full channel mesh for the
//! trusted initializer and the data parties.

use anyhow::{Context, Result};
use itertools::Itertools;
use scuttlebutt::SyncChannel;
use std::{
    io::{BufReader, BufWriter},
    os::unix::net::UnixStream,
};

type Channel = (
    usize,
    SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>,
);

/// Create a full mesh of unix domain socket channels. See [UnixStream].
///
/// Party 0 is the trusted initializer. Returns its channels first, then one
/// vector of channels per data party; every vector is sorted by peer index.
pub fn create_unix_channels(nparties: usize) -> Result<(Vec<Channel>, Vec<Vec<Channel>>)> {
    let mut channels = (0..nparties)
        .map(|_| (0..nparties).map(|_| None).collect_vec())
        .collect_vec();

    for i in 0..nparties {
        for j in i + 1..nparties {
            let (s, r) = UnixStream::pair().with_context(|| format!("@{}:{}", file!(), line!()))?;
            let rs = s
                .try_clone()
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let rr = r
                .try_clone()
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let left = SyncChannel::new(BufReader::new(rs), BufWriter::new(s));
            let right = SyncChannel::new(BufReader::new(rr), BufWriter::new(r));
            channels[i][j] = Some((j, left));
            channels[j][i] = Some((i, right));
        }
    }

    let mut channels = channels
        .into_iter()
        .map(|cs| cs.into_iter().flatten().collect_vec())
        .collect_vec();

    let ti_channels = channels.remove(0);

    Ok((ti_channels, channels))
}
