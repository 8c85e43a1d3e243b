//! Module about tcp channel. See [TcpStream].
//! This module provides functions to create the full channel mesh for the
//! trusted initializer and the data parties over loopback TCP.

use anyhow::{bail, Context, Result};
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::sleep;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

type Channel = (
    usize,
    SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>,
);

fn create_tcp_channel_for_party(
    nparties: usize,
    base_port: usize,
    me: usize,
) -> Result<Vec<Channel>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], (base_port + me) as _));
    let listener = TcpListener::bind(addr)
        .with_context(|| format!("me={} addr={} @{}:{}", me, addr, file!(), line!()))?;

    sleep(Duration::from_millis(100 * me as u64));

    // Dial every lower index, exchange party ids, then accept the rest.
    let mut streams = (0..me)
        .map(|i| {
            let port = base_port + i;
            let addr = SocketAddr::from(([127, 0, 0, 1], port as _));
            let mut stream = TcpStream::connect_timeout(&addr, TIMEOUT)
                .with_context(|| format!("me={} addr={} @{}:{}", me, addr, file!(), line!()))?;
            stream
                .write_all(&me.to_be_bytes())
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let mut buf = [0u8; 8];
            stream
                .read_exact(&mut buf)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let peer = usize::from_be_bytes(buf);
            Ok((peer, stream))
        })
        .collect::<Result<Vec<(usize, TcpStream)>>>()?;

    let accepted = listener
        .incoming()
        .take(nparties - 1 - me)
        .map(|s| {
            let mut s = s.with_context(|| format!("@{}:{}", file!(), line!()))?;
            let mut buf = [0u8; 8];
            s.read_exact(&mut buf)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let peer = usize::from_be_bytes(buf);
            s.write_all(&me.to_be_bytes())
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            Ok((peer, s))
        })
        .collect::<Result<Vec<_>>>()?;

    streams.extend(accepted);

    streams.sort_by(|a, b| a.0.cmp(&b.0));

    let res = streams
        .into_iter()
        .map(|(peer, s)| {
            let ss = s
                .try_clone()
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            Ok((peer, SyncChannel::new(BufReader::new(ss), BufWriter::new(s))))
        })
        .collect::<Result<Vec<Channel>>>()?;

    Ok(res)
}

/// Return a vector of channels for one data party.
pub fn create_tcp_channels_for_party(
    nparties: usize,
    port: usize,
    me: usize,
) -> Result<Vec<Channel>> {
    if me == 0 {
        bail!("me must be > 0 (now me = {})", 0);
    }

    let res = create_tcp_channel_for_party(nparties, port, me)?;

    Ok(res)
}

/// Return a vector of channels for the trusted initializer.
pub fn create_tcp_channels_for_ti(nparties: usize, port: usize) -> Result<Vec<Channel>> {
    let res = create_tcp_channel_for_party(nparties, port, 0)?;

    Ok(res)
}

/// Create a full mesh of tcp stream channels. See [TcpStream].
///
/// Party 0 is the trusted initializer. Returns its channels first, then one
/// vector of channels per data party; every vector is sorted by peer index.
pub fn create_tcp_channels(
    nparties: usize,
    port: usize,
) -> Result<(Vec<Channel>, Vec<Vec<Channel>>)> {
    let ti_handle = std::thread::spawn(move || create_tcp_channels_for_ti(nparties, port));

    let handles = (1..nparties)
        .map(|me| std::thread::spawn(move || create_tcp_channel_for_party(nparties, port, me)))
        .collect::<Vec<_>>();

    let ti_channels = ti_handle.join().unwrap()?;
    let channels = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect::<Result<Vec<Vec<Channel>>>>()?;

    Ok((ti_channels, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::AbstractChannel;

    #[test]
    fn test_2party() {
        let nparties = 2;

        let handle = std::thread::spawn(move || {
            let mut channels = create_tcp_channels_for_party(nparties, 10100, 1).unwrap();
            let channel = &mut channels[0].1;

            let m = channel.read_usize().unwrap();
            assert_eq!(m, 1);

            channel.write_usize(0).unwrap();
            channel.flush().unwrap();
        });

        let mut channels = create_tcp_channels_for_ti(nparties, 10100).unwrap();

        let channel = &mut channels[0].1;

        channel.write_usize(1).unwrap();
        channel.flush().unwrap();

        let m = channel.read_usize().unwrap();
        assert_eq!(m, 0);

        handle.join().unwrap();
    }

    fn test_nparty(nparties: usize, base_port: usize) {
        let handles = (1..nparties)
            .map(|me| {
                std::thread::spawn(move || {
                    let mut channels =
                        create_tcp_channels_for_party(nparties, base_port, me).unwrap();

                    for (i, c) in channels.iter_mut() {
                        let i = *i;
                        if i < me {
                            c.write_usize(me).unwrap();
                            c.flush().unwrap();
                            let m = c.read_usize().unwrap();
                            assert_eq!(m, i);
                        } else if i > me {
                            let m = c.read_usize().unwrap();
                            assert_eq!(m, i);
                            c.write_usize(me).unwrap();
                            c.flush().unwrap();
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        let mut channels = create_tcp_channels_for_ti(nparties, base_port).unwrap();

        for (i, c) in channels.iter_mut() {
            let i = *i;
            let m = c.read_usize().unwrap();
            assert_eq!(m, i);
            c.write_usize(0).unwrap();
            c.flush().unwrap();
        }

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_3party() {
        test_nparty(3, 5100);
    }

    #[test]
    fn test_4party() {
        test_nparty(4, 15100);
    }
}
