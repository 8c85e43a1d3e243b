//! Channel utilities. Channels are used to communicate between parties.
//!
//! Every protocol message has the single shape [Msg] and travels as one
//! length-prefixed frame: the payload length in a machine word, then the
//! vector words, then the trailing scalar.
//!
//! # Example
//!
//! ```
//! use preprocessing_linreg_with_ti::channel_utils::{read_msg, write_msg, Msg};
//! use scuttlebutt::Channel;
//! use std::io::{BufReader, BufWriter};
//! use std::os::unix::net::UnixStream;
//! use anyhow::Result;
//!
//! # fn try_main() -> Result<()> {
//! let (left, right) = UnixStream::pair()?;
//!
//! let handle = std::thread::spawn(move || -> Result<()> {
//!     let reader = BufReader::new(left.try_clone()?);
//!     let writer = BufWriter::new(left);
//!     let mut channel = Channel::new(reader, writer);
//!
//!     let msg = Msg {
//!         vector: vec![1, 2, 3],
//!         value: 42,
//!     };
//!     write_msg(&mut channel, &msg)?;
//!
//!     Ok(())
//! });
//!
//! let reader = BufReader::new(right.try_clone()?);
//! let writer = BufWriter::new(right);
//! let mut channel = Channel::new(reader, writer);
//!
//! let msg = read_msg(&mut channel)?;
//!
//! assert_eq!(msg.vector, vec![1, 2, 3]);
//! assert_eq!(msg.value, 42);
//!
//! handle.join().unwrap()?;
//! # Ok(())
//! # }
//! # fn main() {
//! #    try_main().unwrap();
//! # }
//! ```
//!
//! For more information, the document of [scuttlebutt::AbstractChannel] will help you.

use anyhow::{bail, Context, Result};
use scuttlebutt::AbstractChannel;
use thiserror::Error;

pub mod sync_channel;
pub mod sync_channel_by_cb;
pub mod tcp_channel;

/// The one message shape used for all wire traffic in the sharing round.
///
/// The meaning of both fields depends on the sender and the receiver's role;
/// see [gram_sharing](crate::gram_sharing).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msg {
    /// Ordered 64-bit words; a random or blinded vector of sample length.
    pub vector: Vec<u64>,
    /// One 64-bit word; a triple share or zero.
    pub value: u64,
}

/// A frame that cannot be decoded into a [Msg].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The length prefix does not describe a whole number of words plus the
    /// trailing value.
    #[error("bad frame length {0}")]
    BadLength(usize),
    /// The frame decodes to an empty vector.
    #[error("empty vector in frame")]
    EmptyVector,
}

/// Write `msg` to the channel as one length-prefixed frame.
///
/// Returns the payload length in bytes.
pub fn write_msg<C: AbstractChannel>(channel: &mut C, msg: &Msg) -> Result<usize> {
    let mut bytes = Vec::with_capacity(8 * (msg.vector.len() + 1));
    for w in msg.vector.iter() {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    bytes.extend_from_slice(&msg.value.to_le_bytes());

    let len = bytes.len();

    channel
        .write_usize(len)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    channel
        .write_bytes(&bytes)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    channel
        .flush()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    // Zero-length read pairing this send with the peer's matching receive.
    let mut ack = [0u8; 0];
    channel
        .read_bytes(&mut ack)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok(len)
}

/// Read one framed message from the channel.
pub fn read_msg<C: AbstractChannel>(channel: &mut C) -> Result<Msg> {
    let len = channel
        .read_usize()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    // The payload is at least one vector word plus the trailing value.
    if len % 8 != 0 {
        bail!(FrameError::BadLength(len));
    }
    if len < 16 {
        bail!(FrameError::EmptyVector);
    }

    let mut bytes = vec![0u8; len];
    channel
        .read_bytes(&mut bytes)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    let vector = bytes[..len - 8]
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect::<Vec<_>>();
    let value = u64::from_le_bytes(bytes[len - 8..].try_into().unwrap());

    Ok(Msg { vector, value })
}
