//! CLI (CommandLine Interface) utilities for the Gram-share demo binary.
//!
//! Here, you can know the options for the sharing round through enum types
//! and structs. See [gram_sharing](crate::gram_sharing) for the actual
//! protocol; the demo picks one transport from [ChannelType] and runs the
//! whole round on it.

use clap::{Parser, ValueEnum};
use std::fmt::Display;

/// Channel types. Channels are used to communicate between parties. More
/// details: [channel_utils](crate::channel_utils).
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ChannelType {
    /// Unix domain socket. See [std::os::unix::net::UnixStream].
    Unix,
    /// TCP socket. See [std::net::TcpStream].
    Tcp,
    /// Native channel of Rust. See
    /// [sync_channel_by_cb](crate::channel_utils::sync_channel_by_cb).
    CrossBeam,
}

impl Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Unix => write!(f, "unix"),
            ChannelType::Tcp => write!(f, "tcp"),
            ChannelType::CrossBeam => write!(f, "crossbeam"),
        }
    }
}

/// Arguments for the Gram-share demo.
/// This struct implements [clap::Parser] to make that this binary has
/// CommandLine Arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct GramShareArgs {
    /// Number of parties including the trusted initializer.
    #[arg(short = 'N', long, default_value_t = 3)]
    pub num_parties: usize,

    /// Number of samples (rows of the data matrix).
    #[arg(short = 'n', long, default_value_t = 8)]
    pub samples: usize,

    /// Number of features (columns of the data matrix).
    #[arg(short = 'd', long, default_value_t = 4)]
    pub features: usize,

    /// Fixed-point precision in fractional bits.
    #[arg(short = 'p', long, default_value_t = 16)]
    pub precision: u32,

    /// Channel Types.
    #[arg(short = 'c', long = "channel", default_value_t = ChannelType::Unix)]
    pub channel_type: ChannelType,

    /// Port number for TCP channel.
    ///
    /// The port is used internally. No function to communicate externally is
    /// implemented. Sorry.
    #[arg(long = "port", default_value_t = 10000)]
    pub port: usize,

    /// Verbose mode.
    ///
    /// If specified, print the reconstructed matrix and per-party wait times.
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}
