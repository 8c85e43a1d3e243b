//! # Secure linear-regression preprocessing
//!
//! This library implements the first phase of a multi-party secure linear
//! regression: computing additive secret shares in Z_{2^64} of the Gram
//! matrix `A = X^T X` and the cross vector `b = X^T y`, where the feature
//! rows of `X` and the target vector `y` are logically partitioned across
//! two or more non-colluding data parties. A trusted initializer (party 0)
//! deals Beaver-style correlated randomness and never sees private data.
//!
//! [gram_sharing] is the main module of this library.
#![warn(missing_docs)]

pub mod channel_utils;
pub mod cli_utils;
pub mod fixed_point;
pub mod gram_sharing;
pub mod input_utils;
pub mod session;
