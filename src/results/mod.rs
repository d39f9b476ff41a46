//! Result types shared by every engine
//!
//! This module defines the normalized result record and the response envelope.

mod types;

pub use types::*;
