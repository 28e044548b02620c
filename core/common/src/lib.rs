//! Common utilities and types shared across Skylift crates.
//!
//! This module provides the shared error taxonomy and the remote-path
//! type used by the drive client, ensuring consistency across crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::RemotePath;
