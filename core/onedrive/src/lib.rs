//! OneDrive (Microsoft Graph) client for Skylift.
//!
//! This crate authenticates against the Microsoft identity platform with
//! a refresh token and talks to the Graph file-storage API: it acquires
//! bearer tokens, uploads files in sequential 20 MiB byte-range chunks
//! through provider-issued upload sessions, and lists drive-root children
//! with their download links.
//!
//! # Design Principles
//! - Explicit configuration: credentials are an immutable struct handed
//!   to the client at construction time, never module-level globals
//! - No hidden state: a fresh access token is fetched per operation and
//!   nothing survives a call
//! - Ordered uploads: chunk submission is strictly sequential, as the
//!   upload-session protocol requires

pub mod auth;
pub mod client;
pub mod config;
pub mod upload;

pub use client::{DriveItem, OneDriveClient, UploadOutcome};
pub use config::Credentials;
pub use upload::{ChunkSpan, ProgressHandler, CHUNK_SIZE};
