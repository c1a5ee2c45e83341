#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

//! Checks whether an HLS stream URL is reachable, well-formed and playable.
//!
//! The pipeline runs [`header::inspect`] as a cheap gate, then
//! [`playlist::resolve`] and finally [`timing::measure`]. [`ChannelValidator`]
//! wires the three together and is the entry point most callers want.

pub mod channel;
pub mod config;
pub mod error;
pub mod header;
pub mod http;
pub mod playlist;
pub mod server;
pub mod timing;

pub use channel::{ChannelValidator, ValidationInfo, ValidationResult};
pub use config::ValidatorConfig;
pub use error::ResolveError;
pub use header::HeaderInfo;
pub use playlist::PlaylistInfo;
