#![doc = include_str!("../README.md")]
#![deny(missing_debug_implementations)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod crypto;
pub mod encoding;
pub mod key;
pub mod pem;
pub mod proto;

#[cfg(unix)]
pub mod agent;
pub mod blocking;
#[cfg(all(unix, feature = "async-client"))]
pub mod client;
#[cfg(feature = "codec")]
pub mod codec;
pub mod error;

// re-export dependencies that are used in the public API of our crate
pub use secrecy;
pub use ssh_encoding;
