//! SSH agent protocol structures

pub mod error;
pub mod message;

pub use self::error::{ProtoError, ProtoResult};
pub use self::message::*;
