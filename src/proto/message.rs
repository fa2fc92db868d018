//! Agent protocol message structures.

mod add_remove;
mod identity;
mod request;
mod response;

pub use self::add_remove::*;
pub use self::identity::*;
pub use self::request::*;
pub use self::response::*;
