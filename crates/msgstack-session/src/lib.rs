//! Session handles and dispatch for the message stack.
//!
//! Provides:
//! - `SessionHandle` - One producer or consumer interaction with the store
//! - `StackDriver` - Attach/detach lifecycle plus open/write/read/close by handle id

pub mod driver;
pub mod handle;

pub use driver::{DrainReport, DriverError, HandleId, StackDriver};
pub use handle::{AccessMode, OpenFlags, SessionHandle};
