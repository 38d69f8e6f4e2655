//! Core building blocks for the bounded message stack.
//!
//! This crate provides:
//! - `Message` - Owned, size-bounded byte buffer
//! - `MessageStack` - Mutex-serialized LIFO store with a fixed capacity
//! - `StackConfig` - Capacity and buffer limits
//! - `MessageStore` trait and the `StackError` taxonomy

pub mod config;
pub mod message;
pub mod stack;
pub mod traits;

pub use config::{ConfigError, StackConfig};
pub use message::Message;
pub use stack::MessageStack;
pub use traits::{MessageStore, StackError};
