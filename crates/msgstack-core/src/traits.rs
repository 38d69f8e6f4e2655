//! Core trait for message storage and the shared error taxonomy.

use thiserror::Error;

use crate::Message;

/// Errors raised by the store and by session handles.
///
/// Every error is local to the failing call: neither the store nor the
/// handle is mutated on the error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("Invalid access mode for this operation")]
    InvalidMode,
    #[error("Out of memory allocating message buffer")]
    NoMemory,
    #[error("Message stack is full")]
    CapacityExceeded,
    #[error("Message stack is empty")]
    Empty,
    #[error("Message buffer is full")]
    BufferFull,
}

/// Trait for message store backends.
///
/// Each operation is atomic with respect to the others: concurrent
/// callers observe a single total order of pushes and pops.
pub trait MessageStore: Send + Sync {
    /// Push a message onto the top of the store.
    ///
    /// # Errors
    /// Returns [`StackError::CapacityExceeded`] if the store is full. The
    /// message is dropped and the store is left unchanged.
    fn push(&self, msg: Message) -> Result<(), StackError>;

    /// Remove and return the most recently pushed message.
    ///
    /// # Errors
    /// Returns [`StackError::Empty`] if there is nothing to pop.
    fn pop(&self) -> Result<Message, StackError>;

    /// Empty the store, handing back everything it held.
    fn drain_all(&self) -> Vec<Message>;

    /// Current number of stored messages.
    fn depth(&self) -> usize;

    /// Maximum number of messages the store accepts.
    fn capacity(&self) -> usize;
}
