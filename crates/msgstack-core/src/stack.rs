//! Bounded LIFO message store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Message, MessageStore, StackError, config::DEFAULT_CAPACITY};

/// In-memory message stack with a fixed capacity.
///
/// All operations run under one mutex, so `push`, `pop` and `drain_all`
/// never interleave. A poisoned lock is recovered: each operation is a
/// single `Vec` call that cannot leave the stack half-updated.
pub struct MessageStack {
    messages: Mutex<Vec<Message>>,
    capacity: usize,
}

impl Default for MessageStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStack {
    /// Create a stack with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a stack holding at most `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageStore for MessageStack {
    fn push(&self, msg: Message) -> Result<(), StackError> {
        let mut messages = self.lock();
        if messages.len() >= self.capacity {
            return Err(StackError::CapacityExceeded);
        }
        messages.push(msg);
        tracing::trace!(depth = messages.len(), "pushed message");
        Ok(())
    }

    fn pop(&self) -> Result<Message, StackError> {
        let mut messages = self.lock();
        let msg = messages.pop().ok_or(StackError::Empty)?;
        tracing::trace!(depth = messages.len(), "popped message");
        Ok(msg)
    }

    fn drain_all(&self) -> Vec<Message> {
        let drained = std::mem::take(&mut *self.lock());
        tracing::trace!(count = drained.len(), "drained stack");
        drained
    }

    fn depth(&self) -> usize {
        self.lock().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn msg(text: &str) -> Message {
        Message::from_payload(text.as_bytes(), 20).unwrap()
    }

    #[test]
    fn test_pop_is_lifo() {
        let stack = MessageStack::new();
        assert_ok!(stack.push(msg("hello")));
        assert_ok!(stack.push(msg("world")));

        assert_eq!(stack.pop().unwrap().as_bytes(), b"world");
        assert_eq!(stack.pop().unwrap().as_bytes(), b"hello");
        assert_eq!(stack.pop(), Err(StackError::Empty));
    }

    #[test]
    fn test_push_rejects_when_full() {
        let stack = MessageStack::new();
        for i in 0..10 {
            assert_ok!(stack.push(msg(&i.to_string())));
        }
        let err = assert_err!(stack.push(msg("overflow")));
        assert_eq!(err, StackError::CapacityExceeded);
        assert_eq!(stack.depth(), 10);

        // The rejected push left the top untouched.
        assert_eq!(stack.pop().unwrap().as_bytes(), b"9");
    }

    #[test]
    fn test_pop_empty_leaves_stack_usable() {
        let stack = MessageStack::with_capacity(2);
        assert_eq!(stack.pop(), Err(StackError::Empty));
        assert_ok!(stack.push(msg("a")));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_drain_all_empties() {
        let stack = MessageStack::new();
        for text in ["a", "b", "c"] {
            assert_ok!(stack.push(msg(text)));
        }
        let drained = stack.drain_all();
        assert_eq!(drained.len(), 3);
        assert_eq!(stack.depth(), 0);
        assert!(stack.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_pushes_never_exceed_capacity() {
        let stack = Arc::new(MessageStack::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let stack = Arc::clone(&stack);
                thread::spawn(move || stack.push(msg(&i.to_string())).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 10);
        assert_eq!(stack.depth(), 10);
    }
}
