//! Owned message buffers.

use crate::StackError;

/// Owned byte buffer holding one message.
///
/// The payload is always followed by a single zero terminator byte, so a
/// buffer allocated for `size` payload bytes occupies `size + 1` bytes.
/// Zero bytes inside the payload are kept as data.
#[derive(Debug, PartialEq, Eq)]
pub struct Message {
    buf: Vec<u8>,
    size: usize,
}

impl Message {
    /// Allocate an empty message with room for `size` payload bytes.
    ///
    /// # Errors
    /// Returns [`StackError::NoMemory`] if the allocation fails.
    pub fn allocate(size: usize) -> Result<Self, StackError> {
        let total = size.checked_add(1).ok_or(StackError::NoMemory)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(total)
            .map_err(|_| StackError::NoMemory)?;
        buf.push(0);
        Ok(Self { buf, size })
    }

    /// Build a message from a payload, truncated to `limit` bytes.
    ///
    /// # Errors
    /// Returns [`StackError::NoMemory`] if the allocation fails.
    pub fn from_payload(payload: &[u8], limit: usize) -> Result<Self, StackError> {
        let mut msg = Self::allocate(limit)?;
        msg.extend(payload);
        Ok(msg)
    }

    /// Append bytes to the payload, moving the terminator behind them.
    ///
    /// Bytes past the allocated size are dropped. Returns how many were kept.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.remaining());
        self.buf.pop();
        self.buf.extend_from_slice(&data[..count]);
        self.buf.push(0);
        count
    }

    /// Payload bytes that still fit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.size - self.len()
    }

    /// Maximum payload length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Payload bytes, without the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len().saturating_sub(1)
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_empty_and_terminated() {
        let msg = Message::allocate(20).unwrap();
        assert!(msg.is_empty());
        assert_eq!(msg.buf, vec![0]);
        assert!(msg.buf.capacity() >= 21);
    }

    #[test]
    fn test_extend_keeps_terminator_last() {
        let mut msg = Message::allocate(20).unwrap();
        msg.extend(b"he");
        msg.extend(b"llo");
        assert_eq!(msg.as_bytes(), b"hello");
        assert_eq!(msg.buf.last(), Some(&0));
        assert_eq!(msg.len(), 5);
    }

    #[test]
    fn test_from_payload_truncates() {
        let msg = Message::from_payload(b"abcdefghijkl", 10).unwrap();
        assert_eq!(msg.as_bytes(), b"abcdefghij");
    }

    #[test]
    fn test_extend_stops_at_size() {
        let mut msg = Message::allocate(4).unwrap();
        assert_eq!(msg.extend(b"abc"), 3);
        assert_eq!(msg.extend(b"defg"), 1);
        assert_eq!(msg.extend(b"h"), 0);
        assert_eq!(msg.as_bytes(), b"abcd");
        assert_eq!(msg.remaining(), 0);
        assert_eq!(msg.buf.len(), 5);
    }

    #[test]
    fn test_embedded_zero_is_payload() {
        let msg = Message::from_payload(b"a\0b", 20).unwrap();
        assert_eq!(msg.len(), 3);
        assert_eq!(msg.as_bytes(), b"a\0b");
    }

    #[test]
    fn test_allocate_overflow_is_no_memory() {
        assert_eq!(Message::allocate(usize::MAX), Err(StackError::NoMemory));
    }
}
