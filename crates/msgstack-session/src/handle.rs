//! Per-open session handles.

use std::{fmt, sync::Arc};

use msgstack_core::{Message, MessageStore, StackConfig, StackError};

/// Raw access requested at open time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
}

impl OpenFlags {
    /// Read-only access.
    pub const READ: Self = Self {
        read: true,
        write: false,
    };
    /// Write-only access.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
    };
    /// Simultaneous read and write, which no handle supports.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
    };
}

/// Mode a handle is fixed to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Write-only; the buffer is committed to the store on close.
    Producing,
    /// Read-only; the buffer was popped from the store on open.
    Consuming,
}

impl TryFrom<OpenFlags> for AccessMode {
    type Error = StackError;

    fn try_from(flags: OpenFlags) -> Result<Self, Self::Error> {
        match (flags.read, flags.write) {
            (false, true) => Ok(Self::Producing),
            (true, false) => Ok(Self::Consuming),
            _ => Err(StackError::InvalidMode),
        }
    }
}

enum State {
    Producing(Message),
    Consuming(Message),
    Closed,
}

/// One open producer or consumer session.
///
/// The handle exclusively owns its buffer. A producer's buffer moves into
/// the store on close; a consumer's buffer was moved out of the store on
/// open and is dropped on close. Dropping a handle that was never closed
/// runs the same close semantics.
pub struct SessionHandle<S: MessageStore> {
    store: Arc<S>,
    state: State,
    cursor: usize,
    write_limit: usize,
}

impl<S: MessageStore> SessionHandle<S> {
    /// Open a session against `store`.
    ///
    /// # Errors
    /// - [`StackError::InvalidMode`] unless exactly one of read/write is requested.
    /// - [`StackError::NoMemory`] if the producer buffer cannot be allocated.
    /// - [`StackError::Empty`] if a consumer finds nothing to pop.
    /// - [`StackError::CapacityExceeded`] for a producer against a full store,
    ///   only when `reject_open_when_full` is set.
    pub fn open(store: Arc<S>, flags: OpenFlags, config: &StackConfig) -> Result<Self, StackError> {
        let state = match AccessMode::try_from(flags)? {
            AccessMode::Producing => {
                if config.reject_open_when_full && store.depth() >= store.capacity() {
                    return Err(StackError::CapacityExceeded);
                }
                State::Producing(Message::allocate(config.message_size)?)
            }
            AccessMode::Consuming => State::Consuming(store.pop()?),
        };

        Ok(Self {
            store,
            state,
            cursor: 0,
            // The write bound never reaches past the buffer.
            write_limit: config.write_limit.min(config.message_size),
        })
    }

    /// Mode of the handle, or `None` once closed.
    #[must_use]
    pub const fn mode(&self) -> Option<AccessMode> {
        match self.state {
            State::Producing(_) => Some(AccessMode::Producing),
            State::Consuming(_) => Some(AccessMode::Consuming),
            State::Closed => None,
        }
    }

    /// Byte offset into the buffer.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Copy `data` into the buffer at the cursor.
    ///
    /// Input past the write limit is silently dropped; the return value is
    /// the number of bytes actually copied.
    ///
    /// # Errors
    /// - [`StackError::InvalidMode`] if the handle is not producing.
    /// - [`StackError::BufferFull`] if the cursor already sits at the limit.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StackError> {
        let State::Producing(buf) = &mut self.state else {
            return Err(StackError::InvalidMode);
        };
        if self.cursor >= self.write_limit {
            return Err(StackError::BufferFull);
        }

        let count = buf.extend(&data[..data.len().min(self.write_limit - self.cursor)]);
        self.cursor += count;
        tracing::debug!(count, cursor = self.cursor, "wrote to session buffer");
        Ok(count)
    }

    /// Return up to `max_len` bytes from the cursor onwards.
    ///
    /// An empty result means the whole message has been read.
    ///
    /// # Errors
    /// Returns [`StackError::InvalidMode`] if the handle is not consuming.
    pub fn read(&mut self, max_len: usize) -> Result<Vec<u8>, StackError> {
        let State::Consuming(buf) = &self.state else {
            return Err(StackError::InvalidMode);
        };

        let remaining = buf.len() - self.cursor;
        if remaining == 0 {
            return Ok(Vec::new());
        }

        let count = max_len.min(remaining);
        let out = buf.as_bytes()[self.cursor..self.cursor + count].to_vec();
        self.cursor += count;
        tracing::debug!(count, cursor = self.cursor, "read from session buffer");
        Ok(out)
    }

    /// Close the session, committing a producer's buffer to the store.
    ///
    /// # Errors
    /// Returns [`StackError::CapacityExceeded`] if the store filled up since
    /// this producer was opened. The buffer is discarded in that case.
    pub fn close(mut self) -> Result<(), StackError> {
        self.finish()
    }

    /// Run close semantics in place and leave the handle inert.
    pub(crate) fn finish(&mut self) -> Result<(), StackError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Producing(buf) => {
                let len = buf.len();
                self.store.push(buf).inspect_err(|e| {
                    tracing::warn!(len, "Discarding message on close: {e}");
                })?;
                tracing::debug!(len, depth = self.store.depth(), "committed message");
                Ok(())
            }
            State::Consuming(buf) => {
                tracing::debug!(len = buf.len(), "released consumed message");
                Ok(())
            }
            State::Closed => Ok(()),
        }
    }
}

impl<S: MessageStore> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        if !matches!(self.state, State::Closed) {
            tracing::debug!(mode = ?self.mode(), "finalizing abandoned session");
            let _ = self.finish();
        }
    }
}

impl<S: MessageStore> fmt::Debug for SessionHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("mode", &self.mode())
            .field("cursor", &self.cursor)
            .field("write_limit", &self.write_limit)
            .finish_non_exhaustive()
    }
}
