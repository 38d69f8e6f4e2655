//! Stack driver: attach/detach lifecycle and per-session dispatch.

use std::{collections::HashMap, sync::Arc};

use msgstack_core::{ConfigError, MessageStack, MessageStore, StackConfig, StackError};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{OpenFlags, SessionHandle};

/// Identifier handed out for each open session.
pub type HandleId = Uuid;

/// Driver error.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("Handle not found: {0}")]
    NotFound(HandleId),
}

impl DriverError {
    /// The underlying stack error, if any.
    #[must_use]
    pub const fn stack_error(&self) -> Option<StackError> {
        match self {
            Self::Stack(e) => Some(*e),
            Self::NotFound(_) => None,
        }
    }
}

/// What `destroy` cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Sessions still open at detach, finalized with close semantics.
    pub sessions_closed: usize,
    /// Messages left in the store and freed.
    pub messages_freed: usize,
}

type SharedHandle<S> = Arc<Mutex<SessionHandle<S>>>;

/// Owner of the message store and of every open session.
///
/// Calls for different handles run concurrently; only the store's own
/// push/pop and the handle table lookups are serialized.
pub struct StackDriver<S: MessageStore = MessageStack> {
    store: Arc<S>,
    config: StackConfig,
    handles: RwLock<HashMap<HandleId, SharedHandle<S>>>,
}

impl StackDriver<MessageStack> {
    /// Attach the driver with a fresh, empty store.
    ///
    /// # Errors
    /// Returns error if the config limits are invalid.
    pub fn construct(config: StackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = MessageStack::with_capacity(config.capacity);
        Ok(Self::with_store(store, config))
    }
}

impl<S: MessageStore> StackDriver<S> {
    /// Attach the driver to a caller-provided store.
    #[must_use]
    pub fn with_store(store: S, config: StackConfig) -> Self {
        tracing::info!(
            capacity = store.capacity(),
            message_size = config.message_size,
            write_limit = config.write_limit,
            "Message stack constructed"
        );
        Self {
            store: Arc::new(store),
            config,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Number of committed messages in the store.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.store.depth()
    }

    /// Number of sessions currently open.
    pub async fn open_sessions(&self) -> usize {
        self.handles.read().await.len()
    }

    /// Open a new session.
    ///
    /// # Errors
    /// Returns error if the mode is invalid, the buffer cannot be allocated,
    /// or a consumer finds the store empty. No handle is created on error.
    pub async fn open(&self, flags: OpenFlags) -> Result<HandleId, DriverError> {
        let handle = SessionHandle::open(Arc::clone(&self.store), flags, &self.config)
            .inspect_err(|e| tracing::debug!(?flags, "Open failed: {e}"))?;
        let mode = handle.mode();

        let id = Uuid::new_v4();
        self.handles
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(handle)));

        tracing::debug!(%id, ?mode, "Session opened");
        Ok(id)
    }

    /// Write to a producing session.
    ///
    /// # Errors
    /// Returns error if the handle is unknown, not producing, or full.
    pub async fn write(&self, id: HandleId, data: &[u8]) -> Result<usize, DriverError> {
        let handle = self.get_handle(id).await?;
        let written = handle.lock().await.write(data)?;
        Ok(written)
    }

    /// Read from a consuming session. An empty result marks end of message.
    ///
    /// # Errors
    /// Returns error if the handle is unknown or not consuming.
    pub async fn read(&self, id: HandleId, max_len: usize) -> Result<Vec<u8>, DriverError> {
        let handle = self.get_handle(id).await?;
        let data = handle.lock().await.read(max_len)?;
        Ok(data)
    }

    /// Close a session, committing a producer's buffer.
    ///
    /// The handle is gone after this call even when the commit fails.
    ///
    /// # Errors
    /// Returns error if the handle is unknown, or
    /// [`StackError::CapacityExceeded`] if the commit push was rejected.
    pub async fn close(&self, id: HandleId) -> Result<(), DriverError> {
        let handle = self
            .handles
            .write()
            .await
            .remove(&id)
            .ok_or(DriverError::NotFound(id))?;

        let result = handle.lock().await.finish();
        tracing::debug!(%id, ok = result.is_ok(), "Session closed");
        result.map_err(DriverError::from)
    }

    /// Detach the driver, finalizing open sessions and freeing every
    /// message left in the store.
    pub async fn destroy(self) -> DrainReport {
        let handles = self.handles.into_inner();
        let sessions_closed = handles.len();
        for (id, handle) in handles {
            if let Err(e) = handle.lock().await.finish() {
                tracing::warn!(%id, "Session finalized at detach without commit: {e}");
            }
        }

        let messages_freed = self.store.drain_all().len();
        tracing::info!(sessions_closed, messages_freed, "Message stack destroyed");

        DrainReport {
            sessions_closed,
            messages_freed,
        }
    }

    async fn get_handle(&self, id: HandleId) -> Result<SharedHandle<S>, DriverError> {
        self.handles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DriverError::NotFound(id))
    }
}
