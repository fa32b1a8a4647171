// Queue contract and in-memory queue

use crate::health::{HealthCheck, HealthStatus};
use crate::storage_error;
use crate::types::*;
use crate::utils::StringValidator;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Largest message, in bytes, a queue accepts
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// A named message queue
#[async_trait]
pub trait Queue: HealthCheck {
    fn name(&self) -> &str;

    /// Create the queue unless it exists, then connect to it.
    ///
    /// Returns `true` only when this call created the queue.
    async fn create_if_absent(&self) -> NexusResult<bool>;

    /// Enqueue a message, optionally invisible to consumers until `visibility_delay` has passed
    async fn add_message(&self, message: &str, visibility_delay: Option<Duration>) -> NexusResult<()>;

    /// Remove every message
    async fn clear(&self) -> NexusResult<()>;
}

/// Queue of typed items, stored as JSON text in an underlying [`Queue`]
pub struct TypedQueue<T> {
    inner: Arc<dyn Queue>,
    _item: PhantomData<fn(T)>,
}

impl<T> TypedQueue<T> {
    pub fn new(inner: Arc<dyn Queue>) -> Self {
        Self {
            inner,
            _item: PhantomData,
        }
    }

    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.inner
    }
}

impl<T: Serialize> TypedQueue<T> {
    pub async fn add(&self, item: &T, visibility_delay: Option<Duration>) -> NexusResult<()> {
        let message = serde_json::to_string(item)?;
        self.inner.add_message(&message, visibility_delay).await
    }
}

impl<T: DeserializeOwned> TypedQueue<T> {
    /// Decode a message previously written by `add`
    pub fn decode(&self, message: &str) -> NexusResult<T> {
        serde_json::from_str(message).map_err(|e| {
            NexusError::parse_error(
                format!("queue '{}' holds a message that is not a valid item: {}", self.inner.name(), e),
                None,
                Some(e),
                Some(concat!(file!(), ":", line!())),
            )
        })
    }
}

struct QueuedMessage {
    content: String,
    visible_at: Instant,
}

/// In-process [`Queue`]. It must be created before messages can be added.
pub struct MemoryQueue {
    name: String,
    // None until created
    messages: Mutex<Option<VecDeque<QueuedMessage>>>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> NexusResult<Self> {
        Ok(Self {
            name: StringValidator::entity_name(name, "queue name")?,
            messages: Mutex::new(None),
        })
    }

    fn lock(&self) -> NexusResult<MutexGuard<'_, Option<VecDeque<QueuedMessage>>>> {
        self.messages
            .lock()
            .map_err(|_| storage_error!(self.name.clone(), "queue lock poisoned"))
    }

    fn not_created(&self) -> NexusError {
        NexusError::NotFound(format!("queue '{}' has not been created", self.name))
    }

    /// Number of messages, visible or not
    pub fn len(&self) -> NexusResult<usize> {
        Ok(self.lock()?.as_ref().map_or(0, VecDeque::len))
    }

    pub fn is_empty(&self) -> NexusResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Contents of the messages currently visible, oldest first, without removing them
    pub fn peek_visible(&self) -> NexusResult<Vec<String>> {
        let guard = self.lock()?;
        let queue = guard.as_ref().ok_or_else(|| self.not_created())?;
        let now = Instant::now();
        Ok(queue
            .iter()
            .filter(|m| m.visible_at <= now)
            .map(|m| m.content.clone())
            .collect())
    }

    /// Remove and return up to `max` visible messages, oldest first
    pub fn take_visible(&self, max: usize) -> NexusResult<Vec<String>> {
        let mut guard = self.lock()?;
        let queue = guard.as_mut().ok_or_else(|| self.not_created())?;
        let now = Instant::now();

        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(queue.len());
        for message in queue.drain(..) {
            if taken.len() < max && message.visible_at <= now {
                taken.push(message.content);
            } else {
                kept.push_back(message);
            }
        }
        *queue = kept;
        Ok(taken)
    }
}

#[async_trait]
impl HealthCheck for MemoryQueue {
    fn resource_name(&self) -> &str {
        &self.name
    }

    async fn health(&self) -> HealthStatus {
        match self.lock() {
            Ok(guard) if guard.is_some() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Warning(format!("queue '{}' has not been created", self.name)),
            Err(e) => HealthStatus::Error(e.to_string()),
        }
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_if_absent(&self) -> NexusResult<bool> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(VecDeque::new());
        log::debug!("created memory queue '{}'", self.name);
        Ok(true)
    }

    async fn add_message(&self, message: &str, visibility_delay: Option<Duration>) -> NexusResult<()> {
        if message.len() > MAX_MESSAGE_BYTES {
            return Err(NexusError::Validation(format!(
                "message of {} bytes exceeds the {} byte limit",
                message.len(),
                MAX_MESSAGE_BYTES
            )));
        }

        let delay = visibility_delay.unwrap_or_default();
        let visible_at = Instant::now().checked_add(delay).ok_or_else(|| {
            NexusError::Validation(format!("visibility delay of {:?} is out of range", delay))
        })?;

        let mut guard = self.lock()?;
        let queue = guard.as_mut().ok_or_else(|| self.not_created())?;
        queue.push_back(QueuedMessage {
            content: message.to_string(),
            visible_at,
        });
        Ok(())
    }

    async fn clear(&self) -> NexusResult<()> {
        let mut guard = self.lock()?;
        let queue = guard.as_mut().ok_or_else(|| self.not_created())?;
        queue.clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQueue").field("name", &self.name).finish()
    }
}
