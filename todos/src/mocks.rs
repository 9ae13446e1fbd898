//! In-memory collaborators for tests and demos.
//!
//! - [`InMemoryTodoStore`]: a `Vec`-backed [`TodoStore`] with failure
//!   injection, latency and call counting
//! - [`RecordingNotifier`]: keeps every notification for assertions

use crate::notify::{Notification, Notifier, Severity};
use crate::remote::{RemoteError, RemoteFuture, RemoteOperation, TodoStore};
use crate::types::{NewTodo, OwnerId, SortOrder, TodoFilter, TodoId, TodoItem, TodoPatch, TodoQuery};
use chrono::{DateTime, Utc};
use daybook_core::environment::{Clock, SystemClock};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct StoreInner {
    rows: Vec<TodoItem>,
    failing: HashSet<RemoteOperation>,
    fail_next: HashMap<RemoteOperation, usize>,
    calls: HashMap<RemoteOperation, usize>,
    delays: HashMap<RemoteOperation, Duration>,
    select_delays: HashMap<OwnerId, Duration>,
    last_created: Option<DateTime<Utc>>,
}

/// In-memory todo table
///
/// Clones share the same rows. Creation times come from the clock but are
/// kept strictly increasing, so newest-first order is always well defined.
///
/// # Example
///
/// ```
/// use daybook_todos::mocks::InMemoryTodoStore;
/// use daybook_todos::remote::{RemoteOperation, TodoStore};
/// use daybook_todos::{NewTodo, OwnerId, Priority, TodoQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTodoStore::new();
/// let owner = OwnerId::new();
///
/// if let Some(todo) = NewTodo::new(owner, "Buy milk", Priority::Medium, None) {
///     store.insert(todo).await?;
/// }
///
/// store.fail(RemoteOperation::Select);
/// assert!(store.select(TodoQuery::for_owner(owner)).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryTodoStore {
    inner: Arc<Mutex<StoreInner>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTodoStore {
    /// Creates an empty store using the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store assigning creation times from `clock`
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            clock,
        }
    }

    /// Adds existing rows
    #[must_use]
    pub fn with_rows(self, rows: impl IntoIterator<Item = TodoItem>) -> Self {
        self.lock().rows.extend(rows);
        self
    }

    /// Make every call of `operation` fail until [`recover`](Self::recover)
    pub fn fail(&self, operation: RemoteOperation) {
        self.lock().failing.insert(operation);
    }

    /// Make only the next call of `operation` fail
    pub fn fail_next(&self, operation: RemoteOperation) {
        *self.lock().fail_next.entry(operation).or_default() += 1;
    }

    /// Stop failing `operation`
    pub fn recover(&self, operation: RemoteOperation) {
        let mut inner = self.lock();
        inner.failing.remove(&operation);
        inner.fail_next.remove(&operation);
    }

    /// Delay every call of `operation`
    pub fn delay(&self, operation: RemoteOperation, delay: Duration) {
        self.lock().delays.insert(operation, delay);
    }

    /// Delay every select for `owner`
    pub fn delay_select(&self, owner: OwnerId, delay: Duration) {
        self.lock().select_delays.insert(owner, delay);
    }

    /// Number of calls made for `operation`, failed ones included
    #[must_use]
    pub fn calls(&self, operation: RemoteOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Number of calls made for all operations
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Every stored row, in insertion order
    #[must_use]
    pub fn rows(&self) -> Vec<TodoItem> {
        self.lock().rows.clone()
    }

    /// A stored row by id
    #[must_use]
    pub fn row(&self, id: &TodoId) -> Option<TodoItem> {
        self.lock().rows.iter().find(|r| r.id == *id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out any configured delay, apply injected failures
    async fn begin(&self, operation: RemoteOperation) -> Result<(), RemoteError> {
        let delay = self.lock().delays.get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        *inner.calls.entry(operation).or_default() += 1;

        if let Some(remaining) = inner.fail_next.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::new(operation, "injected failure"));
            }
        }
        if inner.failing.contains(&operation) {
            return Err(RemoteError::new(operation, "injected failure"));
        }
        Ok(())
    }

    fn next_created_at(&self, inner: &mut StoreInner) -> DateTime<Utc> {
        let now = self.clock.now();
        let created_at = match inner.last_created {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        inner.last_created = Some(created_at);
        created_at
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTodoStore")
            .field("rows", &self.lock().rows.len())
            .finish_non_exhaustive()
    }
}

impl TodoStore for InMemoryTodoStore {
    fn select(&self, query: TodoQuery) -> RemoteFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            self.begin(RemoteOperation::Select).await?;

            let delay = self.lock().select_delays.get(&query.owner_id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut rows: Vec<TodoItem> = self
                .lock()
                .rows
                .iter()
                .filter(|r| r.owner_id == query.owner_id)
                .cloned()
                .collect();

            match query.order {
                SortOrder::CreatedAtDesc => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
                SortOrder::CreatedAtAsc => rows.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            }
            Ok(rows)
        })
    }

    fn insert(&self, todo: NewTodo) -> RemoteFuture<'_, TodoItem> {
        Box::pin(async move {
            self.begin(RemoteOperation::Insert).await?;

            let mut inner = self.lock();
            let created_at = self.next_created_at(&mut inner);
            let row = TodoItem {
                id: TodoId::new(),
                owner_id: todo.owner_id,
                title: todo.title,
                completed: todo.completed,
                completed_at: None,
                priority: todo.priority,
                subject: todo.subject,
                created_at,
            };
            inner.rows.push(row.clone());
            Ok(row)
        })
    }

    fn update(&self, filter: TodoFilter, patch: TodoPatch) -> RemoteFuture<'_, TodoItem> {
        Box::pin(async move {
            self.begin(RemoteOperation::Update).await?;

            let mut inner = self.lock();
            let row = inner
                .rows
                .iter_mut()
                .find(|r| r.id == filter.id && r.owner_id == filter.owner_id)
                .ok_or_else(|| RemoteError::new(RemoteOperation::Update, "no matching row"))?;
            row.apply(&patch);
            Ok(row.clone())
        })
    }

    fn delete(&self, filter: TodoFilter) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.begin(RemoteOperation::Delete).await?;

            self.lock()
                .rows
                .retain(|r| !(r.id == filter.id && r.owner_id == filter.owner_id));
            Ok(())
        })
    }
}

/// Notifier that records what it receives
///
/// Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received, oldest first
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Error notifications received
    #[must_use]
    pub fn errors(&self) -> Vec<Notification> {
        self.with_severity(Severity::Error)
    }

    /// Informational notifications received
    #[must_use]
    pub fn infos(&self) -> Vec<Notification> {
        self.with_severity(Severity::Info)
    }

    /// Forget everything received so far
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|n| n.severity == severity)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}
