//! The todo list synchronizer facade.
//!
//! Wraps a [`Store`] running the [`TodoReducer`] and turns each user
//! operation into one command. Every method resolves once the command and
//! everything it triggered (the remote call, its outcome, the resulting
//! notification) has settled, and reports how it went.

use crate::config::DaybookConfig;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::stats::TodoStats;
use crate::types::{
    LoadStatus, OwnerId, Priority, Session, TodoAction, TodoId, TodoItem, TodoState,
};
use chrono_tz::Tz;
use daybook_core::environment::Clock;
use daybook_runtime::{Store, StoreError};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// How a synchronizer operation ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The remote call succeeded and its result reached the list
    Applied,
    /// The remote call failed; the list is unchanged
    Failed(String),
    /// Nothing was sent: blank input, unknown item, no signed-in user,
    /// session still loading, or a call for the same item in flight
    Skipped,
}

impl OperationOutcome {
    /// Whether the operation took effect
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    fn from_outcome(action: &TodoAction) -> Self {
        action
            .failure()
            .map_or(Self::Applied, |reason| Self::Failed(reason.to_string()))
    }
}

/// Keeps one user's todo list in sync with the remote store
///
/// Cheap to clone; clones drive the same list.
///
/// # Example
///
/// ```no_run
/// use daybook_todos::mocks::{InMemoryTodoStore, RecordingNotifier};
/// use daybook_todos::{OwnerId, Priority, TodoEnvironment, TodoSynchronizer};
/// use daybook_core::environment::SystemClock;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let env = TodoEnvironment::new(
///     Arc::new(InMemoryTodoStore::new()),
///     Arc::new(RecordingNotifier::new()),
///     Arc::new(SystemClock),
/// );
/// let todos = TodoSynchronizer::new(env);
///
/// todos.load_all(OwnerId::new()).await?;
/// let outcome = todos.create("Buy milk", Priority::Medium, None).await?;
/// assert!(outcome.is_applied());
/// println!("{} todos", todos.todos().await.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodoSynchronizer {
    store: Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl TodoSynchronizer {
    /// Creates a synchronizer with the default configuration
    #[must_use]
    pub fn new(env: TodoEnvironment) -> Self {
        Self::with_config(env, &DaybookConfig::default())
    }

    /// Creates a synchronizer with a custom configuration
    #[must_use]
    pub fn with_config(env: TodoEnvironment, config: &DaybookConfig) -> Self {
        let clock = Arc::clone(&env.clock);
        let store = Store::with_config(
            TodoState::new(),
            TodoReducer::new(),
            env,
            config.store_config(),
        );

        Self {
            store,
            clock,
            timezone: config.timezone,
        }
    }

    /// Replace the list with every todo of `owner`, newest first
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn load_all(&self, owner: OwnerId) -> Result<OperationOutcome, StoreError> {
        self.dispatch(TodoAction::load_all(owner)).await
    }

    /// Create a todo for the signed-in owner
    ///
    /// On [`OperationOutcome::Failed`] callers should keep the user's input
    /// so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn create(
        &self,
        title: &str,
        priority: Priority,
        subject: Option<&str>,
    ) -> Result<OperationOutcome, StoreError> {
        self.dispatch(TodoAction::create(
            title,
            priority,
            subject.map(ToString::to_string),
        ))
        .await
    }

    /// Flip completion of a listed todo
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn toggle_complete(&self, id: TodoId) -> Result<OperationOutcome, StoreError> {
        self.dispatch(TodoAction::toggle_complete(id)).await
    }

    /// Delete a listed todo
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn remove(&self, id: TodoId) -> Result<OperationOutcome, StoreError> {
        self.dispatch(TodoAction::remove(id)).await
    }

    /// React to a session change: load, clear, or nothing
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn apply_session(&self, session: Session) -> Result<OperationOutcome, StoreError> {
        self.dispatch(TodoAction::session_changed(session)).await
    }

    /// Apply the current session and every later change, until the sender
    /// is dropped or the synchronizer shuts down
    ///
    /// Each change is applied as soon as it arrives, without waiting for a
    /// load started by the previous one; a load that settles for a user who
    /// is no longer signed in is discarded.
    pub fn follow_session(&self, mut sessions: watch::Receiver<Session>) -> JoinHandle<()> {
        let store = self.store.clone();

        tokio::spawn(async move {
            loop {
                let session = sessions.borrow_and_update().clone();
                if let Err(error) = store.send(TodoAction::session_changed(session)).await {
                    tracing::debug!(%error, "Stopped following session");
                    break;
                }
                if sessions.changed().await.is_err() {
                    tracing::debug!("Session provider closed");
                    break;
                }
            }
        })
    }

    /// Current todos, newest first
    pub async fn todos(&self) -> Vec<TodoItem> {
        self.store.state(|s| s.todos.clone()).await
    }

    /// Current load status
    pub async fn load_status(&self) -> LoadStatus {
        self.store.state(|s| s.load_status.clone()).await
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Statistics over the current list
    pub async fn stats(&self) -> TodoStats {
        let now = self.clock.now();
        let timezone = self.timezone;
        self.store
            .state(|s| TodoStats::compute(&s.todos, now, timezone))
            .await
    }

    /// Observe every outcome as it is produced
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting operations and wait for in-flight remote calls
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if calls are still running
    /// when the configured timeout expires.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.store.shutdown_gracefully().await
    }

    /// Send `action`, wait until everything it triggered has settled and
    /// find its outcome
    async fn dispatch(&self, action: TodoAction) -> Result<OperationOutcome, StoreError> {
        let request = action.request();
        let command = action.name();

        let produced = self.store.send_and_collect(action).await?;
        let outcome = produced
            .iter()
            .find(|action| action.request() == request && action.is_outcome())
            .map_or(OperationOutcome::Skipped, OperationOutcome::from_outcome);

        tracing::debug!(command, %request, ?outcome, "Operation settled");
        Ok(outcome)
    }
}

impl std::fmt::Debug for TodoSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoSynchronizer")
            .field("timezone", &self.timezone)
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
