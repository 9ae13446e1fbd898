//! # Daybook Todos
//!
//! Synchronizes one signed-in user's todo list with a remote table.
//!
//! - The list is loaded newest-first when the session reports a user, and
//!   replaced (never merged) when the user changes
//! - Create, toggle and remove each make one remote call; the list changes
//!   only after the store confirms (no optimistic updates)
//! - Failures are logged, counted, and reported to a [`Notifier`]; the list
//!   stays as it was
//!
//! # Quick Start
//!
//! ```no_run
//! use daybook_todos::mocks::InMemoryTodoStore;
//! use daybook_todos::{
//!     OwnerId, Priority, SessionHandle, TodoEnvironment, TodoSynchronizer, TracingNotifier,
//! };
//! use daybook_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodoEnvironment::new(
//!     Arc::new(InMemoryTodoStore::new()),
//!     Arc::new(TracingNotifier),
//!     Arc::new(SystemClock),
//! );
//! let todos = TodoSynchronizer::new(env);
//!
//! // Follow the auth layer's session
//! let session = SessionHandle::new();
//! let _follower = todos.follow_session(session.subscribe());
//! session.sign_in(OwnerId::new());
//!
//! todos.create("Revise chapter 4", Priority::High, Some("History")).await?;
//! let stats = todos.stats().await;
//! println!("{}% done", stats.completion_rate);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod mocks;
pub mod notify;
pub mod reducer;
pub mod remote;
pub mod session;
pub mod stats;
pub mod synchronizer;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, DaybookConfig};
pub use notify::{Notification, Notifier, Severity, TracingNotifier};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use remote::{RemoteError, RemoteOperation, TodoStore};
pub use session::SessionHandle;
pub use stats::{PriorityCounts, TodoStats};
pub use synchronizer::{OperationOutcome, TodoSynchronizer};
pub use types::{
    LoadStatus, NewTodo, OwnerId, Priority, RequestId, Session, SortOrder, TodoAction, TodoFilter,
    TodoId, TodoItem, TodoPatch, TodoQuery, TodoState,
};
