//! Remote store contract consumed by the synchronizer.
//!
//! The store is table-scoped: every call reads or writes the todo rows of a
//! single owner. Implementations:
//!
//! - `SupabaseTodoStore` (in `daybook-supabase`): PostgREST over HTTP
//! - [`InMemoryTodoStore`](crate::mocks::InMemoryTodoStore): tests and demos
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures instead of using `async fn` so the store can
//! be shared as `Arc<dyn TodoStore>` and captured by effects.

use crate::types::{NewTodo, TodoFilter, TodoItem, TodoPatch, TodoQuery};
use futures::future::BoxFuture;
use thiserror::Error;

/// Remote operation that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    /// Read all rows of an owner
    Select,
    /// Create a row
    Insert,
    /// Change a row
    Update,
    /// Delete a row
    Delete,
}

impl RemoteOperation {
    /// Lowercase label, used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of a remote call
///
/// Network, authorization and validation failures are not distinguished at
/// this layer; the cause is carried as text.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("Remote {operation} failed: {cause}")]
pub struct RemoteError {
    /// Operation that failed
    pub operation: RemoteOperation,
    /// Opaque cause
    pub cause: String,
}

impl RemoteError {
    /// Creates a remote error for `operation`
    pub fn new(operation: RemoteOperation, cause: impl std::fmt::Display) -> Self {
        Self {
            operation,
            cause: cause.to_string(),
        }
    }
}

/// Future returned by [`TodoStore`] methods
pub type RemoteFuture<'a, T> = BoxFuture<'a, Result<T, RemoteError>>;

/// Table-scoped access to todo rows
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; effects call them from tokio tasks.
pub trait TodoStore: Send + Sync {
    /// Read every row matching `query`, in `query.order`
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] with [`RemoteOperation::Select`] on any failure.
    fn select(&self, query: TodoQuery) -> RemoteFuture<'_, Vec<TodoItem>>;

    /// Insert a row and return it as stored (id and creation time assigned)
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] with [`RemoteOperation::Insert`] on any failure.
    fn insert(&self, todo: NewTodo) -> RemoteFuture<'_, TodoItem>;

    /// Apply `patch` to the row matching `filter` and return it as stored
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] with [`RemoteOperation::Update`] on any
    /// failure, including when no row matches.
    fn update(&self, filter: TodoFilter, patch: TodoPatch) -> RemoteFuture<'_, TodoItem>;

    /// Delete the row matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] with [`RemoteOperation::Delete`] on any failure.
    fn delete(&self, filter: TodoFilter) -> RemoteFuture<'_, ()>;
}
