//! Wire shape of a row in the todos table.
//!
//! Columns are `snake_case` and the owner column is `user_id`. Legacy rows
//! may lack `priority` or `subject`, or carry a priority label this version
//! does not know; both read as defaults.

use chrono::{DateTime, Utc};
use daybook_todos::{NewTodo, OwnerId, Priority, TodoId, TodoItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row as returned by a select or a `return=representation` write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRow {
    /// Primary key
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Title
    pub title: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Completion time
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Priority label
    #[serde(default)]
    pub priority: Priority,
    /// Subject label
    #[serde(default)]
    pub subject: Option<String>,
    /// Creation time, assigned by the database
    pub created_at: DateTime<Utc>,
}

impl From<TodoRow> for TodoItem {
    fn from(row: TodoRow) -> Self {
        Self {
            id: TodoId::from_uuid(row.id),
            owner_id: OwnerId::from_uuid(row.user_id),
            title: row.title,
            completed: row.completed,
            completed_at: row.completed_at,
            priority: row.priority,
            subject: row.subject,
            created_at: row.created_at,
        }
    }
}

/// Insert body; `id` and `created_at` are left to the database
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InsertRow {
    /// Owner
    pub user_id: Uuid,
    /// Title
    pub title: String,
    /// Always `false`
    pub completed: bool,
    /// Priority label
    pub priority: Priority,
    /// Subject label, `null` when absent
    pub subject: Option<String>,
}

impl From<NewTodo> for InsertRow {
    fn from(todo: NewTodo) -> Self {
        Self {
            user_id: *todo.owner_id.as_uuid(),
            title: todo.title,
            completed: todo.completed,
            priority: todo.priority,
            subject: todo.subject,
        }
    }
}
