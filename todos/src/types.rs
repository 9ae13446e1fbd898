//! Domain types for the todo synchronizer.
//!
//! The list mirrors rows owned by one user in a remote store. Rows are
//! identified by a server-assigned [`TodoId`] and scoped by [`OwnerId`] on
//! every read and write.

use chrono::{DateTime, Utc};
use daybook_macros::Action;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a todo item, assigned by the remote store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the signed-in user owning a set of todos
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new random `OwnerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an `OwnerId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates a command with the outcome its remote call produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Todo priority
///
/// Serialized lowercase. Unknown or null values read from the store are
/// treated as [`Priority::Medium`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Needs attention first
    High,
    /// The default
    #[default]
    Medium,
    /// Whenever there is time
    Low,
}

impl Priority {
    /// All priorities, highest first
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Parse a stored label, falling back to `Medium`
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    /// Lowercase label as stored remotely
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or_else(Self::default, Self::from_label))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single todo item, as stored remotely
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Server-assigned identifier
    pub id: TodoId,
    /// Owning user
    pub owner_id: OwnerId,
    /// Display text, never blank
    pub title: String,
    /// Whether the todo is done
    pub completed: bool,
    /// Set when the todo became completed, cleared when reopened
    pub completed_at: Option<DateTime<Utc>>,
    /// Priority, fixed at creation
    #[serde(default)]
    pub priority: Priority,
    /// Optional free-text label, fixed at creation
    #[serde(default)]
    pub subject: Option<String>,
    /// Creation time assigned by the store; the list ordering key
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    /// Creates an open todo item
    #[must_use]
    pub const fn new(
        id: TodoId,
        owner_id: OwnerId,
        title: String,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            completed: false,
            completed_at: None,
            priority,
            subject: None,
            created_at,
        }
    }

    /// Sets the subject label
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// The patch that flips this item's completion at `now`
    #[must_use]
    pub const fn toggle_patch(&self, now: DateTime<Utc>) -> TodoPatch {
        if self.completed {
            TodoPatch::reopen()
        } else {
            TodoPatch::complete(now)
        }
    }

    /// Applies the completion fields of a patch
    pub const fn apply(&mut self, patch: &TodoPatch) {
        self.completed = patch.completed;
        self.completed_at = patch.completed_at;
    }
}

/// Insert payload for a new todo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Owning user
    pub owner_id: OwnerId,
    /// Trimmed, non-empty title
    pub title: String,
    /// Priority
    pub priority: Priority,
    /// Subject label, `None` when blank
    pub subject: Option<String>,
    /// Always `false` on insert
    pub completed: bool,
}

impl NewTodo {
    /// Builds an insert payload from user input
    ///
    /// Returns `None` when the title is blank after trimming. A blank subject
    /// is stored as absent.
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        title: &str,
        priority: Priority,
        subject: Option<&str>,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Some(Self {
            owner_id,
            title: title.to_string(),
            priority,
            subject,
            completed: false,
        })
    }
}

/// Completion update sent by a toggle
///
/// `completed_at` is always serialized; an explicit `null` clears it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// New completion flag
    pub completed: bool,
    /// New completion time
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoPatch {
    /// Mark as completed at `now`
    #[must_use]
    pub const fn complete(now: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            completed_at: Some(now),
        }
    }

    /// Mark as open again
    #[must_use]
    pub const fn reopen() -> Self {
        Self {
            completed: false,
            completed_at: None,
        }
    }
}

/// Scope of an update or delete: one row of one owner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TodoFilter {
    /// Row identifier
    pub id: TodoId,
    /// Owner the row must belong to
    pub owner_id: OwnerId,
}

impl TodoFilter {
    /// Creates a filter for one owner's row
    #[must_use]
    pub const fn new(id: TodoId, owner_id: OwnerId) -> Self {
        Self { id, owner_id }
    }
}

/// Ordering of a select
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first
    #[default]
    CreatedAtDesc,
    /// Oldest first
    CreatedAtAsc,
}

/// Scope of a select: every row of one owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TodoQuery {
    /// Owner whose rows are read
    pub owner_id: OwnerId,
    /// Row order
    pub order: SortOrder,
}

impl TodoQuery {
    /// All rows of `owner_id`, newest first
    #[must_use]
    pub const fn for_owner(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            order: SortOrder::CreatedAtDesc,
        }
    }
}

/// Where the list stands with respect to the remote store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Nothing requested yet (or signed out)
    #[default]
    NotLoaded,
    /// A load is in flight
    Loading,
    /// The list mirrors the store
    Loaded,
    /// The last load failed; the list may be empty or stale
    Failed {
        /// Failure cause
        reason: String,
    },
}

impl LoadStatus {
    /// True once a load settled, successfully or not
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed { .. })
    }
}

/// Identity reported by the session provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user, if any
    pub user_id: Option<OwnerId>,
    /// True while the provider is still resolving the identity
    pub is_loading: bool,
}

impl Session {
    /// Identity not resolved yet
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            user_id: None,
            is_loading: true,
        }
    }

    /// A resolved, signed-in user
    #[must_use]
    pub const fn signed_in(user_id: OwnerId) -> Self {
        Self {
            user_id: Some(user_id),
            is_loading: false,
        }
    }

    /// A resolved, anonymous session
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            user_id: None,
            is_loading: false,
        }
    }
}

/// State of the synchronized todo list
#[derive(Clone, Debug, Default)]
pub struct TodoState {
    /// Owner the list is bound to
    pub owner: Option<OwnerId>,
    /// Items, newest first
    pub todos: Vec<TodoItem>,
    /// Load progress
    pub load_status: LoadStatus,
    /// Items with a toggle or remove in flight
    pub pending: HashSet<TodoId>,
    /// Incremented per load; outcomes of older loads are discarded
    pub generation: u64,
    /// Mirrors the session's loading flag
    pub session_loading: bool,
    /// Cause of the last failed remote call
    pub last_error: Option<String>,
}

impl TodoState {
    /// Creates an empty, unbound state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loaded state for `owner` holding `todos`
    #[must_use]
    pub fn for_owner(owner: OwnerId, todos: Vec<TodoItem>) -> Self {
        Self {
            owner: Some(owner),
            todos,
            load_status: LoadStatus::Loaded,
            ..Self::default()
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == *id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Whether a toggle or remove for `id` has not settled yet
    #[must_use]
    pub fn is_pending(&self, id: &TodoId) -> bool {
        self.pending.contains(id)
    }

    /// Replaces the list with `rows`, keeping only `owner`'s rows and the
    /// first occurrence of each id
    pub fn replace_with(&mut self, owner: OwnerId, rows: Vec<TodoItem>) {
        let mut seen = HashSet::with_capacity(rows.len());
        self.todos = rows
            .into_iter()
            .filter(|row| row.owner_id == owner && seen.insert(row.id))
            .collect();
    }

    /// Prepends `item`, dropping any existing item with the same id
    pub fn prepend(&mut self, item: TodoItem) {
        self.todos.retain(|t| t.id != item.id);
        self.todos.insert(0, item);
    }

    /// Clears the list and unbinds the owner
    pub fn reset(&mut self) {
        self.owner = None;
        self.todos.clear();
        self.pending.clear();
        self.load_status = LoadStatus::NotLoaded;
        self.last_error = None;
    }
}

/// Actions of the todo synchronizer
///
/// Commands carry user intent and at most one remote call each. Outcomes
/// report how that call settled; only outcomes change the list.
#[derive(Action, Clone, Debug, PartialEq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Replace the list with every row of `owner`
    #[command]
    LoadAll {
        /// Correlation id
        request: RequestId,
        /// Owner to load
        owner: OwnerId,
    },

    /// Command: The session provider reported a new identity
    #[command]
    SessionChanged {
        /// Correlation id
        request: RequestId,
        /// New session
        session: Session,
    },

    /// Command: Insert a todo for the bound owner
    #[command]
    Create {
        /// Correlation id
        request: RequestId,
        /// Title as typed; trimmed before insert
        title: String,
        /// Priority
        priority: Priority,
        /// Optional subject label
        subject: Option<String>,
    },

    /// Command: Flip completion of a listed todo
    #[command]
    ToggleComplete {
        /// Correlation id
        request: RequestId,
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Delete a listed todo
    #[command]
    Remove {
        /// Correlation id
        request: RequestId,
        /// Todo to delete
        id: TodoId,
    },

    // ========== Outcomes ==========
    /// Outcome: The select returned
    #[outcome]
    Loaded {
        /// Correlation id
        request: RequestId,
        /// Load this result belongs to
        generation: u64,
        /// Owner that was loaded
        owner: OwnerId,
        /// Rows, newest first
        todos: Vec<TodoItem>,
    },

    /// Outcome: The select failed
    #[outcome]
    LoadFailed {
        /// Correlation id
        request: RequestId,
        /// Load this result belongs to
        generation: u64,
        /// Failure cause
        reason: String,
    },

    /// Outcome: The insert returned the stored row
    #[outcome]
    Created {
        /// Correlation id
        request: RequestId,
        /// Stored row
        todo: TodoItem,
    },

    /// Outcome: The insert failed
    #[outcome]
    CreateFailed {
        /// Correlation id
        request: RequestId,
        /// Failure cause
        reason: String,
    },

    /// Outcome: The update returned the stored row
    #[outcome]
    Toggled {
        /// Correlation id
        request: RequestId,
        /// Toggled todo
        id: TodoId,
        /// Stored row after the update
        todo: TodoItem,
    },

    /// Outcome: The update failed
    #[outcome]
    ToggleFailed {
        /// Correlation id
        request: RequestId,
        /// Todo whose toggle failed
        id: TodoId,
        /// Failure cause
        reason: String,
    },

    /// Outcome: The delete succeeded
    #[outcome]
    Removed {
        /// Correlation id
        request: RequestId,
        /// Deleted todo
        id: TodoId,
    },

    /// Outcome: The delete failed
    #[outcome]
    RemoveFailed {
        /// Correlation id
        request: RequestId,
        /// Todo whose delete failed
        id: TodoId,
        /// Failure cause
        reason: String,
    },
}

impl TodoAction {
    /// Load command with a fresh correlation id
    #[must_use]
    pub fn load_all(owner: OwnerId) -> Self {
        Self::LoadAll {
            request: RequestId::new(),
            owner,
        }
    }

    /// Session command with a fresh correlation id
    #[must_use]
    pub fn session_changed(session: Session) -> Self {
        Self::SessionChanged {
            request: RequestId::new(),
            session,
        }
    }

    /// Create command with a fresh correlation id
    #[must_use]
    pub fn create(title: impl Into<String>, priority: Priority, subject: Option<String>) -> Self {
        Self::Create {
            request: RequestId::new(),
            title: title.into(),
            priority,
            subject,
        }
    }

    /// Toggle command with a fresh correlation id
    #[must_use]
    pub fn toggle_complete(id: TodoId) -> Self {
        Self::ToggleComplete {
            request: RequestId::new(),
            id,
        }
    }

    /// Remove command with a fresh correlation id
    #[must_use]
    pub fn remove(id: TodoId) -> Self {
        Self::Remove {
            request: RequestId::new(),
            id,
        }
    }

    /// Correlation id carried by every action
    #[must_use]
    pub const fn request(&self) -> RequestId {
        match self {
            Self::LoadAll { request, .. }
            | Self::SessionChanged { request, .. }
            | Self::Create { request, .. }
            | Self::ToggleComplete { request, .. }
            | Self::Remove { request, .. }
            | Self::Loaded { request, .. }
            | Self::LoadFailed { request, .. }
            | Self::Created { request, .. }
            | Self::CreateFailed { request, .. }
            | Self::Toggled { request, .. }
            | Self::ToggleFailed { request, .. }
            | Self::Removed { request, .. }
            | Self::RemoveFailed { request, .. } => *request,
        }
    }

    /// Failure cause, for failed outcomes
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::LoadFailed { reason, .. }
            | Self::CreateFailed { reason, .. }
            | Self::ToggleFailed { reason, .. }
            | Self::RemoveFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
