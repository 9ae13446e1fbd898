//! Reducer logic for the todo synchronizer.
//!
//! Every command issues at most one remote call, described as an effect.
//! The list changes only when the matching outcome comes back: mutations
//! are confirm-then-apply, never optimistic.

use crate::notify::{Notification, Notifier};
use crate::remote::{RemoteError, TodoStore};
use crate::types::{
    LoadStatus, NewTodo, OwnerId, Priority, RequestId, Session, TodoAction, TodoFilter, TodoId,
    TodoItem, TodoPatch, TodoQuery, TodoState,
};
use daybook_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Effects returned by [`TodoReducer`]
type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Remote table holding the rows
    pub store: Arc<dyn TodoStore>,
    /// Where success and failure messages go
    pub notifier: Arc<dyn Notifier>,
    /// Clock for completion timestamps
    pub clock: Arc<dyn Clock>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(
        store: Arc<dyn TodoStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Owner a mutation is scoped by, if mutations are allowed right now
    fn mutation_owner(state: &TodoState, command: &'static str) -> Option<OwnerId> {
        if state.session_loading {
            tracing::debug!(command, "Ignoring command while the session is loading");
            return None;
        }
        if state.owner.is_none() {
            tracing::debug!(command, "Ignoring command without a signed-in owner");
        }
        state.owner
    }

    /// Whether a toggle or remove may start for `id`
    fn validate_item_command(state: &TodoState, id: &TodoId, command: &'static str) -> bool {
        if !state.exists(id) {
            tracing::debug!(command, %id, "Ignoring command for a todo not in the list");
            return false;
        }
        if state.is_pending(id) {
            tracing::debug!(command, %id, "Ignoring command while a previous one is in flight");
            return false;
        }
        true
    }

    /// Bind `owner` and start a fresh load
    fn begin_load(
        state: &mut TodoState,
        request: RequestId,
        owner: OwnerId,
        env: &TodoEnvironment,
    ) -> Effects {
        if state.owner != Some(owner) {
            // A different user's rows must never be shown, not even briefly
            state.todos.clear();
            state.pending.clear();
            state.owner = Some(owner);
        }
        state.generation = state.generation.wrapping_add(1);
        state.load_status = LoadStatus::Loading;

        smallvec![Self::select(env, request, state.generation, owner)]
    }

    fn follow_session(
        state: &mut TodoState,
        request: RequestId,
        session: Session,
        env: &TodoEnvironment,
    ) -> Effects {
        state.session_loading = session.is_loading;
        if session.is_loading {
            return SmallVec::new();
        }

        match session.user_id {
            None => {
                state.reset();
                state.generation = state.generation.wrapping_add(1);
                SmallVec::new()
            },
            Some(user)
                if state.owner == Some(user)
                    && matches!(state.load_status, LoadStatus::Loaded | LoadStatus::Loading) =>
            {
                SmallVec::new()
            },
            Some(user) => Self::begin_load(state, request, user, env),
        }
    }

    fn create(
        state: &TodoState,
        request: RequestId,
        title: &str,
        priority: Priority,
        subject: Option<&str>,
        env: &TodoEnvironment,
    ) -> Effects {
        let Some(owner) = Self::mutation_owner(state, "create") else {
            return SmallVec::new();
        };
        let Some(todo) = NewTodo::new(owner, title, priority, subject) else {
            tracing::debug!("Ignoring create with a blank title");
            return SmallVec::new();
        };

        smallvec![Self::insert(env, request, todo)]
    }

    fn toggle_complete(
        state: &mut TodoState,
        request: RequestId,
        id: TodoId,
        env: &TodoEnvironment,
    ) -> Effects {
        let Some(owner) = Self::mutation_owner(state, "toggle") else {
            return SmallVec::new();
        };
        if !Self::validate_item_command(state, &id, "toggle") {
            return SmallVec::new();
        }
        let Some(patch) = state.get(&id).map(|todo| todo.toggle_patch(env.clock.now())) else {
            return SmallVec::new();
        };

        state.pending.insert(id);
        smallvec![Self::update(env, request, TodoFilter::new(id, owner), patch)]
    }

    fn remove(
        state: &mut TodoState,
        request: RequestId,
        id: TodoId,
        env: &TodoEnvironment,
    ) -> Effects {
        let Some(owner) = Self::mutation_owner(state, "remove") else {
            return SmallVec::new();
        };
        if !Self::validate_item_command(state, &id, "remove") {
            return SmallVec::new();
        }

        state.pending.insert(id);
        smallvec![Self::delete(env, request, TodoFilter::new(id, owner))]
    }

    // ========== Effects ==========

    fn select(
        env: &TodoEnvironment,
        request: RequestId,
        generation: u64,
        owner: OwnerId,
    ) -> Effect<TodoAction> {
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            match store.select(TodoQuery::for_owner(owner)).await {
                Ok(todos) => {
                    tracing::debug!(%owner, count = todos.len(), "Loaded todos");
                    Some(TodoAction::Loaded {
                        request,
                        generation,
                        owner,
                        todos,
                    })
                },
                Err(error) => {
                    record_failure(&error);
                    Some(TodoAction::LoadFailed {
                        request,
                        generation,
                        reason: error.to_string(),
                    })
                },
            }
        })
    }

    fn insert(env: &TodoEnvironment, request: RequestId, todo: NewTodo) -> Effect<TodoAction> {
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            match store.insert(todo).await {
                Ok(todo) => Some(TodoAction::Created { request, todo }),
                Err(error) => {
                    record_failure(&error);
                    Some(TodoAction::CreateFailed {
                        request,
                        reason: error.to_string(),
                    })
                },
            }
        })
    }

    fn update(
        env: &TodoEnvironment,
        request: RequestId,
        filter: TodoFilter,
        patch: TodoPatch,
    ) -> Effect<TodoAction> {
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            let id = filter.id;
            match store.update(filter, patch).await {
                Ok(todo) => Some(TodoAction::Toggled { request, id, todo }),
                Err(error) => {
                    record_failure(&error);
                    Some(TodoAction::ToggleFailed {
                        request,
                        id,
                        reason: error.to_string(),
                    })
                },
            }
        })
    }

    fn delete(env: &TodoEnvironment, request: RequestId, filter: TodoFilter) -> Effect<TodoAction> {
        let store = Arc::clone(&env.store);

        Effect::future(async move {
            let id = filter.id;
            match store.delete(filter).await {
                Ok(()) => Some(TodoAction::Removed { request, id }),
                Err(error) => {
                    record_failure(&error);
                    Some(TodoAction::RemoveFailed {
                        request,
                        id,
                        reason: error.to_string(),
                    })
                },
            }
        })
    }

    fn notify(env: &TodoEnvironment, notification: Notification) -> Effect<TodoAction> {
        let notifier = Arc::clone(&env.notifier);

        Effect::future(async move {
            notifier.notify(notification);
            None
        })
    }

    // ========== Outcomes ==========

    fn apply_loaded(
        state: &mut TodoState,
        generation: u64,
        owner: OwnerId,
        todos: Vec<TodoItem>,
    ) -> Effects {
        if generation != state.generation {
            tracing::debug!(generation, current = state.generation, "Discarding stale load");
            return SmallVec::new();
        }

        state.replace_with(owner, todos);
        state.load_status = LoadStatus::Loaded;
        state.last_error = None;
        SmallVec::new()
    }

    fn apply_load_failed(
        state: &mut TodoState,
        generation: u64,
        reason: String,
        env: &TodoEnvironment,
    ) -> Effects {
        if generation != state.generation {
            tracing::debug!(generation, current = state.generation, "Discarding stale load failure");
            return SmallVec::new();
        }

        state.load_status = LoadStatus::Failed {
            reason: reason.clone(),
        };
        state.last_error = Some(reason.clone());
        smallvec![Self::notify(
            env,
            Notification::error("Could not load your todos", reason)
        )]
    }

    fn apply_created(state: &mut TodoState, todo: TodoItem, env: &TodoEnvironment) -> Effects {
        if state.owner != Some(todo.owner_id) {
            tracing::debug!(id = %todo.id, "Discarding created todo of another owner");
            return SmallVec::new();
        }

        let description = format!("\"{}\" was added to your list", todo.title);
        state.prepend(todo);
        state.last_error = None;
        smallvec![Self::notify(env, Notification::info("Todo added", description))]
    }

    fn apply_toggled(state: &mut TodoState, id: TodoId, todo: &TodoItem) -> Effects {
        state.pending.remove(&id);
        if let Some(item) = state.todos.iter_mut().find(|t| t.id == id) {
            item.apply(&TodoPatch {
                completed: todo.completed,
                completed_at: todo.completed_at,
            });
            state.last_error = None;
        }
        SmallVec::new()
    }

    fn apply_removed(state: &mut TodoState, id: TodoId) -> Effects {
        state.pending.remove(&id);
        state.todos.retain(|t| t.id != id);
        state.last_error = None;
        SmallVec::new()
    }

    fn apply_mutation_failed(
        state: &mut TodoState,
        id: Option<TodoId>,
        title: &'static str,
        reason: String,
        env: &TodoEnvironment,
    ) -> Effects {
        if let Some(id) = id {
            state.pending.remove(&id);
        }
        state.last_error = Some(reason.clone());
        smallvec![Self::notify(env, Notification::error(title, reason))]
    }
}

/// Log and count a failed remote call
fn record_failure(error: &RemoteError) {
    tracing::warn!(operation = %error.operation, cause = %error.cause, "Remote call failed");
    metrics::counter!("todos.remote.failures", "operation" => error.operation.as_str())
        .increment(1);
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TodoAction::LoadAll { request, owner } => {
                if state.session_loading {
                    tracing::debug!(%owner, "Ignoring load while the session is loading");
                    return SmallVec::new();
                }
                Self::begin_load(state, request, owner, env)
            },

            TodoAction::SessionChanged { request, session } => {
                Self::follow_session(state, request, session, env)
            },

            TodoAction::Create {
                request,
                title,
                priority,
                subject,
            } => Self::create(state, request, &title, priority, subject.as_deref(), env),

            TodoAction::ToggleComplete { request, id } => {
                Self::toggle_complete(state, request, id, env)
            },

            TodoAction::Remove { request, id } => Self::remove(state, request, id, env),

            // ========== Outcomes ==========
            TodoAction::Loaded {
                generation,
                owner,
                todos,
                ..
            } => Self::apply_loaded(state, generation, owner, todos),

            TodoAction::LoadFailed {
                generation, reason, ..
            } => Self::apply_load_failed(state, generation, reason, env),

            TodoAction::Created { todo, .. } => Self::apply_created(state, todo, env),

            TodoAction::CreateFailed { reason, .. } => {
                Self::apply_mutation_failed(state, None, "Could not add todo", reason, env)
            },

            TodoAction::Toggled { id, todo, .. } => Self::apply_toggled(state, id, &todo),

            TodoAction::ToggleFailed { id, reason, .. } => {
                Self::apply_mutation_failed(state, Some(id), "Could not update todo", reason, env)
            },

            TodoAction::Removed { id, .. } => Self::apply_removed(state, id),

            TodoAction::RemoveFailed { id, reason, .. } => {
                Self::apply_mutation_failed(state, Some(id), "Could not delete todo", reason, env)
            },
        }
    }
}
