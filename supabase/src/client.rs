//! PostgREST client for the todos table

use crate::config::SupabaseConfig;
use crate::error::SupabaseError;
use crate::row::{InsertRow, TodoRow};
use daybook_todos::remote::RemoteFuture;
use daybook_todos::{
    NewTodo, RemoteOperation, SortOrder, TodoFilter, TodoItem, TodoPatch, TodoQuery, TodoStore,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

/// Todo store backed by a Supabase (PostgREST) table
///
/// Every request filters on `user_id`, so a row of another owner is never
/// read or written even without row-level security.
#[derive(Clone, Debug)]
pub struct SupabaseTodoStore {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseTodoStore {
    /// Create a store from explicit settings
    #[must_use]
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a store from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingConfig`] if `SUPABASE_URL` or
    /// `SUPABASE_ANON_KEY` is not set
    pub fn from_env() -> Result<Self, SupabaseError> {
        Ok(Self::new(SupabaseConfig::from_env()?))
    }

    /// Settings in use
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Read the rows matching `query`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn fetch_rows(&self, query: TodoQuery) -> Result<Vec<TodoRow>, SupabaseError> {
        let order = match query.order {
            SortOrder::CreatedAtDesc => "created_at.desc",
            SortOrder::CreatedAtAsc => "created_at.asc",
        };

        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", query.owner_id)),
                ("order", order.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SupabaseError::RequestFailed(e.to_string()))?;

        let rows = parse::<Vec<TodoRow>>(check(response).await?).await?;
        tracing::debug!(owner = %query.owner_id, rows = rows.len(), "Fetched todo rows");
        Ok(rows)
    }

    /// Insert a row and return it as stored
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, parsing failures,
    /// or [`SupabaseError::EmptyResponse`] if nothing was returned
    pub async fn insert_row(&self, todo: NewTodo) -> Result<TodoRow, SupabaseError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&InsertRow::from(todo))
            .send()
            .await
            .map_err(|e| SupabaseError::RequestFailed(e.to_string()))?;

        single(check(response).await?).await
    }

    /// Patch the row matching `filter` and return it as stored
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, parsing failures,
    /// or [`SupabaseError::EmptyResponse`] if no row matched
    pub async fn update_row(
        &self,
        filter: TodoFilter,
        patch: TodoPatch,
    ) -> Result<TodoRow, SupabaseError> {
        let response = self
            .request(Method::PATCH)
            .query(&scope(filter))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| SupabaseError::RequestFailed(e.to_string()))?;

        single(check(response).await?).await
    }

    /// Delete the row matching `filter`
    ///
    /// Deleting a row that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub async fn delete_row(&self, filter: TodoFilter) -> Result<(), SupabaseError> {
        let response = self
            .request(Method::DELETE)
            .query(&scope(filter))
            .send()
            .await
            .map_err(|e| SupabaseError::RequestFailed(e.to_string()))?;

        check(response).await?;
        Ok(())
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.config.table_url())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer_token())
    }
}

impl TodoStore for SupabaseTodoStore {
    fn select(&self, query: TodoQuery) -> RemoteFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            self.fetch_rows(query)
                .await
                .map(|rows| rows.into_iter().map(TodoItem::from).collect())
                .map_err(|e| e.into_remote(RemoteOperation::Select))
        })
    }

    fn insert(&self, todo: NewTodo) -> RemoteFuture<'_, TodoItem> {
        Box::pin(async move {
            self.insert_row(todo)
                .await
                .map(TodoItem::from)
                .map_err(|e| e.into_remote(RemoteOperation::Insert))
        })
    }

    fn update(&self, filter: TodoFilter, patch: TodoPatch) -> RemoteFuture<'_, TodoItem> {
        Box::pin(async move {
            self.update_row(filter, patch)
                .await
                .map(TodoItem::from)
                .map_err(|e| e.into_remote(RemoteOperation::Update))
        })
    }

    fn delete(&self, filter: TodoFilter) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.delete_row(filter)
                .await
                .map_err(|e| e.into_remote(RemoteOperation::Delete))
        })
    }
}

/// `id` and `user_id` equality filters
fn scope(filter: TodoFilter) -> [(&'static str, String); 2] {
    [
        ("id", format!("eq.{}", filter.id)),
        ("user_id", format!("eq.{}", filter.owner_id)),
    ]
}

async fn check(response: Response) -> Result<Response, SupabaseError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(SupabaseError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(SupabaseError::ApiError {
                status: status.as_u16(),
                message: body,
            })
        },
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
    response
        .json::<T>()
        .await
        .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()))
}

/// First row of a `return=representation` array
async fn single(response: Response) -> Result<TodoRow, SupabaseError> {
    parse::<Vec<TodoRow>>(response)
        .await?
        .into_iter()
        .next()
        .ok_or(SupabaseError::EmptyResponse)
}
