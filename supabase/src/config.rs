//! Connection settings for the remote todos table.
//!
//! Read from the environment:
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `SUPABASE_URL` | yes | |
//! | `SUPABASE_ANON_KEY` | yes | |
//! | `SUPABASE_ACCESS_TOKEN` | no | the anon key |
//! | `DAYBOOK_TODOS_TABLE` | no | `todos` |

use crate::error::SupabaseError;

/// Default table holding todo rows
pub const DEFAULT_TABLE: &str = "todos";

/// Project URL, keys and table name
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public API key sent as `apikey`
    pub anon_key: String,
    /// Signed-in user's JWT; row-level security scopes rows with it
    pub access_token: Option<String>,
    /// Table name
    pub table: String,
}

impl SupabaseConfig {
    /// Creates a config for `url` with the anon key and the default table
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            access_token: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Load from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingConfig`] when the URL or anon key is
    /// not set.
    pub fn from_env() -> Result<Self, SupabaseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingConfig`] when the URL or anon key is
    /// missing or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SupabaseError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(SupabaseError::MissingConfig(key))
        };

        let mut config = Self::new(required("SUPABASE_URL")?, required("SUPABASE_ANON_KEY")?);
        config.access_token = lookup("SUPABASE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(table) = lookup("DAYBOOK_TODOS_TABLE").filter(|t| !t.trim().is_empty()) {
            config.table = table;
        }

        Ok(config)
    }

    /// Set the user's access token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the table name
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// REST endpoint of the table
    #[must_use]
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }

    /// Token for the `Authorization` header
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("table", &self.table)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}
