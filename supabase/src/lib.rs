//! # Daybook Supabase
//!
//! [`TodoStore`](daybook_todos::TodoStore) implementation over a Supabase
//! project's PostgREST API.
//!
//! ```no_run
//! use daybook_supabase::{SupabaseConfig, SupabaseTodoStore};
//!
//! let store = SupabaseTodoStore::new(
//!     SupabaseConfig::new("https://xyz.supabase.co", "anon-key").with_access_token("user-jwt"),
//! );
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod row;

pub use client::SupabaseTodoStore;
pub use config::SupabaseConfig;
pub use error::SupabaseError;
pub use row::TodoRow;
