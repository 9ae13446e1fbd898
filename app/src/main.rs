//! Daybook demo binary
//!
//! Signs a user in, adds, completes and deletes a few todos and prints the
//! list and its statistics after each step.
//!
//! With `SUPABASE_URL` and `SUPABASE_ANON_KEY` set (a `.env` file works) the
//! list lives in the Supabase `todos` table and `DAYBOOK_USER_ID` names the
//! owner. Otherwise an in-memory table is used, and one insert is made to
//! fail to show how errors surface.

use daybook_core::environment::SystemClock;
use daybook_supabase::{SupabaseConfig, SupabaseError, SupabaseTodoStore};
use daybook_todos::mocks::InMemoryTodoStore;
use daybook_todos::{
    DaybookConfig, OperationOutcome, OwnerId, Priority, RemoteOperation, SessionHandle,
    TodoEnvironment, TodoStore, TodoSynchronizer, TracingNotifier,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DaybookConfig::from_env()?;
    let (store, owner, demo_store) = select_store()?;

    println!("=== Daybook ===\n");

    let todos = TodoSynchronizer::with_config(
        TodoEnvironment::new(store, Arc::new(TracingNotifier), Arc::new(SystemClock)),
        &config,
    );

    // The auth layer starts out restoring its session
    let session = SessionHandle::new();
    let follower = todos.follow_session(session.subscribe());

    println!(">>> Signing in as {owner}");
    session.sign_in(owner);
    wait_for_owner(&todos, Some(owner)).await;
    print_list(&todos).await;

    println!("\n>>> Adding todos");
    for (title, priority, subject) in [
        ("Revise chapter 4", Priority::High, Some("History")),
        ("Past paper 2019", Priority::Medium, Some("Maths")),
        ("Buy index cards", Priority::Low, None),
    ] {
        report(title, todos.create(title, priority, subject).await?);
    }

    if let Some(demo) = &demo_store {
        demo.fail_next(RemoteOperation::Insert);
        println!("\n>>> Adding a todo while the table is unreachable");
        report(
            "Essay plan",
            todos.create("Essay plan", Priority::High, Some("English")).await?,
        );
    }
    print_list(&todos).await;

    let listed = todos.todos().await;
    if let Some(first) = listed.first() {
        println!("\n>>> Completing \"{}\"", first.title);
        report(&first.title, todos.toggle_complete(first.id).await?);
    }
    if let Some(last) = listed.last() {
        println!("\n>>> Deleting \"{}\"", last.title);
        report(&last.title, todos.remove(last.id).await?);
    }
    print_list(&todos).await;

    let stats = todos.stats().await;
    println!(
        "\n{} of {} done ({}%), {} completed today, open: {} high / {} medium / {} low",
        stats.completed,
        stats.total,
        stats.completion_rate,
        stats.completed_today,
        stats.open_by_priority.high,
        stats.open_by_priority.medium,
        stats.open_by_priority.low,
    );

    println!("\n>>> Signing out");
    session.sign_out();
    wait_for_owner(&todos, None).await;
    println!("{} todos listed after sign-out", todos.todos().await.len());

    drop(session);
    follower.await?;
    todos.shutdown().await?;

    println!("\n=== Done ===");
    Ok(())
}

/// Supabase when configured, otherwise an in-memory table
fn select_store()
-> Result<(Arc<dyn TodoStore>, OwnerId, Option<InMemoryTodoStore>), Box<dyn std::error::Error>> {
    match SupabaseConfig::from_env() {
        Ok(supabase) => {
            let owner = match std::env::var("DAYBOOK_USER_ID") {
                Ok(id) => OwnerId::from_uuid(Uuid::parse_str(id.trim())?),
                Err(_) => return Err(SupabaseError::MissingConfig("DAYBOOK_USER_ID").into()),
            };
            tracing::info!(?supabase, "Using Supabase todo table");
            Ok((Arc::new(SupabaseTodoStore::new(supabase)), owner, None))
        },
        Err(SupabaseError::MissingConfig(var)) => {
            tracing::info!(missing = var, "Supabase not configured, using in-memory table");
            let store = InMemoryTodoStore::new();
            Ok((Arc::new(store.clone()), OwnerId::new(), Some(store)))
        },
        Err(error) => Err(error.into()),
    }
}

/// Wait for the session follower's load or clear to land
async fn wait_for_owner(todos: &TodoSynchronizer, owner: Option<OwnerId>) {
    for _ in 0..100 {
        let state = todos.snapshot().await;
        if state.owner == owner && (owner.is_none() || state.load_status.is_settled()) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    tracing::warn!("Gave up waiting for the list to load");
}

fn report(title: &str, outcome: OperationOutcome) {
    match outcome {
        OperationOutcome::Applied => println!("  ok      {title}"),
        OperationOutcome::Failed(reason) => println!("  failed  {title}: {reason}"),
        OperationOutcome::Skipped => println!("  skipped {title}"),
    }
}

async fn print_list(todos: &TodoSynchronizer) {
    println!("\nStatus: {:?}", todos.load_status().await);
    for todo in todos.todos().await {
        let mark = if todo.completed { "x" } else { " " };
        let subject = todo.subject.as_deref().unwrap_or("-");
        println!("  [{mark}] {:<6} {:<10} {}", todo.priority.as_str(), subject, todo.title);
    }
}
