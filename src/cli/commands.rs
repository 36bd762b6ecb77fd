use std::fmt::Write as _;
use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::storage::{StorageHandle, TodoRecord};
use crate::view::{Filter, TodoView};
use crate::web::{self, AppState};

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind_address` from the config)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Todo text; surrounding whitespace is trimmed
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Which todos to print: all, active or completed
    #[arg(long, default_value = "all")]
    pub filter: Filter,
}

#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    /// Confirm that every todo should be deleted
    #[arg(long)]
    pub yes: bool,
}

pub fn serve(storage: StorageHandle, bind: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let database = storage.database_path().display().to_string();
    runtime.block_on(async move {
        let app = web::router(AppState::new(storage));
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("binding {bind}"))?;
        tracing::info!(%database, "server running on http://{bind}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serving http")?;
        tracing::info!("server stopped");
        Ok::<_, anyhow::Error>(())
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

pub fn add_todo(storage: &StorageHandle, args: AddArgs) -> Result<()> {
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        bail!("todo text cannot be empty");
    }
    let todo = storage.create(&text).context("creating todo")?;
    println!("Created todo #{}", todo.id);
    Ok(())
}

pub fn list_todos(storage: &StorageHandle, args: ListArgs) -> Result<()> {
    let view = TodoView::build(storage.list().context("listing todos")?, args.filter);
    print!("{}", format_listing(&view));
    Ok(())
}

pub fn reset_todos(storage: &StorageHandle, args: ResetArgs) -> Result<()> {
    if !args.yes {
        bail!("refusing to delete every todo without --yes");
    }
    storage.reset().context("resetting todo store")?;
    println!("All todos deleted.");
    Ok(())
}

fn format_listing(view: &TodoView) -> String {
    let mut out = String::new();
    if view.visible.is_empty() {
        let _ = writeln!(&mut out, "No {} todos.", view.filter);
    }
    for todo in &view.visible {
        let _ = writeln!(&mut out, "{}", format_todo(todo));
    }
    let noun = if view.remaining_count == 1 { "item" } else { "items" };
    let _ = writeln!(
        &mut out,
        "{} {noun} left, {} completed",
        view.remaining_count, view.completed_count
    );
    out
}

fn format_todo(todo: &TodoRecord) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    format!(
        "[{mark}] #{}  {}  (updated {})",
        todo.id,
        todo.text,
        format_timestamp(todo.updated_at)
    )
}

fn format_timestamp(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch.to_string()))
        .unwrap_or_else(|_| epoch.to_string())
}
