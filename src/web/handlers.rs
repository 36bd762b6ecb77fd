//! One handler per endpoint.
//!
//! Every mutating handler performs its single store mutation and then
//! re-reads the whole list in the same blocking task, so the counter and
//! affordance fragments it emits always describe the post-mutation state.

use axum::{extract::State, response::Html};

use super::extract::{TodoId, TodoText};
use super::{ActiveFilter, AppState, Fragments, Signal, WebError};
use crate::render::{render, render_page, render_with_oob, Fragment, Placement};
use crate::storage::StoreError;
use crate::view::{Filter, TodoView};

type HandlerResult<T = Fragments> = Result<T, WebError>;

pub async fn index(State(state): State<AppState>) -> HandlerResult<Html<String>> {
    page(&state, Filter::All).await
}

pub async fn active(State(state): State<AppState>) -> HandlerResult<Html<String>> {
    page(&state, Filter::Active).await
}

pub async fn completed(State(state): State<AppState>) -> HandlerResult<Html<String>> {
    page(&state, Filter::Completed).await
}

async fn page(state: &AppState, filter: Filter) -> HandlerResult<Html<String>> {
    let view = snapshot(state, filter).await?;
    Ok(Html(render_page(&view)))
}

async fn snapshot(state: &AppState, filter: Filter) -> HandlerResult<TodoView> {
    let todos = state.run(|store| store.list()).await?;
    Ok(TodoView::build(todos, filter))
}

pub async fn list_todos(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let view = snapshot(&state, filter).await?;
    Ok(Fragments::new(render(
        Fragment::TodoList(&view),
        Placement::Primary,
    )))
}

pub async fn get_todo(State(state): State<AppState>, TodoId(id): TodoId) -> HandlerResult {
    item_row(&state, id, false).await
}

pub async fn edit_todo(State(state): State<AppState>, TodoId(id): TodoId) -> HandlerResult {
    item_row(&state, id, true).await
}

async fn item_row(state: &AppState, id: i64, editing: bool) -> HandlerResult {
    let todo = state.run(move |store| store.get(id)).await?;
    Ok(Fragments::new(render(
        Fragment::TodoItem {
            todo: &todo,
            editing,
        },
        Placement::Primary,
    )))
}

pub async fn create_todo(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
    TodoText(text): TodoText,
) -> HandlerResult {
    let created = state
        .run(move |store| match store.create(&text) {
            Ok(todo) => Ok(Some((todo, store.list()?))),
            Err(StoreError::Validation(_)) => Ok(None),
            Err(err) => Err(err),
        })
        .await?;
    let Some((todo, todos)) = created else {
        tracing::debug!("ignoring blank todo");
        return Ok(Fragments::empty());
    };

    let view = TodoView::build(todos, filter);
    let html = if view.total_count == 1 {
        sections(&view)
    } else {
        // The form appends to whatever list is on screen.
        let row = filter.matches(&todo).then_some(Fragment::TodoItem {
            todo: &todo,
            editing: false,
        });
        render_with_oob(
            row,
            &[
                Fragment::ActiveCounter(&view),
                Fragment::ClearCompleted(&view),
                Fragment::ToggleAll(&view),
            ],
        )
    };
    Ok(Fragments::new(html).with_signal(Signal::ItemCreated))
}

/// Saves an edit; blank text deletes the todo instead.
pub async fn update_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    ActiveFilter(filter): ActiveFilter,
    TodoText(text): TodoText,
) -> HandlerResult {
    if text.trim().is_empty() {
        return remove(&state, id, filter).await;
    }
    let todo = state
        .run(move |store| store.update_text(id, &text))
        .await?;
    Ok(Fragments::new(render(
        Fragment::TodoItem {
            todo: &todo,
            editing: false,
        },
        Placement::Primary,
    )))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    remove(&state, id, filter).await
}

async fn remove(state: &AppState, id: i64, filter: Filter) -> HandlerResult {
    let todos = state
        .run(move |store| {
            store.delete(id)?;
            store.list()
        })
        .await?;
    let view = TodoView::build(todos, filter);
    let html = if view.is_empty() {
        sections(&view)
    } else {
        render_with_oob(
            None,
            &[
                Fragment::ActiveCounter(&view),
                Fragment::ClearCompleted(&view),
            ],
        )
    };
    Ok(Fragments::new(html).with_signal(Signal::ItemDeleted))
}

/// Both page sections out of band, for the mutations that move the store
/// between empty and non-empty.
fn sections(view: &TodoView) -> String {
    render_with_oob(None, &[Fragment::Main(view), Fragment::Footer(view)])
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let (todo, todos) = state
        .run(move |store| {
            let todo = store.toggle_status(id)?;
            Ok((todo, store.list()?))
        })
        .await?;
    let view = TodoView::build(todos, filter);
    let html = render_with_oob(
        Some(Fragment::TodoItem {
            todo: &todo,
            editing: false,
        }),
        &[
            Fragment::ActiveCounter(&view),
            Fragment::ClearCompleted(&view),
            Fragment::ToggleAll(&view),
        ],
    );
    Ok(Fragments::new(html).with_signal(Signal::ItemUpdated))
}

pub async fn clear_completed(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let todos = state
        .run(|store| {
            let cleared = store.delete_completed()?;
            tracing::debug!(cleared, "cleared completed todos");
            store.list()
        })
        .await?;
    let view = TodoView::build(todos, filter);
    let html = if view.is_empty() {
        sections(&view)
    } else {
        render_with_oob(
            Some(Fragment::TodoList(&view)),
            &[Fragment::ClearCompleted(&view)],
        )
    };
    Ok(Fragments::new(html).with_signal(Signal::CompletedCleared))
}

/// Completes every todo while any is active, otherwise reopens them all.
pub async fn toggle_all(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let todos = state
        .run(|store| {
            let any_remaining = store.list()?.iter().any(|todo| !todo.completed);
            store.set_all_status(any_remaining)?;
            store.list()
        })
        .await?;
    let view = TodoView::build(todos, filter);
    let html = render_with_oob(
        Some(Fragment::TodoList(&view)),
        &[
            Fragment::ActiveCounter(&view),
            Fragment::ClearCompleted(&view),
            Fragment::ToggleAll(&view),
        ],
    );
    Ok(Fragments::new(html).with_signal(Signal::AllToggled))
}

pub async fn active_counter(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let view = snapshot(&state, filter).await?;
    Ok(Fragments::new(render(
        Fragment::ActiveCounter(&view),
        Placement::Primary,
    )))
}

pub async fn clear_completed_button(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let view = snapshot(&state, filter).await?;
    Ok(Fragments::new(render(
        Fragment::ClearCompleted(&view),
        Placement::Primary,
    )))
}

pub async fn toggle_all_checkbox(
    State(state): State<AppState>,
    ActiveFilter(filter): ActiveFilter,
) -> HandlerResult {
    let view = snapshot(&state, filter).await?;
    Ok(Fragments::new(render(
        Fragment::ToggleAll(&view),
        Placement::Primary,
    )))
}

/// Wipes the store. Meant for demo and end-to-end test environments.
pub async fn reset(State(state): State<AppState>) -> HandlerResult {
    state.run(|store| store.reset()).await?;
    tracing::warn!("todo store reset over http");
    Ok(Fragments::empty())
}
