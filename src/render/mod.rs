//! HTML fragments for the todo regions htmx swaps independently.
//!
//! A fragment renders the same markup whether it answers the request
//! directly or rides along out of band; placement only decides whether the
//! root element carries `hx-swap-oob`.

use std::fmt::{self, Display, Formatter};

use strum::IntoEnumIterator;

use crate::storage::TodoRecord;
use crate::view::{Filter, TodoView};

mod page;

pub use page::render_page;

const OOB_ATTR: &str = r#" hx-swap-oob="true""#;

#[derive(Debug, Clone, Copy)]
pub enum Fragment<'a> {
    TodoItem { todo: &'a TodoRecord, editing: bool },
    TodoList(&'a TodoView),
    ActiveCounter(&'a TodoView),
    ClearCompleted(&'a TodoView),
    ToggleAll(&'a TodoView),
    /// `section.main`: toggle-all plus the list. Hidden while the store is empty.
    Main(&'a TodoView),
    /// `footer.footer`: counter, filter links and clear-completed.
    Footer(&'a TodoView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Primary,
    OutOfBand,
}

impl Placement {
    fn attr(self) -> &'static str {
        match self {
            Placement::Primary => "",
            Placement::OutOfBand => OOB_ATTR,
        }
    }
}

pub fn render(fragment: Fragment<'_>, placement: Placement) -> String {
    Rendered {
        fragment,
        placement,
    }
    .to_string()
}

/// Concatenates a primary fragment with the out-of-band fragments that keep
/// sibling regions in step with it.
pub fn render_with_oob(primary: Option<Fragment<'_>>, oob: &[Fragment<'_>]) -> String {
    let mut html = primary
        .map(|fragment| render(fragment, Placement::Primary))
        .unwrap_or_default();
    for fragment in oob {
        html.push_str(&render(*fragment, Placement::OutOfBand));
    }
    html
}

struct Rendered<'a> {
    fragment: Fragment<'a>,
    placement: Placement,
}

impl Display for Rendered<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let oob = self.placement.attr();
        match self.fragment {
            Fragment::TodoItem { todo, editing } => write_item(f, todo, editing, oob),
            Fragment::TodoList(view) => write_list(f, view, oob),
            Fragment::ActiveCounter(view) => write_counter(f, view.remaining_count, oob),
            Fragment::ClearCompleted(view) => write_clear_completed(f, view, oob),
            Fragment::ToggleAll(view) => write_toggle_all(f, view, oob),
            Fragment::Main(view) => write_main(f, view, oob),
            Fragment::Footer(view) => write_footer(f, view, oob),
        }
    }
}

fn hidden_when_empty(view: &TodoView) -> &'static str {
    if view.is_empty() {
        " hidden"
    } else {
        ""
    }
}

fn write_item(f: &mut Formatter<'_>, todo: &TodoRecord, editing: bool, oob: &str) -> fmt::Result {
    let id = todo.id;
    let class = match (editing, todo.completed) {
        (true, _) => r#" class="editing""#,
        (false, true) => r#" class="completed""#,
        (false, false) => "",
    };
    write!(
        f,
        r#"<li id="todo-{id}"{class} hx-target="this" hx-swap="outerHTML"{oob}>"#
    )?;
    if editing {
        write!(
            f,
            r#"<input class="edit" name="todo" value="{text}" autofocus hx-patch="/todos/{id}/edit" hx-trigger="keyup[key=='Enter'], blur" hx-on:keyup="if (event.key === 'Escape') htmx.ajax('GET', '/todos/{id}', {{target: this.closest('li'), swap: 'outerHTML'}})">"#,
            text = Escaped(&todo.text),
        )?;
    } else {
        let checked = if todo.completed { " checked" } else { "" };
        write!(
            f,
            r#"<div class="view"><input class="toggle" type="checkbox"{checked} hx-patch="/todos/{id}/toggle"><label hx-get="/todos/{id}/edit" hx-trigger="dblclick">{text}</label><button class="destroy" hx-delete="/todos/{id}"></button></div>"#,
            text = Escaped(&todo.text),
        )?;
    }
    f.write_str("</li>")
}

fn write_list(f: &mut Formatter<'_>, view: &TodoView, oob: &str) -> fmt::Result {
    f.write_str(r#"<ul id="todo-list" class="todo-list""#)?;
    // A filtered list goes stale whenever an item changes status elsewhere.
    // New items are kept out of it by the create handler instead.
    if view.filter != Filter::All {
        write!(
            f,
            r#" hx-get="/todos?filter={filter}" hx-trigger="item-updated from:body" hx-swap="outerHTML""#,
            filter = view.filter,
        )?;
    }
    write!(f, "{oob}>")?;
    for todo in &view.visible {
        write_item(f, todo, false, "")?;
    }
    f.write_str("</ul>")
}

fn write_counter(f: &mut Formatter<'_>, remaining: usize, oob: &str) -> fmt::Result {
    let noun = if remaining == 1 { "item" } else { "items" };
    write!(
        f,
        r#"<span id="todo-count" class="todo-count"{oob}><strong>{remaining}</strong> {noun} left</span>"#
    )
}

fn write_clear_completed(f: &mut Formatter<'_>, view: &TodoView, oob: &str) -> fmt::Result {
    if !view.has_completed {
        return write!(f, r#"<span id="clear-completed"{oob}></span>"#);
    }
    write!(
        f,
        r##"<button id="clear-completed" class="clear-completed" hx-patch="/clear-completed?filter={filter}" hx-target="#todo-list" hx-swap="outerHTML"{oob}>Clear completed</button>"##,
        filter = view.filter,
    )
}

fn write_toggle_all(f: &mut Formatter<'_>, view: &TodoView, oob: &str) -> fmt::Result {
    let checked = if view.all_completed { " checked" } else { "" };
    let hidden = hidden_when_empty(view);
    write!(
        f,
        r##"<input id="toggle-all" class="toggle-all" type="checkbox"{checked}{hidden} hx-put="/complete-all?filter={filter}" hx-target="#todo-list" hx-swap="outerHTML"{oob}>"##,
        filter = view.filter,
    )
}

fn write_main(f: &mut Formatter<'_>, view: &TodoView, oob: &str) -> fmt::Result {
    let hidden = hidden_when_empty(view);
    write!(f, r#"<section id="main" class="main"{hidden}{oob}>"#)?;
    write_toggle_all(f, view, "")?;
    f.write_str(r#"<label for="toggle-all">Mark all as complete</label>"#)?;
    write_list(f, view, "")?;
    f.write_str("</section>")
}

fn write_footer(f: &mut Formatter<'_>, view: &TodoView, oob: &str) -> fmt::Result {
    let hidden = hidden_when_empty(view);
    write!(f, r#"<footer id="footer" class="footer"{hidden}{oob}>"#)?;
    write_counter(f, view.remaining_count, "")?;
    f.write_str(r#"<ul class="filters">"#)?;
    for filter in Filter::iter() {
        let selected = if filter == view.filter {
            r#" class="selected""#
        } else {
            ""
        };
        write!(
            f,
            r#"<li><a href="{path}"{selected}>{label}</a></li>"#,
            path = filter.page_path(),
            label = filter.label(),
        )?;
    }
    f.write_str("</ul>")?;
    write_clear_completed(f, view, "")?;
    f.write_str("</footer>")
}

/// Escapes text for use in element content and double-quoted attributes.
pub(crate) struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(idx) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..idx])?;
            let entity = match rest.as_bytes()[idx] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(entity)?;
            rest = &rest[idx + 1..];
        }
        f.write_str(rest)
    }
}
