//! Presentation aggregates derived from a snapshot of the todo store.
//!
//! Every count here is taken over the full snapshot, whatever the filter;
//! only `visible` is narrowed. Handlers rebuild the view from a fresh read
//! after each mutation instead of adjusting a previous one.

use strum::{Display, EnumIter, EnumString};

use crate::storage::TodoRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(self, todo: &TodoRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !todo.completed,
            Filter::Completed => todo.completed,
        }
    }

    /// Infers the filter of the page that issued a request from its
    /// `Referer`. Only used when the request does not name a filter.
    pub fn from_referer(referer: Option<&str>) -> Self {
        match referer {
            Some(url) if url.contains("active") => Filter::Active,
            Some(url) if url.contains("completed") => Filter::Completed,
            _ => Filter::All,
        }
    }

    /// Path of the full page showing this filter.
    pub fn page_path(self) -> &'static str {
        match self {
            Filter::All => "/",
            Filter::Active => "/active",
            Filter::Completed => "/completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoView {
    pub filter: Filter,
    pub visible: Vec<TodoRecord>,
    pub total_count: usize,
    pub remaining_count: usize,
    pub completed_count: usize,
    pub has_completed: bool,
    pub all_completed: bool,
}

impl TodoView {
    pub fn build(snapshot: Vec<TodoRecord>, filter: Filter) -> Self {
        let total_count = snapshot.len();
        let remaining_count = snapshot.iter().filter(|todo| !todo.completed).count();
        let completed_count = total_count - remaining_count;
        let visible = snapshot
            .into_iter()
            .filter(|todo| filter.matches(todo))
            .collect();
        Self {
            filter,
            visible,
            total_count,
            remaining_count,
            completed_count,
            has_completed: completed_count > 0,
            all_completed: total_count > 0 && remaining_count == 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}
