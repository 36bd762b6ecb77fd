pub mod cli;
pub mod config;
pub mod render;
pub mod storage;
pub mod view;
pub mod web;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use storage::{StorageHandle, StoreError, TodoRecord};
pub use view::{Filter, TodoView};
