//! CDP access to the attached browser: tab discovery and in-page evaluation.

pub mod tabs;

pub use tabs::{list_pages, resolve_active_tab, PageInfo, TabHandle};
