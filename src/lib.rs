//! dvdebug - drive the Dragvertising superadmin debug panel over CDP.
//!
//! The crate attaches to a running Chromium-family browser through its
//! DevTools endpoint. A long-lived page-side agent keeps the presence
//! beacon, component injector, and control channel alive on one tab;
//! one-shot commands (status, open, close, toggle, tool selection, live
//! watch) drive the panel from the terminal.

pub mod agent;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod error;
pub mod page;
pub mod remote;
