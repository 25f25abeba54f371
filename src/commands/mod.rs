pub mod agent;
pub mod config;
pub mod inject;
pub mod panel;
pub mod status;
pub mod view;
pub mod watch;
