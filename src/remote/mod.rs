//! The closed set of operations executed inside the page and the control
//! surface that orchestrates them per command.

pub mod ops;
pub mod surface;

pub use ops::{safe_json, RemoteOp};
pub use surface::{allowed_url, ConnectionState, PanelState, RemoteControl};
