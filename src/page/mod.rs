//! Page-side behavior, executed inside the attached tab via the CDP bridge:
//! the presence beacon and the debug-panel component injector.

pub mod beacon;
pub mod injector;
pub mod wait;

pub use beacon::PresenceBeacon;
pub use injector::{InjectPhase, Injector};
