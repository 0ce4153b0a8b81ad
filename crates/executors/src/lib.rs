//! Executors: the side-effecting capability boundaries the dispatcher
//! invokes. Each takes a typed action descriptor and returns an outcome or a
//! declared failure; none of them share mutable state with the dispatcher.

pub mod automation;
pub mod files;
pub mod web;

pub use automation::{AutomationExecutor, DesktopBackend, HeadlessDesktop};
pub use files::FileExecutor;
pub use web::WebExecutor;
