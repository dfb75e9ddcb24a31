//! Handlers 模块

pub mod auth;
pub mod chillers;
pub mod control;
pub mod metrics;
pub mod power_log;
pub mod status;
pub mod timers;

pub use auth::*;
pub use chillers::*;
pub use control::*;
pub use metrics::*;
pub use power_log::*;
pub use status::*;
pub use timers::*;
