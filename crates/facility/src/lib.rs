pub mod config;
pub mod lifecycle;
pub mod session;

pub use config::{ConfigError, SceneConfig};
pub use lifecycle::{ResourceLedger, TeardownReport};
pub use session::{BuildReport, RenderMode, SceneSession};
