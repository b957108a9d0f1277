pub mod builder;
pub mod controller;
pub mod runtime;
pub mod settings;

pub use builder::{build_condition, build_session, build_task};
pub use controller::SessionController;
pub use runtime::{run, RunExit};
pub use settings::{load_settings, Settings};
