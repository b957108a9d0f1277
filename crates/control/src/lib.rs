pub mod arm;
pub mod bindings;
pub mod condition;
pub mod context;
pub mod grasping;
pub mod module;
pub mod robot;
pub mod services;
pub mod sim;
pub mod tuning;

pub use arm::{ArmControl, ArmKind};
pub use bindings::{Binding, ButtonBindings};
pub use condition::{Condition, ConditionBuilder};
pub use context::{GoalAdjustment, SimContext};
pub use grasping::Grasping;
pub use module::ControlModule;
pub use services::Services;
pub use sim::SimRig;
