pub mod drawing;
pub mod end;
pub mod erasing;
pub mod objects;
pub mod pouring;
pub mod task;
pub mod telemetry;
pub mod tuning;
pub mod tutorial;

pub use drawing::{Drawing, DrawingOptions};
pub use end::End;
pub use erasing::{Erasing, ErasingOptions};
pub use objects::{load_objects, AssetLoader, ObjectSet, SimObject};
pub use pouring::{Pouring, PouringOptions};
pub use task::{RoundOutcome, Task, TaskBehavior, TaskOptions};
pub use tutorial::Tutorial;
