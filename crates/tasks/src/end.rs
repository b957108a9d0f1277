use control::SimContext;
use shared::protocol::FrameInfo;

use crate::{objects::ObjectSet, task::TaskBehavior};

#[derive(Debug, Default)]
pub struct End;

impl TaskBehavior for End {
    fn kind(&self) -> &'static str {
        "end"
    }

    fn title(&self) -> &'static str {
        "Thank you!\n"
    }

    fn default_text(&self) -> &'static str {
        "You have completed every task. Please remove your headset.\n\n"
    }

    fn on_start(&mut self, _round: usize, _ctx: &mut SimContext, _objects: &mut ObjectSet) {}

    fn on_update(&mut self, _frame: &FrameInfo, _ctx: &mut SimContext, _objects: &mut ObjectSet) -> bool {
        false
    }
}
