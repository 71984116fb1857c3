use std::sync::Arc;

use super::{ScaleBinding, ScaleSlot, SlotBinding};
use crate::figure::Axis;
use crate::model::SelectorModel;
use crate::scale::ScaleView;

/// Binds `x_scale` to the x axis and `y_scale` to the y axis. The two slots are
/// created and torn down independently.
#[derive(Debug)]
pub struct XYScaleBinding {
    slots: [SlotBinding; 2],
}

impl XYScaleBinding {
    pub fn new() -> Self {
        Self {
            slots: [
                SlotBinding::new(ScaleSlot::XScale),
                SlotBinding::new(ScaleSlot::YScale),
            ],
        }
    }

    pub fn x_scale(&self) -> Option<&Arc<dyn ScaleView>> {
        self.slots[0].view()
    }

    pub fn y_scale(&self) -> Option<&Arc<dyn ScaleView>> {
        self.slots[1].view()
    }
}

impl Default for XYScaleBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleBinding for XYScaleBinding {
    fn slots(&self) -> &[SlotBinding] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [SlotBinding] {
        &mut self.slots
    }

    fn axis(&self, slot: ScaleSlot, _model: &SelectorModel) -> Axis {
        match slot {
            ScaleSlot::YScale => Axis::Y,
            _ => Axis::X,
        }
    }
}
