use std::sync::Arc;

use super::{ScaleBinding, ScaleSlot, SlotBinding};
use crate::figure::Axis;
use crate::model::{field, SelectorModel};
use crate::scale::ScaleView;

/// Binds the model's `scale` to the axis selected by its `orientation`
/// (`vertical` binds y, anything else binds x)
#[derive(Debug)]
pub struct SingleScaleBinding {
    slots: [SlotBinding; 1],
}

impl SingleScaleBinding {
    pub fn new() -> Self {
        Self {
            slots: [SlotBinding::new(ScaleSlot::Scale)],
        }
    }

    pub fn scale(&self) -> Option<&Arc<dyn ScaleView>> {
        self.slots[0].view()
    }
}

impl Default for SingleScaleBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleBinding for SingleScaleBinding {
    fn slots(&self) -> &[SlotBinding] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [SlotBinding] {
        &mut self.slots
    }

    fn axis(&self, _slot: ScaleSlot, model: &SelectorModel) -> Axis {
        model.orientation().axis()
    }

    fn layout_fields(&self) -> &'static [&'static str] {
        &[field::ORIENTATION]
    }
}
