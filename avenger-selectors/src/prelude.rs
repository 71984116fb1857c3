pub use crate::binding::{
    ScaleBinding, ScaleSlot, SingleScaleBinding, SlotStatus, XYScaleBinding,
};
pub use crate::config::SelectorConfig;
pub use crate::dates::{convert_dates, parse_date, SelectionValue};
pub use crate::error::AvengerSelectorError;
pub use crate::event::{Handler, Notifier, SelectorEvent, Subscription};
pub use crate::figure::{Axis, Figure, Margin, MarkView};
pub use crate::model::{field, CustomMessage, HostModel, ModelId, Orientation, SelectorModel};
pub use crate::scale::{expanded_domain, ScaleView};
pub use crate::selector::{
    Anchor, DetachHandle, Selector, SelectorContext, SelectorView, XSelectorView, XYSelectorView,
};
