use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use crate::error::AvengerSelectorError;
use crate::event::{SelectorEvent, Subscription};
use crate::figure::{Axis, Figure};
use crate::model::{field, HostModel, ModelId, SelectorModel};
use crate::scale::ScaleView;

pub mod single;
pub mod xy;

pub use single::SingleScaleBinding;
pub use xy::XYScaleBinding;

/// In-flight scale view creation owned by a selector view
pub type ScaleWork = BoxFuture<'static, ScaleCreation>;

/// A scale declared on the selector model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScaleSlot {
    /// The single scale of a one dimensional selector
    Scale,
    XScale,
    YScale,
}

impl ScaleSlot {
    /// Model field holding the slot's scale
    pub fn field(self) -> &'static str {
        match self {
            ScaleSlot::Scale => field::SCALE,
            ScaleSlot::XScale => field::X_SCALE,
            ScaleSlot::YScale => field::Y_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Unbound,
    Creating,
    Bound,
}

/// Completion of a scale view creation
#[derive(Debug)]
pub struct ScaleCreation {
    pub slot: ScaleSlot,
    pub generation: u64,
    pub scale: ModelId,
    pub view: Result<Arc<dyn ScaleView>, AvengerSelectorError>,
}

/// What a binding needs from its selector while handling events
pub struct BindingContext<'a> {
    pub figure: &'a dyn Figure,
    pub model: &'a SelectorModel,
    pub events: &'a UnboundedSender<SelectorEvent>,
}

#[derive(Debug)]
enum SlotState {
    Unbound,
    Creating {
        generation: u64,
    },
    Bound {
        view: Arc<dyn ScaleView>,
        generation: u64,
        domain_changed: Subscription,
    },
}

/// Lifecycle of the scale view bound to one slot.
///
/// `unbound -> creating -> bound -> unbound`. Leaving `bound` releases the domain listener and
/// removes the view. Every transition out of a state bumps the generation, so a creation that
/// finishes after its slot moved on is recognized and its view removed.
#[derive(Debug)]
pub struct SlotBinding {
    slot: ScaleSlot,
    generation: u64,
    state: SlotState,
}

impl SlotBinding {
    pub fn new(slot: ScaleSlot) -> Self {
        Self {
            slot,
            generation: 0,
            state: SlotState::Unbound,
        }
    }

    pub fn slot(&self) -> ScaleSlot {
        self.slot
    }

    pub fn status(&self) -> SlotStatus {
        match self.state {
            SlotState::Unbound => SlotStatus::Unbound,
            SlotState::Creating { .. } => SlotStatus::Creating,
            SlotState::Bound { .. } => SlotStatus::Bound,
        }
    }

    pub fn view(&self) -> Option<&Arc<dyn ScaleView>> {
        match &self.state {
            SlotState::Bound { view, .. } => Some(view),
            _ => None,
        }
    }

    /// Release the bound view, or abandon an in-flight creation
    pub fn teardown(&mut self) {
        self.generation += 1;
        match std::mem::replace(&mut self.state, SlotState::Unbound) {
            SlotState::Bound {
                view,
                domain_changed,
                ..
            } => {
                debug!(slot = %self.slot, scale = %view.model_id(), "removing scale view");
                drop(domain_changed);
                view.remove();
            }
            SlotState::Creating { generation } => {
                debug!(slot = %self.slot, generation, "abandoning in-flight scale creation");
            }
            SlotState::Unbound => {}
        }
    }

    /// Tear down the current view, then start creating a view for `scale`.
    ///
    /// Returns `None` when no scale is declared; the slot is left unbound without
    /// asking the host for anything.
    pub fn create(&mut self, scale: Option<ModelId>, host: &Arc<dyn HostModel>) -> Option<ScaleWork> {
        self.teardown();
        let Some(scale) = scale else {
            trace!(slot = %self.slot, "no scale declared");
            return None;
        };

        let generation = self.generation;
        let slot = self.slot;
        let host = host.clone();
        self.state = SlotState::Creating { generation };
        debug!(%slot, %scale, generation, "creating scale view");

        Some(
            async move {
                let view = host.create_scale_view(&scale).await;
                ScaleCreation {
                    slot,
                    generation,
                    scale,
                    view,
                }
            }
            .boxed(),
        )
    }

    /// Bind the view produced by a creation, or remove it if the creation was superseded
    pub fn on_created(&mut self, creation: ScaleCreation, axis: Axis, cx: &BindingContext<'_>) {
        let current = matches!(
            self.state,
            SlotState::Creating { generation } if generation == creation.generation
        );

        let view = match creation.view {
            Ok(view) => view,
            Err(err) => {
                if current {
                    warn!(slot = %self.slot, "leaving scale unbound: {err}");
                    self.state = SlotState::Unbound;
                }
                return;
            }
        };

        if !current {
            debug!(
                slot = %self.slot,
                scale = %creation.scale,
                generation = creation.generation,
                "removing superseded scale view"
            );
            view.remove();
            return;
        }

        // Pad before listening so the initial expansion cannot feed back as a domain change
        update_scale_domain(view.as_ref(), axis, cx.figure);
        set_range(view.as_ref(), axis, cx.figure);

        let events = cx.events.clone();
        let slot = self.slot;
        let generation = creation.generation;
        let domain_changed = view.on_domain_changed(Arc::new(move |_: &()| {
            let _ = events.send(SelectorEvent::DomainChanged { slot, generation });
        }));

        self.state = SlotState::Bound {
            view,
            generation,
            domain_changed,
        };
    }

    pub fn on_domain_changed(&self, generation: u64, axis: Axis, figure: &dyn Figure) {
        match &self.state {
            SlotState::Bound {
                view,
                generation: bound,
                ..
            } if *bound == generation => update_scale_domain(view.as_ref(), axis, figure),
            _ => trace!(slot = %self.slot, generation, "ignoring domain change of a released view"),
        }
    }

    /// Recompute padding and range of the bound view from the figure's current layout
    pub fn sync(&self, axis: Axis, figure: &dyn Figure) {
        if let Some(view) = self.view() {
            update_scale_domain(view.as_ref(), axis, figure);
            set_range(view.as_ref(), axis, figure);
        }
    }
}

/// Absorb the figure's padding for `view` into its domain
pub fn update_scale_domain(view: &dyn ScaleView, axis: Axis, figure: &dyn Figure) {
    let initial_range = figure.padded_range(axis, &view.model_id());
    let target_range = figure.range(axis);
    view.expand_domain(initial_range, target_range);
}

/// Push the figure's pixel range along `axis` into `view`
pub fn set_range(view: &dyn ScaleView, axis: Axis, figure: &dyn Figure) {
    view.set_range(figure.range(axis));
}

/// Strategy binding a selector's declared scale slots to live scale views
pub trait ScaleBinding: Send + 'static {
    fn slots(&self) -> &[SlotBinding];

    fn slots_mut(&mut self) -> &mut [SlotBinding];

    /// Figure axis `slot` maps onto
    fn axis(&self, slot: ScaleSlot, model: &SelectorModel) -> Axis;

    /// Model fields that change how bound scales map onto the figure, without
    /// changing which scales are bound
    fn layout_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn slot(&self, slot: ScaleSlot) -> Option<&SlotBinding> {
        self.slots().iter().find(|binding| binding.slot() == slot)
    }

    fn scale_view(&self, slot: ScaleSlot) -> Option<&Arc<dyn ScaleView>> {
        self.slot(slot).and_then(SlotBinding::view)
    }

    /// Rebind every slot. Each slot's creation is independent of the others.
    fn create_scales(&mut self, model: &SelectorModel) -> Vec<ScaleWork> {
        let host = model.host().clone();
        self.slots_mut()
            .iter_mut()
            .filter_map(|binding| {
                let scale = model.scale(binding.slot());
                binding.create(scale, &host)
            })
            .collect()
    }

    /// Rebind a single slot, leaving the others untouched
    fn create_scale(&mut self, slot: ScaleSlot, model: &SelectorModel) -> Option<ScaleWork> {
        let host = model.host().clone();
        let scale = model.scale(slot);
        self.slots_mut()
            .iter_mut()
            .find(|binding| binding.slot() == slot)?
            .create(scale, &host)
    }

    fn on_scale_created(&mut self, creation: ScaleCreation, cx: &BindingContext<'_>) {
        let axis = self.axis(creation.slot, cx.model);
        match self
            .slots_mut()
            .iter_mut()
            .find(|binding| binding.slot() == creation.slot)
        {
            Some(binding) => binding.on_created(creation, axis, cx),
            None => {
                warn!(slot = %creation.slot, "scale created for a slot this selector does not have");
                if let Ok(view) = creation.view {
                    view.remove();
                }
            }
        }
    }

    fn on_domain_changed(&self, slot: ScaleSlot, generation: u64, cx: &BindingContext<'_>) {
        if let Some(binding) = self.slot(slot) {
            binding.on_domain_changed(generation, self.axis(slot, cx.model), cx.figure);
        }
    }

    /// Recompute padding and range of every bound scale
    fn sync_scales(&self, cx: &BindingContext<'_>) {
        for binding in self.slots() {
            binding.sync(self.axis(binding.slot(), cx.model), cx.figure);
        }
    }

    fn teardown(&mut self) {
        for binding in self.slots_mut() {
            binding.teardown();
        }
    }
}
