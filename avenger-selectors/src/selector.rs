use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use crate::binding::{
    BindingContext, ScaleBinding, ScaleCreation, ScaleSlot, ScaleWork, SingleScaleBinding,
    SlotBinding, SlotStatus, XYScaleBinding,
};
use crate::config::SelectorConfig;
use crate::dates::{convert_dates, SelectionValue};
use crate::event::{Handler, SelectorEvent, Subscription};
use crate::figure::{plot_size, Figure, MarkView};
use crate::marks::{AlignedMarks, MarkResolution, MarkViewResolver};
use crate::model::{field, CustomMessage, HostModel, SelectorModel};
use crate::scale::ScaleView;

/// Behavior of a concrete selector (interval, brush, lasso, ...).
///
/// Both hooks are called by [`SelectorView`] in response to model notifications, after any
/// mark or scale resolution they depend on has completed. Called from anywhere else they
/// must cope with [`SelectorContext::mark_views`] or the scale views being absent.
pub trait Selector: Send + 'static {
    /// Clear any in-progress or completed selection and its visual indicator
    fn reset(&mut self, cx: &SelectorContext<'_>);

    /// Redraw the selection indicator from the model's `selected` value
    fn selected_changed(&mut self, cx: &SelectorContext<'_>);
}

/// Group element the selector draws its indicator into, placed at the plot area origin
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub origin: [f32; 2],
}

/// Read access to a selector's resolved state, handed to [`Selector`] hooks
pub struct SelectorContext<'a> {
    model: &'a SelectorModel,
    figure: &'a dyn Figure,
    marks: Option<&'a [Option<Arc<dyn MarkView>>]>,
    scales: &'a dyn ScaleBinding,
    anchor: &'a Anchor,
    size: [f32; 2],
}

impl<'a> SelectorContext<'a> {
    pub fn model(&self) -> &'a SelectorModel {
        self.model
    }

    pub fn figure(&self) -> &'a dyn Figure {
        self.figure
    }

    /// Mark views aligned with the model's `marks`, `None` while the current list is resolving
    pub fn mark_views(&self) -> Option<&'a [Option<Arc<dyn MarkView>>]> {
        self.marks
    }

    /// The declared marks that currently have a view
    pub fn dependent_mark_views(&self) -> impl Iterator<Item = &'a Arc<dyn MarkView>> + 'a {
        self.marks.into_iter().flatten().flatten()
    }

    pub fn scale_view(&self, slot: ScaleSlot) -> Option<&'a Arc<dyn ScaleView>> {
        self.scales.scale_view(slot)
    }

    pub fn scale(&self) -> Option<&'a Arc<dyn ScaleView>> {
        self.scale_view(ScaleSlot::Scale)
    }

    pub fn x_scale(&self) -> Option<&'a Arc<dyn ScaleView>> {
        self.scale_view(ScaleSlot::XScale)
    }

    pub fn y_scale(&self) -> Option<&'a Arc<dyn ScaleView>> {
        self.scale_view(ScaleSlot::YScale)
    }

    pub fn anchor(&self) -> &'a Anchor {
        self.anchor
    }

    pub fn width(&self) -> f32 {
        self.size[0]
    }

    pub fn height(&self) -> f32 {
        self.size[1]
    }

    pub fn set_selected(&self, name: &str, value: impl Into<SelectionValue>) {
        write_selection(self.model, name, &value.into());
    }
}

/// Write `value` under `name`, with dates in the host's canonical form. The write goes
/// through the model's notification path, so this selector observes it like any other.
fn write_selection(model: &SelectorModel, name: &str, value: &SelectionValue) {
    model.set(name, convert_dates(value));
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Reset,
    SelectedChanged,
}

/// Requests teardown of a [`SelectorView`] from outside its event loop
#[derive(Debug, Clone)]
pub struct DetachHandle {
    sender: UnboundedSender<SelectorEvent>,
}

impl DetachHandle {
    /// Queue a detach. Returns `false` if the view no longer exists.
    pub fn detach(&self) -> bool {
        self.sender.send(SelectorEvent::Detach).is_ok()
    }
}

/// Next unit of work for the event loop
#[derive(Debug)]
enum Step {
    Event(SelectorEvent),
    Marks(MarkResolution),
    Scale(ScaleCreation),
}

/// Drives a [`Selector`] over a figure: resolves its marks, binds its scales through
/// the strategy `B`, and routes model and figure notifications to its hooks.
///
/// Notifications are queued as [`SelectorEvent`]s and handled one at a time by
/// [`SelectorView::step`], together with the completions of the view's own mark
/// resolutions and scale creations.
pub struct SelectorView<S: Selector, B: ScaleBinding> {
    selector: S,
    binding: B,
    model: SelectorModel,
    figure: Arc<dyn Figure>,
    config: SelectorConfig,
    anchor: Anchor,
    size: [f32; 2],
    marks: MarkViewResolver,
    mark_work: FuturesUnordered<BoxFuture<'static, MarkResolution>>,
    scale_work: FuturesUnordered<ScaleWork>,
    /// A `selected` change arrived while marks were resolving
    redraw_deferred: bool,
    sender: UnboundedSender<SelectorEvent>,
    receiver: UnboundedReceiver<SelectorEvent>,
    subscriptions: Vec<Subscription>,
    attached: bool,
}

/// Selector along one axis, chosen by the model's orientation
pub type XSelectorView<S> = SelectorView<S, SingleScaleBinding>;

/// Selector over the x/y plane
pub type XYSelectorView<S> = SelectorView<S, XYScaleBinding>;

impl<S: Selector, B: ScaleBinding> SelectorView<S, B> {
    pub fn new(selector: S, binding: B, model: Arc<dyn HostModel>, figure: Arc<dyn Figure>) -> Self {
        Self::with_config(selector, binding, model, figure, SelectorConfig::default())
    }

    pub fn with_config(
        selector: S,
        binding: B,
        model: Arc<dyn HostModel>,
        figure: Arc<dyn Figure>,
        config: SelectorConfig,
    ) -> Self {
        let (sender, receiver) = unbounded_channel();
        let anchor = Anchor {
            name: config.name.clone(),
            origin: [0.0, 0.0],
        };
        Self {
            selector,
            binding,
            model: SelectorModel::new(model),
            figure,
            config,
            anchor,
            size: [0.0, 0.0],
            marks: MarkViewResolver::new(),
            mark_work: FuturesUnordered::new(),
            scale_work: FuturesUnordered::new(),
            redraw_deferred: false,
            sender,
            receiver,
            subscriptions: Vec::new(),
            attached: false,
        }
    }

    /// Place the selector in its figure, start resolving its marks and scales, and
    /// subscribe to model and figure notifications. Does not wait for any resolution.
    #[tracing::instrument(skip_all)]
    pub fn attach(&mut self) {
        if self.attached {
            warn!(selector = %self.config.name, "selector is already attached");
            return;
        }
        self.attached = true;
        self.update_size();
        self.populate_mark_views();
        self.create_listeners();
        self.create_scales();
    }

    fn create_listeners(&mut self) {
        let host = self.model.host().clone();
        let mut subscriptions = vec![
            self.figure
                .on_layout_changed(self.forward(|_: &()| SelectorEvent::Relayout)),
            host.on_change(
                field::SELECTED,
                self.forward(|_: &Value| SelectorEvent::SelectedChanged),
            ),
            host.on_change(
                field::MARKS,
                self.forward(|_: &Value| SelectorEvent::MarksChanged),
            ),
            host.on_custom_message(self.forward(|msg: &Value| SelectorEvent::Custom(msg.clone()))),
        ];

        let slots = self
            .binding
            .slots()
            .iter()
            .map(SlotBinding::slot)
            .collect::<Vec<_>>();
        for slot in slots {
            subscriptions.push(host.on_change(
                slot.field(),
                self.forward(move |_: &Value| SelectorEvent::ScaleChanged(slot)),
            ));
        }
        for name in self.binding.layout_fields() {
            subscriptions.push(host.on_change(
                name,
                self.forward(|_: &Value| SelectorEvent::ScaleLayoutChanged),
            ));
        }

        self.subscriptions = subscriptions;
    }

    /// Handler that queues the event built by `event`
    fn forward<T: 'static>(
        &self,
        event: impl Fn(&T) -> SelectorEvent + Send + Sync + 'static,
    ) -> Handler<T> {
        let sender = self.sender.clone();
        Arc::new(move |value: &T| {
            // Only fails once the view itself is gone
            let _ = sender.send(event(value));
        })
    }

    /// Start resolving the model's marks against the figure's mark views
    pub fn populate_mark_views(&mut self) {
        self.request_marks(false);
    }

    fn request_marks(&mut self, redraw: bool) {
        let generation = self.marks.request();
        match self.model.marks() {
            Some(declared) => self.mark_work.push(MarkViewResolver::resolve(
                generation,
                self.figure.clone(),
                declared,
                redraw,
            )),
            None => {
                trace!("no marks declared");
                self.apply_marks(MarkResolution {
                    generation,
                    marks: AlignedMarks::default(),
                    redraw,
                });
            }
        }
    }

    fn apply_marks(&mut self, resolution: MarkResolution) {
        let MarkResolution {
            generation,
            marks,
            redraw,
        } = resolution;

        if !self.marks.apply(generation, marks.views) {
            return;
        }
        if self.config.report_unmatched_marks && !marks.unmatched.is_empty() {
            warn!(
                selector = %self.config.name,
                unmatched = ?marks.unmatched,
                "selector marks have no view in the figure"
            );
        }
        // An older pass may land while a newer one is still resolving
        if self.marks.is_pending() {
            self.redraw_deferred |= redraw;
            return;
        }
        let deferred = std::mem::take(&mut self.redraw_deferred);
        if redraw || deferred {
            self.invoke(Hook::SelectedChanged);
        }
    }

    fn selected_changed(&mut self) {
        if self.marks.is_pending() {
            trace!("deferring redraw until marks are resolved");
            self.redraw_deferred = true;
            return;
        }
        self.invoke(Hook::SelectedChanged);
    }

    /// Tear down the bound scale views and start creating views for the declared scales
    #[tracing::instrument(skip_all)]
    pub fn create_scales(&mut self) {
        let work = self.binding.create_scales(&self.model);
        self.scale_work.extend(work);
    }

    /// Recompute the plot area size and re-sync every bound scale with the figure's range
    pub fn relayout(&mut self) {
        self.update_size();
        let cx = BindingContext {
            figure: self.figure.as_ref(),
            model: &self.model,
            events: &self.sender,
        };
        self.binding.sync_scales(&cx);
    }

    fn update_size(&mut self) {
        self.size = plot_size(self.figure.as_ref());
        let margin = self.figure.margin();
        self.anchor.origin = [margin.left, margin.top];
    }

    pub fn set_selected(&self, name: &str, value: impl Into<SelectionValue>) {
        write_selection(&self.model, name, &value.into());
    }

    pub fn detach_handle(&self) -> DetachHandle {
        DetachHandle {
            sender: self.sender.clone(),
        }
    }

    /// Handle one event, waiting until a notification arrives or pending work completes.
    /// Queued notifications are handled before completions.
    pub async fn step(&mut self) -> bool {
        let step = match self.receiver.try_recv() {
            Ok(event) => Step::Event(event),
            Err(_) => tokio::select! {
                biased;
                Some(event) = self.receiver.recv() => Step::Event(event),
                Some(creation) = self.scale_work.next() => Step::Scale(creation),
                Some(resolution) = self.mark_work.next() => Step::Marks(resolution),
                else => return false,
            },
        };
        self.handle(step).await;
        true
    }

    /// Handle events until nothing is queued and no work is pending
    pub async fn settle(&mut self) {
        loop {
            let step = match self.receiver.try_recv() {
                Ok(event) => Step::Event(event),
                Err(_) => tokio::select! {
                    biased;
                    Some(creation) = self.scale_work.next() => Step::Scale(creation),
                    Some(resolution) = self.mark_work.next() => Step::Marks(resolution),
                    else => break,
                },
            };
            self.handle(step).await;
        }
    }

    /// Handle events until the selector is detached
    pub async fn run(&mut self) {
        while self.attached && self.step().await {}
    }

    async fn handle(&mut self, step: Step) {
        if !self.attached {
            match step {
                Step::Scale(creation) => remove_created(creation),
                step => trace!(?step, "selector is detached, dropping event"),
            }
            return;
        }

        match step {
            Step::Event(event) => self.handle_event(event).await,
            Step::Marks(resolution) => self.apply_marks(resolution),
            Step::Scale(creation) => {
                let cx = BindingContext {
                    figure: self.figure.as_ref(),
                    model: &self.model,
                    events: &self.sender,
                };
                self.binding.on_scale_created(creation, &cx);
            }
        }
    }

    async fn handle_event(&mut self, event: SelectorEvent) {
        match event {
            SelectorEvent::Relayout => self.relayout(),
            SelectorEvent::SelectedChanged => self.selected_changed(),
            SelectorEvent::MarksChanged => self.request_marks(true),
            SelectorEvent::ScaleChanged(slot) => {
                if let Some(work) = self.binding.create_scale(slot, &self.model) {
                    self.scale_work.push(work);
                }
            }
            SelectorEvent::ScaleLayoutChanged => {
                let cx = BindingContext {
                    figure: self.figure.as_ref(),
                    model: &self.model,
                    events: &self.sender,
                };
                self.binding.sync_scales(&cx);
            }
            SelectorEvent::Custom(msg) => self.handle_custom_message(msg),
            SelectorEvent::DomainChanged { slot, generation } => {
                let cx = BindingContext {
                    figure: self.figure.as_ref(),
                    model: &self.model,
                    events: &self.sender,
                };
                self.binding.on_domain_changed(slot, generation, &cx);
            }
            SelectorEvent::Detach => self.remove().await,
        }
    }

    fn handle_custom_message(&mut self, msg: Value) {
        match CustomMessage::from_value(msg) {
            Ok(CustomMessage::Reset) => self.invoke(Hook::Reset),
            Err(err) => debug!("ignoring custom message: {err}"),
        }
    }

    fn invoke(&mut self, hook: Hook) {
        let cx = SelectorContext {
            model: &self.model,
            figure: self.figure.as_ref(),
            marks: self.marks.marks(),
            scales: &self.binding,
            anchor: &self.anchor,
            size: self.size,
        };
        trace!(?hook, "invoking selector hook");
        match hook {
            Hook::Reset => self.selector.reset(&cx),
            Hook::SelectedChanged => self.selector.selected_changed(&cx),
        }
    }

    /// Release every subscription and scale view. Mark resolutions in flight are dropped,
    /// scale creations in flight are awaited and their views removed.
    pub async fn remove(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.subscriptions.clear();
        self.binding.teardown();
        self.marks.clear();
        self.mark_work.clear();
        self.redraw_deferred = false;

        while let Some(creation) = self.scale_work.next().await {
            remove_created(creation);
        }
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut S {
        &mut self.selector
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn model(&self) -> &SelectorModel {
        &self.model
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn width(&self) -> f32 {
        self.size[0]
    }

    pub fn height(&self) -> f32 {
        self.size[1]
    }

    pub fn mark_views(&self) -> Option<&[Option<Arc<dyn MarkView>>]> {
        self.marks.marks()
    }

    pub fn scale_view(&self, slot: ScaleSlot) -> Option<&Arc<dyn ScaleView>> {
        self.binding.scale_view(slot)
    }

    pub fn slot_status(&self, slot: ScaleSlot) -> SlotStatus {
        self.binding
            .slot(slot)
            .map_or(SlotStatus::Unbound, SlotBinding::status)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// True while a mark resolution or scale creation has not completed
    pub fn has_pending_work(&self) -> bool {
        !self.scale_work.is_empty() || !self.mark_work.is_empty() || self.marks.is_pending()
    }
}

/// Remove the view of a creation that finished after its selector was torn down
fn remove_created(creation: ScaleCreation) {
    if let Ok(view) = creation.view {
        debug!(scale = %creation.scale, "removing scale view created after detach");
        view.remove();
    }
}

impl<S: Selector, B: ScaleBinding> Drop for SelectorView<S, B> {
    fn drop(&mut self) {
        if self.attached {
            self.subscriptions.clear();
            self.binding.teardown();
        }
    }
}
