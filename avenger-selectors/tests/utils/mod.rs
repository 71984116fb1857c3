#![allow(dead_code)]

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use avenger_selectors::prelude::*;
use serde_json::Value;
use tokio::sync::Notify;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Ordered log of the calls made on fake collaborators
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Debug)]
pub struct FakeScale {
    id: ModelId,
    journal: Journal,
    base_domain: Mutex<[f32; 2]>,
    domain: Mutex<[f32; 2]>,
    range: Mutex<Option<[f32; 2]>>,
    range_calls: Mutex<Vec<[f32; 2]>>,
    expand_calls: Mutex<Vec<([f32; 2], [f32; 2])>>,
    removed: AtomicUsize,
    domain_changed: Notifier<()>,
}

impl FakeScale {
    pub fn new(id: ModelId, domain: [f32; 2], journal: Journal) -> Self {
        Self {
            id,
            journal,
            base_domain: Mutex::new(domain),
            domain: Mutex::new(domain),
            range: Mutex::new(None),
            range_calls: Mutex::new(Vec::new()),
            expand_calls: Mutex::new(Vec::new()),
            removed: AtomicUsize::new(0),
            domain_changed: Notifier::new(),
        }
    }

    /// Change the model domain, as the host does when the scale's domain field is written
    pub fn set_domain(&self, domain: [f32; 2]) {
        *self.base_domain.lock().unwrap() = domain;
        *self.domain.lock().unwrap() = domain;
        self.domain_changed.notify(&());
    }

    pub fn domain(&self) -> [f32; 2] {
        *self.domain.lock().unwrap()
    }

    pub fn range(&self) -> Option<[f32; 2]> {
        *self.range.lock().unwrap()
    }

    pub fn range_calls(&self) -> Vec<[f32; 2]> {
        self.range_calls.lock().unwrap().clone()
    }

    pub fn expand_calls(&self) -> Vec<([f32; 2], [f32; 2])> {
        self.expand_calls.lock().unwrap().clone()
    }

    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn domain_listeners(&self) -> usize {
        self.domain_changed.len()
    }
}

impl ScaleView for FakeScale {
    fn model_id(&self) -> ModelId {
        self.id.clone()
    }

    fn set_range(&self, range: [f32; 2]) {
        self.journal.push(format!("set_range {}", self.id));
        *self.range.lock().unwrap() = Some(range);
        self.range_calls.lock().unwrap().push(range);
    }

    fn expand_domain(&self, initial_range: [f32; 2], target_range: [f32; 2]) {
        self.journal.push(format!("expand {}", self.id));
        let base = *self.base_domain.lock().unwrap();
        *self.domain.lock().unwrap() = expanded_domain(base, initial_range, target_range);
        self.expand_calls
            .lock()
            .unwrap()
            .push((initial_range, target_range));
    }

    fn on_domain_changed(&self, handler: Handler<()>) -> Subscription {
        self.domain_changed.subscribe(handler)
    }

    fn remove(&self) {
        self.journal.push(format!("remove {}", self.id));
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeModel {
    id: ModelId,
    journal: Journal,
    fields: Mutex<HashMap<String, Value>>,
    listeners: Mutex<HashMap<String, Notifier<Value>>>,
    messages: Notifier<Value>,
    gates: Mutex<HashMap<ModelId, Arc<Notify>>>,
    failing: Mutex<HashSet<ModelId>>,
    created: Mutex<Vec<Arc<FakeScale>>>,
}

impl FakeModel {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            id: ModelId::from("selector"),
            journal: journal.clone(),
            fields: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            messages: Notifier::new(),
            gates: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
        })
    }

    /// Set a field without notifying, as initial widget state
    pub fn with_field(self: Arc<Self>, name: &str, value: Value) -> Arc<Self> {
        self.fields.lock().unwrap().insert(name.to_string(), value);
        self
    }

    pub fn send_message(&self, msg: Value) {
        self.messages.notify(&msg);
    }

    /// Hold creation of `scale` views until the returned gate is notified
    pub fn gate_scale(&self, scale: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(ModelId::from(scale), gate.clone());
        gate
    }

    pub fn fail_scale(&self, scale: &str) {
        self.failing.lock().unwrap().insert(ModelId::from(scale));
    }

    /// Most recently created view of `scale`
    pub fn scale_view(&self, scale: &str) -> Option<Arc<FakeScale>> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|view| view.model_id().as_str() == scale)
            .cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, |notifier| notifier.len())
    }

    pub fn message_listener_count(&self) -> usize {
        self.messages.len()
    }
}

#[async_trait]
impl HostModel for FakeModel {
    fn model_id(&self) -> ModelId {
        self.id.clone()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.fields.lock().unwrap().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) {
        self.fields
            .lock()
            .unwrap()
            .insert(name.to_string(), value.clone());
        let notifier = self.listeners.lock().unwrap().get(name).cloned();
        if let Some(notifier) = notifier {
            notifier.notify(&value);
        }
    }

    fn on_change(&self, name: &str, handler: Handler<Value>) -> Subscription {
        self.listeners
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .subscribe(handler)
    }

    fn on_custom_message(&self, handler: Handler<Value>) -> Subscription {
        self.messages.subscribe(handler)
    }

    async fn create_scale_view(
        &self,
        scale: &ModelId,
    ) -> Result<Arc<dyn ScaleView>, AvengerSelectorError> {
        self.journal.push(format!("create {scale}"));
        let gate = self.gates.lock().unwrap().get(scale).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(scale) {
            return Err(AvengerSelectorError::ScaleViewCreation {
                scale: scale.clone(),
                reason: "scale model was closed".to_string(),
            });
        }

        let view = Arc::new(FakeScale::new(
            scale.clone(),
            [0.0, 1.0],
            self.journal.clone(),
        ));
        self.created.lock().unwrap().push(view.clone());
        Ok(view as Arc<dyn ScaleView>)
    }
}

#[derive(Debug)]
pub struct FakeMark {
    id: ModelId,
}

impl FakeMark {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ModelId::from(id),
        })
    }
}

impl MarkView for FakeMark {
    fn model_id(&self) -> ModelId {
        self.id.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct FigureLayout {
    width: f32,
    height: f32,
    margin: Margin,
}

pub struct FakeFigure {
    layout: Mutex<FigureLayout>,
    paddings: Mutex<HashMap<ModelId, f32>>,
    marks: Mutex<Vec<Arc<FakeMark>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    layout_changed: Notifier<()>,
    mark_view_requests: AtomicUsize,
}

impl FakeFigure {
    pub fn new(width: f32, height: f32) -> Arc<Self> {
        Arc::new(Self {
            layout: Mutex::new(FigureLayout {
                width,
                height,
                margin: Margin::default(),
            }),
            paddings: Mutex::new(HashMap::new()),
            marks: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            layout_changed: Notifier::new(),
            mark_view_requests: AtomicUsize::new(0),
        })
    }

    pub fn with_margin(self: Arc<Self>, margin: Margin) -> Arc<Self> {
        self.layout.lock().unwrap().margin = margin;
        self
    }

    pub fn with_marks(self: Arc<Self>, ids: &[&str]) -> Arc<Self> {
        self.set_marks(ids);
        self
    }

    pub fn with_padding(self: Arc<Self>, scale: &str, padding: f32) -> Arc<Self> {
        self.paddings
            .lock()
            .unwrap()
            .insert(ModelId::from(scale), padding);
        self
    }

    /// Replace the figure's mark views, in figure order
    pub fn set_marks(&self, ids: &[&str]) {
        *self.marks.lock().unwrap() = ids.iter().map(|id| FakeMark::new(id)).collect();
    }

    pub fn mark(&self, id: &str) -> Option<Arc<FakeMark>> {
        self.marks
            .lock()
            .unwrap()
            .iter()
            .find(|mark| mark.id.as_str() == id)
            .cloned()
    }

    /// Hold mark view resolution until the returned gate is notified
    pub fn gate_mark_views(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn resize(&self, width: f32, height: f32) {
        {
            let mut layout = self.layout.lock().unwrap();
            layout.width = width;
            layout.height = height;
        }
        self.layout_changed.notify(&());
    }

    pub fn set_margin(&self, margin: Margin) {
        self.layout.lock().unwrap().margin = margin;
        self.layout_changed.notify(&());
    }

    pub fn mark_view_requests(&self) -> usize {
        self.mark_view_requests.load(Ordering::SeqCst)
    }

    pub fn layout_listeners(&self) -> usize {
        self.layout_changed.len()
    }
}

#[async_trait]
impl Figure for FakeFigure {
    fn width(&self) -> f32 {
        self.layout.lock().unwrap().width
    }

    fn height(&self) -> f32 {
        self.layout.lock().unwrap().height
    }

    fn margin(&self) -> Margin {
        self.layout.lock().unwrap().margin
    }

    fn range(&self, axis: Axis) -> [f32; 2] {
        let layout = self.layout.lock().unwrap();
        let margin = layout.margin;
        match axis {
            Axis::X => [0.0, layout.width - margin.left - margin.right],
            Axis::Y => [layout.height - margin.top - margin.bottom, 0.0],
        }
    }

    fn padded_range(&self, axis: Axis, scale: &ModelId) -> [f32; 2] {
        let padding = self
            .paddings
            .lock()
            .unwrap()
            .get(scale)
            .copied()
            .unwrap_or(0.0);
        let [start, end] = self.range(axis);
        let direction = if end >= start { 1.0 } else { -1.0 };
        [start + direction * padding, end - direction * padding]
    }

    async fn mark_views(&self) -> Vec<Arc<dyn MarkView>> {
        self.mark_view_requests.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.marks
            .lock()
            .unwrap()
            .iter()
            .map(|mark| mark.clone() as Arc<dyn MarkView>)
            .collect()
    }

    fn mark_model_ids(&self) -> Vec<ModelId> {
        self.marks
            .lock()
            .unwrap()
            .iter()
            .map(|mark| mark.id.clone())
            .collect()
    }

    fn on_layout_changed(&self, handler: Handler<()>) -> Subscription {
        self.layout_changed.subscribe(handler)
    }
}

/// Selector recording every hook call and the state it observed
#[derive(Debug, Default)]
pub struct RecordingSelector {
    pub calls: Vec<&'static str>,
    /// Mark ids visible to each `selected_changed` call
    pub seen_marks: Vec<Option<Vec<Option<String>>>>,
    pub seen_selected: Vec<Option<Value>>,
    /// Number of live dependent marks seen by each `selected_changed` call
    pub seen_dependents: Vec<usize>,
    /// Scale and plot width the indicator was last drawn against
    pub drawn_on: Option<(String, f32)>,
    /// In-progress brush extent, in pixels
    pub brush: Option<[f32; 2]>,
    pub indicator_visible: bool,
}

impl RecordingSelector {
    pub fn begin_brush(&mut self, extent: [f32; 2]) {
        self.brush = Some(extent);
        self.indicator_visible = true;
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Selector for RecordingSelector {
    fn reset(&mut self, cx: &SelectorContext<'_>) {
        self.calls.push("reset");
        self.brush = None;
        self.indicator_visible = false;
        cx.set_selected(field::SELECTED, SelectionValue::Null);
    }

    fn selected_changed(&mut self, cx: &SelectorContext<'_>) {
        self.calls.push("selected_changed");
        self.seen_marks.push(cx.mark_views().map(|marks| {
            marks
                .iter()
                .map(|view| view.as_ref().map(|view| view.model_id().to_string()))
                .collect()
        }));
        self.seen_dependents.push(cx.dependent_mark_views().count());
        self.drawn_on = cx
            .scale()
            .map(|scale| (scale.model_id().to_string(), cx.width()));
        let selected = cx.model().selected();
        self.indicator_visible = matches!(&selected, Some(value) if !value.is_null());
        self.seen_selected.push(selected);
    }
}

pub fn x_selector(model: &Arc<FakeModel>, figure: &Arc<FakeFigure>) -> XSelectorView<RecordingSelector> {
    SelectorView::new(
        RecordingSelector::default(),
        SingleScaleBinding::new(),
        model.clone(),
        figure.clone(),
    )
}

pub fn xy_selector(model: &Arc<FakeModel>, figure: &Arc<FakeFigure>) -> XYSelectorView<RecordingSelector> {
    SelectorView::new(
        RecordingSelector::default(),
        XYScaleBinding::new(),
        model.clone(),
        figure.clone(),
    )
}
