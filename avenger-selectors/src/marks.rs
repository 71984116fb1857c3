use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::trace;

use crate::figure::{Figure, MarkView};
use crate::model::ModelId;

/// Mark views positionally aligned with a selector's declared marks. A `None` slot is a
/// declared mark with no live view in the figure.
pub type ResolvedMarks = Vec<Option<Arc<dyn MarkView>>>;

/// Declared marks matched against the figure's views
#[derive(Debug, Default)]
pub struct AlignedMarks {
    pub views: ResolvedMarks,
    /// Declared marks without a view
    pub unmatched: Vec<ModelId>,
}

/// Completion of one mark view resolution pass
#[derive(Debug)]
pub struct MarkResolution {
    pub generation: u64,
    pub marks: AlignedMarks,
    /// Redraw the selection once this pass is applied
    pub redraw: bool,
}

/// Match `declared` against the figure's views by mark model identity.
///
/// `figure_ids` and `views` are parallel. If the figure lists a mark twice the first view wins.
pub fn align_mark_views(
    declared: &[ModelId],
    figure_ids: &[ModelId],
    views: &[Arc<dyn MarkView>],
) -> AlignedMarks {
    let mut lookup: HashMap<&ModelId, &Arc<dyn MarkView>> = HashMap::new();
    for (id, view) in figure_ids.iter().zip(views) {
        lookup.entry(id).or_insert(view);
    }

    let mut unmatched = Vec::new();
    let views = declared
        .iter()
        .map(|id| {
            let view = lookup.get(id).map(|view| Arc::clone(view));
            if view.is_none() {
                unmatched.push(id.clone());
            }
            view
        })
        .collect();

    AlignedMarks { views, unmatched }
}

/// Wait for the figure's in-flight mark views, then align them with `declared`
pub async fn resolve_mark_views(figure: Arc<dyn Figure>, declared: Vec<ModelId>) -> AlignedMarks {
    let views = figure.mark_views().await;
    // Identities are read after the wait so they describe the same collection as `views`
    let figure_ids = figure.mark_model_ids();
    align_mark_views(&declared, &figure_ids, &views)
}

/// Tracks the requested and applied generations of a selector's resolved mark list
#[derive(Debug, Default)]
pub struct MarkViewResolver {
    requested: u64,
    applied: u64,
    marks: Option<ResolvedMarks>,
}

impl MarkViewResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass, returning its generation
    pub fn request(&mut self) -> u64 {
        self.requested += 1;
        self.requested
    }

    /// Future resolving `declared` for the pass `generation`
    pub fn resolve(
        generation: u64,
        figure: Arc<dyn Figure>,
        declared: Vec<ModelId>,
        redraw: bool,
    ) -> BoxFuture<'static, MarkResolution> {
        async move {
            let marks = resolve_mark_views(figure, declared).await;
            MarkResolution {
                generation,
                marks,
                redraw,
            }
        }
        .boxed()
    }

    /// Apply the result of pass `generation`. Results older than the last applied pass
    /// are discarded and `false` is returned.
    pub fn apply(&mut self, generation: u64, views: ResolvedMarks) -> bool {
        if generation <= self.applied {
            trace!(generation, applied = self.applied, "discarding stale mark resolution");
            return false;
        }
        self.applied = generation;
        self.marks = Some(views);
        true
    }

    /// Mark views of the latest requested pass. `None` until that pass is applied, since an
    /// older list no longer describes the declared marks.
    pub fn marks(&self) -> Option<&[Option<Arc<dyn MarkView>>]> {
        if self.is_pending() {
            return None;
        }
        self.marks.as_deref()
    }

    /// True while a requested pass has not been applied
    pub fn is_pending(&self) -> bool {
        self.applied < self.requested
    }

    pub fn clear(&mut self) {
        self.applied = self.requested;
        self.marks = None;
    }
}
