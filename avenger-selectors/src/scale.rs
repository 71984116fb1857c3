use std::fmt::Debug;

use crate::event::{Handler, Subscription};
use crate::model::ModelId;

/// Live view of a scale model, owned by the binding that created it
pub trait ScaleView: Debug + Send + Sync {
    /// Identity of the scale model backing this view
    fn model_id(&self) -> ModelId;

    fn set_range(&self, range: [f32; 2]);

    /// Widen the domain so that `target_range` covers what `initial_range` covered before.
    ///
    /// Implementations recompute from the model's domain, so repeated calls with the same
    /// arguments leave the view unchanged, and must not emit a domain change notification.
    fn expand_domain(&self, initial_range: [f32; 2], target_range: [f32; 2]);

    fn on_domain_changed(&self, handler: Handler<()>) -> Subscription;

    /// Detach the view. Calling this more than once has no further effect.
    fn remove(&self);
}

/// Domain of a linear scale that maps `target_range` onto the values that `domain`
/// occupies when mapped onto `initial_range`.
///
/// This is the padding absorption used by [`ScaleView::expand_domain`] for continuous scales:
/// with `initial_range` the padded range and `target_range` the full range, the data domain
/// still lands on the padded pixels while the scale spans the whole range.
pub fn expanded_domain(domain: [f32; 2], initial_range: [f32; 2], target_range: [f32; 2]) -> [f32; 2] {
    let span = initial_range[1] - initial_range[0];
    if span == 0.0 || !span.is_finite() {
        return domain;
    }
    let invert = |px: f32| domain[0] + (px - initial_range[0]) / span * (domain[1] - domain[0]);
    [invert(target_range[0]), invert(target_range[1])]
}
