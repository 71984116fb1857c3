use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::event::{Handler, Subscription};
use crate::model::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Live view of a single mark owned by the figure
pub trait MarkView: Debug + Send + Sync {
    /// Identity of the mark model backing this view
    fn model_id(&self) -> ModelId;

    fn as_any(&self) -> &dyn Any;
}

/// The figure a selector is drawn in
#[async_trait]
pub trait Figure: Send + Sync {
    fn width(&self) -> f32;

    fn height(&self) -> f32;

    fn margin(&self) -> Margin;

    /// Pixel interval of the plot area along `axis`
    fn range(&self, axis: Axis) -> [f32; 2];

    /// Pixel interval along `axis` after the padding declared by `scale` is applied
    fn padded_range(&self, axis: Axis, scale: &ModelId) -> [f32; 2];

    /// Views of the figure's marks, available once every in-flight view creation has finished
    async fn mark_views(&self) -> Vec<Arc<dyn MarkView>>;

    /// Mark model identities, parallel to [`Figure::mark_views`]
    fn mark_model_ids(&self) -> Vec<ModelId>;

    /// Register for margin and size changes
    fn on_layout_changed(&self, handler: Handler<()>) -> Subscription;
}

/// Width and height of the figure's plot area, margins excluded
pub fn plot_size(figure: &dyn Figure) -> [f32; 2] {
    let margin = figure.margin();
    [
        figure.width() - margin.left - margin.right,
        figure.height() - margin.top - margin.bottom,
    ]
}
