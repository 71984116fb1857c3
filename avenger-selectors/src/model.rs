use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumString, VariantNames};
use tracing::warn;

use crate::binding::ScaleSlot;
use crate::error::AvengerSelectorError;
use crate::event::{Handler, Subscription};
use crate::figure::Axis;
use crate::scale::ScaleView;

/// Names of the model fields a selector reads or writes
pub mod field {
    pub const MARKS: &str = "marks";
    pub const SELECTED: &str = "selected";
    pub const SCALE: &str = "scale";
    pub const X_SCALE: &str = "x_scale";
    pub const Y_SCALE: &str = "y_scale";
    pub const ORIENTATION: &str = "orientation";
}

/// Identity of a host model (mark, scale or selector)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Axis a one dimensional selector with this orientation binds its scale to
    pub fn axis(self) -> Axis {
        match self {
            Orientation::Vertical => Axis::Y,
            Orientation::Horizontal => Axis::X,
        }
    }
}

/// Out-of-band commands delivered through the model's custom message channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomMessage {
    Reset,
}

impl CustomMessage {
    pub fn from_value(msg: Value) -> Result<Self, AvengerSelectorError> {
        Ok(serde_json::from_value(msg)?)
    }
}

/// The host's widget model: field storage with change notification, a custom
/// message channel and async creation of child views.
#[async_trait]
pub trait HostModel: Send + Sync {
    fn model_id(&self) -> ModelId;

    /// Current value of a field, `None` if the field is not set
    fn get(&self, name: &str) -> Option<Value>;

    /// Write a field through the host's notification path. Every change
    /// listener registered for `name` observes the write.
    fn set(&self, name: &str, value: Value);

    fn on_change(&self, name: &str, handler: Handler<Value>) -> Subscription;

    fn on_custom_message(&self, handler: Handler<Value>) -> Subscription;

    /// Instantiate a live view for the scale model `scale`
    async fn create_scale_view(
        &self,
        scale: &ModelId,
    ) -> Result<Arc<dyn ScaleView>, AvengerSelectorError>;
}

/// Typed access to the fields of a selector's host model
#[derive(Clone)]
pub struct SelectorModel {
    host: Arc<dyn HostModel>,
}

impl SelectorModel {
    pub fn new(host: Arc<dyn HostModel>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn HostModel> {
        &self.host
    }

    /// Deserialize a field, treating a missing or null field as `None`
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AvengerSelectorError> {
        match self.host.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|err| {
                AvengerSelectorError::InvalidField {
                    field: name.to_string(),
                    reason: err.to_string(),
                }
            }),
        }
    }

    /// Declared marks, `None` if the model declares no mark list
    pub fn marks(&self) -> Option<Vec<ModelId>> {
        self.field(field::MARKS).unwrap_or_else(|err| {
            warn!("ignoring mark list: {err}");
            None
        })
    }

    /// Scale model declared for `slot`, if any
    pub fn scale(&self, slot: ScaleSlot) -> Option<ModelId> {
        self.field(slot.field()).unwrap_or_else(|err| {
            warn!("ignoring scale: {err}");
            None
        })
    }

    pub fn orientation(&self) -> Orientation {
        match self.host.get(field::ORIENTATION) {
            Some(Value::String(s)) => Orientation::from_str(&s).unwrap_or_else(|_| {
                warn!(
                    "unknown orientation `{s}`, expected one of {:?}",
                    Orientation::VARIANTS
                );
                Orientation::default()
            }),
            _ => Orientation::default(),
        }
    }

    pub fn selected(&self) -> Option<Value> {
        self.host.get(field::SELECTED)
    }

    pub fn set(&self, name: &str, value: Value) {
        self.host.set(name, value)
    }
}

impl std::fmt::Debug for SelectorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorModel")
            .field("id", &self.host.model_id())
            .finish()
    }
}
