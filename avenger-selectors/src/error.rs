use crate::model::ModelId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvengerSelectorError {
    #[error("Failed to create view for scale `{scale}`: {reason}")]
    ScaleViewCreation { scale: ModelId, reason: String },

    #[error("Invalid value for field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Serde error: `{0}`")]
    SerdeError(#[from] serde_json::Error),
}
