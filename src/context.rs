use serde_json::Value;

/// Pipeline-wide context handed to every middleware.
/// Opaque to this crate: it is passed through and never examined.
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    /// Free-form site metadata owned by the enclosing pipeline.
    pub metadata: Value,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }
}
