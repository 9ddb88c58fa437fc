/// Domain-level errors raised while interpreting sync payloads.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A submitted value cannot be stored in its column, or a reference
    /// points at a phantom id that nothing in the batch created.
    #[error("Validation failed: {0}")]
    Validation(String),
}
