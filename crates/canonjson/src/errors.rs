use thiserror::Error;

/// Errors produced while marshalling a value.
#[derive(Debug, Error)]
pub enum Error {
    /// A value of a shape that canonical JSON cannot represent, such as a
    /// mapping whose keys are not text strings.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// A supported shape holding an unrepresentable instance: a non-finite
    /// float, a malformed decimal literal, or a duplicate object key.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
    /// A custom-marshal or text-marshal hook reported failure.
    #[error("marshal hook failed for {type_name}: {source}")]
    Marshaler {
        /// Name of the type whose hook failed.
        type_name: &'static str,
        /// Underlying hook error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// I/O error from the output sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
