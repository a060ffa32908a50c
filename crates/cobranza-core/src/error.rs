/// Errors raised while attributing a single payment.
///
/// A missing snapshot is not an error: the engine degrades to the
/// no-context selection path instead.
#[derive(Debug, thiserror::Error)]
pub enum AttributionError {
    #[error("credit not found: {credit_id}")]
    CreditNotFound { credit_id: i64 },

    /// A payment or management row carries a date that cannot be parsed.
    #[error("malformed timestamp '{raw}' on {subject}")]
    MalformedTimestamp { subject: String, raw: String },

    /// A backend-specific storage error (connection, decoding, etc.).
    #[error("store error: {0}")]
    Store(String),
}

impl AttributionError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}
