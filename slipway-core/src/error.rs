/// Errors surfaced by the engine.
///
/// The scheduling algorithms themselves are total; these cover the few
/// places where a caller handed us something we can't proceed with.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("missing generator setting: {setting}")]
    MissingCredential { setting: String },

    #[error("invalid datetime '{raw}': {reason}")]
    InvalidDatetime { raw: String, reason: String },

    #[error("invalid timezone: {tz}")]
    InvalidTimezone { tz: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
