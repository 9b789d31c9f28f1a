use lightdesk_core::ports::PortError;

/// Startup configuration problems. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}

/// Errors raised while handling one chat event.
///
/// None of these reach the user verbatim; the session logs them and sends
/// a short generic notice instead.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Convenience type alias for handler return values.
pub type BotResult<T> = Result<T, BotError>;
