use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    /// Channel name failed validation: empty, or a publish directly on the
    /// wildcard channel.
    #[error("Invalid channel{}: {message}", format_context(.context))]
    InvalidChannel { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No listener with the given id is registered on the channel.
    #[error("Listener not found{}: {message}", format_context(.context))]
    ListenerNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Extension helpers for attaching call-site context to bus errors.
pub trait EventBusErrorExt {
    /// Replaces the error's context with `context`.
    #[must_use]
    fn with_context(self, context: impl Into<Cow<'static, str>>) -> Self;
}

impl EventBusErrorExt for EventBusError {
    fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        match &mut self {
            Self::InvalidChannel { context: c, .. } | Self::ListenerNotFound { context: c, .. } => {
                *c = Some(context.into());
            },
        }
        self
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
