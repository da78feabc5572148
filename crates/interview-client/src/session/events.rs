//! Session lifecycle events.

/// Broadcast whenever the session changes hands.
///
/// Collaborators subscribe through [`SessionGateway::subscribe`](super::SessionGateway::subscribe)
/// and return to the logged-out state on [`SessionEvent::Expired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential from a fresh login was installed.
    SignedIn,
    /// The access token was exchanged for a new one.
    Refreshed,
    /// The refresh protocol failed; credentials were cleared.
    Expired { reason: String },
    /// The user logged out.
    SignedOut,
}

impl SessionEvent {
    /// Event name for logging and subscription matching.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SignedIn => "session_signed_in",
            Self::Refreshed => "session_refreshed",
            Self::Expired { .. } => "session_expired",
            Self::SignedOut => "session_signed_out",
        }
    }

    /// Whether collaborators must drop back to the logged-out state.
    #[inline]
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::SignedOut)
    }
}
