//! Session settings and the connection state machine.

use std::fmt;

use pulse_protocol::DeliveryMode;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionSettings
// ---------------------------------------------------------------------------

/// Static configuration of a [`SessionManager`](crate::SessionManager).
///
/// Serde derives let a host load this from its own config file; missing
/// fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Delivery mode used for every packet this session sends.
    ///
    /// Default: [`DeliveryMode::Reliable`].
    pub delivery_mode: DeliveryMode,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///   Idle ──connect──→ Connecting ──ready(b)──→ Ready(b) ⟲ ready(b)
///                         ↑                       │
///                         └──connect── Disconnected ←──leave──┘
/// ```
///
/// Transport-initiated drops are not a separate state: they show up as
/// `Ready(false)` if the transport reports them at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session has been requested yet.
    #[default]
    Idle,
    /// `connect_session` was called; waiting for the first readiness report.
    Connecting,
    /// The transport reported readiness (`true`) or its loss (`false`).
    Ready(bool),
    /// `leave_session` was called, or a connection attempt failed.
    Disconnected,
}

impl SessionState {
    /// Returns `true` while a connection is pending or established.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Ready(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Ready(true) => write!(f, "ready"),
            Self::Ready(false) => write!(f, "not ready"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_is_reliable() {
        assert_eq!(
            SessionSettings::default().delivery_mode,
            DeliveryMode::Reliable
        );
    }

    #[test]
    fn test_settings_deserialize_missing_field_uses_default() {
        let settings: SessionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn test_settings_deserialize_delivery_mode() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{"delivery_mode":"Unreliable"}"#).unwrap();
        assert_eq!(settings.delivery_mode, DeliveryMode::Unreliable);
    }

    #[test]
    fn test_state_is_active() {
        assert!(!SessionState::Idle.is_active());
        assert!(SessionState::Connecting.is_active());
        assert!(SessionState::Ready(false).is_active());
        assert!(!SessionState::Disconnected.is_active());
    }
}
