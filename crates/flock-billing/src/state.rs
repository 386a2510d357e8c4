//! Flow States and Outcomes
//!
//! ```text
//! Idle ─▶ Initiating ─▶ AwaitingPopup ─┬─▶ Completed ─▶ Verifying ─┬─▶ Verified
//!             │                        │                           └─▶ VerificationFailed
//!             │                        ├─▶ Cancelled
//!             └─▶ InitiationFailed ◀───┘ (popup could not be shown)
//! ```
//!
//! Every terminal state returns to `Idle` only through a fresh user action.

use crate::session::ProviderReference;

/// Lifecycle of the provider's checkout script. One per page, never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptLoadState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    FailedToLoad,
}

/// What the popup interaction produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed { provider_reference: ProviderReference },
    Cancelled,
    InitiationFailed { reason: String },
}

/// What the backend said about a completed payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationResult {
    Verified,
    VerificationFailed { reason: String },
}

/// Composite purchase state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    Initiating,
    AwaitingPopup,
    Completed,
    Verifying,
    Verified,
    Cancelled,
    InitiationFailed,
    VerificationFailed,
}

impl FlowState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Verified | Self::Cancelled | Self::InitiationFailed | Self::VerificationFailed
        )
    }

    /// Whether a new purchase may start from this state
    pub const fn accepts_new_action(self) -> bool {
        matches!(self, Self::Idle) || self.is_terminal()
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (current, Self::Idle) => current.is_terminal(),
            (Self::Idle, Self::Initiating)
            | (Self::Initiating, Self::AwaitingPopup | Self::InitiationFailed)
            | (Self::AwaitingPopup, Self::Completed | Self::Cancelled | Self::InitiationFailed)
            | (Self::Completed, Self::Verifying)
            | (Self::Verifying, Self::Verified | Self::VerificationFailed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initiating => "initiating",
            Self::AwaitingPopup => "awaiting_popup",
            Self::Completed => "completed",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::Cancelled => "cancelled",
            Self::InitiationFailed => "initiation_failed",
            Self::VerificationFailed => "verification_failed",
        };
        f.write_str(name)
    }
}
