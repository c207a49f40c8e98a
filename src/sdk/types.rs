//! Plain value types carried by service outcomes.
//!
//! The transport converts whatever native objects the service hands it into
//! these owned values before reporting an outcome, so a deferred callback
//! never touches memory the service may already have recycled.

use serde::{Deserialize, Serialize};

/// Error reported by the service, reduced to its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Human-readable failure message.
    pub message: String,
}

impl ServiceError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Rewards collected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardResponse {
    /// Total rewards collected so far (paid out plus available).
    pub reward: i64,
    /// Rewards available for payout.
    pub available_payout_coins: i64,
    /// Rewards already paid out.
    pub already_spent_coins: i64,
}

/// Failure of a rewards request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardResponseError {
    /// Underlying error, when the service supplied one.
    pub error: Option<ServiceError>,
}

/// Result of a successful payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutResponse {
    /// Coins paid out.
    pub coins: i64,
}

/// Failure of a payout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutError {
    /// One of the `PayoutError::*` reason codes.
    pub reason: i32,
    /// Underlying error, when the service supplied one.
    pub error: Option<ServiceError>,
}

impl PayoutError {
    /// Unspecified failure.
    pub const UNKNOWN: i32 = 0;
    /// The user has not accepted the terms of service.
    pub const TOS_NOT_ACCEPTED: i32 = 1;
    /// Not enough rewards collected for a payout.
    pub const NOT_ENOUGH_COINS: i32 = 400;

    /// Create an error with `reason` and no underlying error.
    #[must_use]
    pub const fn with_reason(reason: i32) -> Self {
        Self {
            reason,
            error: None,
        }
    }

    /// `true` if the payout failed for lack of coins.
    #[must_use]
    pub const fn is_not_enough_coins(&self) -> bool {
        self.reason == Self::NOT_ENOUGH_COINS
    }
}

/// A partner app offered by a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerApp {
    /// Store package identifier.
    pub package_name: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Icon location.
    pub icon_url: Option<String>,
}

/// Partner apps returned by a campaign request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResponse {
    /// Offered apps, in service order.
    pub partner_apps: Vec<PartnerApp>,
}

/// Failure of a campaign request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResponseError {
    /// Underlying error, when the service supplied one.
    pub error: Option<ServiceError>,
}

/// Host-side user events reported with `send_user_event`.
///
/// The discriminant is the id the service expects on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum UserEvent {
    /// The terms-of-service dialog was shown.
    TosShown = 1,
    /// The user accepted the terms of service.
    TosAccepted = 2,
    /// The user declined the terms of service.
    TosDeclined = 3,
    /// The user granted usage-data access.
    UsagePermissionAccepted = 4,
    /// The user refused usage-data access.
    UsagePermissionDenied = 5,
    /// Install clicked. Sent automatically by `execute_click`.
    InstallClicked = 6,
    /// A partner-app video started. `extra` carries the app id.
    VideoPlay = 7,
    /// A partner-app video paused. `extra` carries the app id.
    VideoPause = 8,
    /// A partner-app video ended. `extra` carries the app id.
    VideoEnded = 9,
    /// The campaigns screen was displayed.
    CampaignsShown = 10,
    /// Campaign viewed. Sent automatically by `execute_view`.
    CampaignView = 11,
    /// The host app was opened.
    AppOpen = 12,
    /// The user saw rewards content in this session.
    FirstImpression = 13,
    /// The entry-point teaser was rendered.
    TeaserShown = 14,
}

impl UserEvent {
    /// Wire id of the event.
    #[must_use]
    pub const fn id(self) -> i32 {
        self as i32
    }

    /// `true` for the video events, which need the app id as `extra`.
    #[must_use]
    pub const fn needs_app_id(self) -> bool {
        matches!(self, Self::VideoPlay | Self::VideoPause | Self::VideoEnded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_reason_codes() {
        assert_eq!(PayoutError::UNKNOWN, 0);
        assert_eq!(PayoutError::TOS_NOT_ACCEPTED, 1);
        assert!(PayoutError::with_reason(400).is_not_enough_coins());
        assert!(!PayoutError::default().is_not_enough_coins());
    }

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::new("timeout");
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_campaign_response_from_json() {
        let json = r#"{"partner_apps":[{"package_name":"com.example.game","name":"Game","description":"Play","icon_url":null}]}"#;
        let response: CampaignResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.partner_apps.len(), 1);
        assert_eq!(response.partner_apps[0].package_name, "com.example.game");
        assert!(response.partner_apps[0].icon_url.is_none());
    }

    #[test]
    fn test_user_event_ids() {
        assert_eq!(UserEvent::TosShown.id(), 1);
        assert_eq!(UserEvent::CampaignsShown.id(), 10);
        assert_eq!(UserEvent::TeaserShown.id(), 14);
        assert!(UserEvent::VideoPause.needs_app_id());
        assert!(!UserEvent::AppOpen.needs_app_id());
    }
}
