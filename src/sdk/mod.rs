//! Rewards service surface: value types, call shapes and the client.

pub mod client;
pub mod listeners;
pub mod params;
pub mod types;

pub use client::{PartnerAppsKind, PlaytimeClient, Transport};
pub use listeners::{
    CampaignAdapter, CampaignCallbacks, CatalogListener, ClickAdapter, ClickCallbacks,
    ExecutionState, FaceVerificationAdapter, FaceVerificationCallbacks, FaceVerificationState,
    InitAdapter, InitCallbacks, PayoutAdapter, PayoutCallbacks, RewardAdapter, RewardCallbacks,
    TosAdapter, TosCallbacks, VerificationStatus, VerificationStatusAdapter,
    VerificationStatusCallbacks, ViewAdapter, ViewCallbacks,
};
pub use params::{
    PlaytimeExtensions, PlaytimeGender, PlaytimeOptions, PlaytimeParams, PlaytimeUserProfile,
};
pub use types::{
    CampaignResponse, CampaignResponseError, PartnerApp, PayoutError, PayoutResponse,
    RewardResponse, RewardResponseError, ServiceError, UserEvent,
};
