//! Outcome shapes of each service call and the persistent catalog listener.

use std::sync::Arc;

use tracing::trace;

use crate::core::{deliver, Callback, CallbackAdapter, DispatchContext, OutcomeCallbacks};

use super::types::{
    CampaignResponse, CampaignResponseError, PayoutError, PayoutResponse, RewardResponse,
    RewardResponseError, ServiceError,
};

/// Named outcomes of a face verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceVerificationState {
    /// The user was verified before this attempt.
    AlreadyVerified,
    /// The user cancelled the flow.
    Cancelled,
    /// The service was not initialized.
    NotInitialized,
    /// The terms of service have not been accepted.
    TosNotAccepted,
    /// The liveness check failed.
    LivenessCheckFailed,
    /// The attempt awaits manual review.
    PendingReview,
    /// No attempts left.
    MaxAttemptsReached,
}

/// Named outcomes of a verification status query. Success means verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// The user is not verified.
    NotVerified,
    /// The service was not initialized.
    NotInitialized,
    /// The terms of service have not been accepted.
    TosNotAccepted,
    /// A verification awaits manual review.
    PendingReview,
    /// No attempts left.
    MaxAttemptsReached,
}

/// Named outcome shared by partner-app click and view calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    /// The previous click or view on this app has not finished yet.
    AlreadyInProgress,
}

/// Initialization: success or service error.
pub type InitAdapter = CallbackAdapter<(), ServiceError>;
/// Callbacks for [`InitAdapter`].
pub type InitCallbacks = OutcomeCallbacks<(), ServiceError>;

/// Terms-of-service acceptance: success or service error.
pub type TosAdapter = CallbackAdapter<(), ServiceError>;
/// Callbacks for [`TosAdapter`].
pub type TosCallbacks = OutcomeCallbacks<(), ServiceError>;

/// Rewards request.
pub type RewardAdapter = CallbackAdapter<RewardResponse, RewardResponseError>;
/// Callbacks for [`RewardAdapter`].
pub type RewardCallbacks = OutcomeCallbacks<RewardResponse, RewardResponseError>;

/// Payout.
pub type PayoutAdapter = CallbackAdapter<PayoutResponse, PayoutError>;
/// Callbacks for [`PayoutAdapter`].
pub type PayoutCallbacks = OutcomeCallbacks<PayoutResponse, PayoutError>;

/// Partner app (campaign) request.
pub type CampaignAdapter = CallbackAdapter<CampaignResponse, CampaignResponseError>;
/// Callbacks for [`CampaignAdapter`].
pub type CampaignCallbacks = OutcomeCallbacks<CampaignResponse, CampaignResponseError>;

/// Face verification.
pub type FaceVerificationAdapter = CallbackAdapter<(), ServiceError, FaceVerificationState>;
/// Callbacks for [`FaceVerificationAdapter`].
pub type FaceVerificationCallbacks = OutcomeCallbacks<(), ServiceError, FaceVerificationState>;

/// Face verification status.
pub type VerificationStatusAdapter = CallbackAdapter<(), ServiceError, VerificationStatus>;
/// Callbacks for [`VerificationStatusAdapter`].
pub type VerificationStatusCallbacks = OutcomeCallbacks<(), ServiceError, VerificationStatus>;

/// Partner-app install click.
pub type ClickAdapter = CallbackAdapter<(), ServiceError, ExecutionState>;
/// Callbacks for [`ClickAdapter`].
pub type ClickCallbacks = OutcomeCallbacks<(), ServiceError, ExecutionState>;

/// Partner-app listing view.
pub type ViewAdapter = CallbackAdapter<(), ServiceError, ExecutionState>;
/// Callbacks for [`ViewAdapter`].
pub type ViewCallbacks = OutcomeCallbacks<(), ServiceError, ExecutionState>;

/// Long-lived listener for catalog open/close events.
///
/// Unlike a [`CallbackAdapter`] it may fire any number of times. Each event
/// goes through the same deliver path as one-shot outcomes.
pub struct CatalogListener {
    opened: Option<Callback<String>>,
    closed: Option<Callback<String>>,
    context: DispatchContext,
}

impl CatalogListener {
    pub(crate) fn new(
        context: DispatchContext,
        opened: Option<Callback<String>>,
        closed: Option<Callback<String>>,
    ) -> Self {
        context.seal_delivery_mode();
        Self {
            opened,
            closed,
            context,
        }
    }

    /// The catalog of type `kind` was opened.
    pub fn on_catalog_opened(&self, kind: String) {
        self.forward(self.opened.as_ref(), "opened", kind);
    }

    /// The catalog of type `kind` was closed.
    pub fn on_catalog_closed(&self, kind: String) {
        self.forward(self.closed.as_ref(), "closed", kind);
    }

    fn forward(&self, callback: Option<&Callback<String>>, event: &'static str, kind: String) {
        let Some(callback) = callback else {
            trace!(event, "no catalog callback registered");
            return;
        };
        let callback = Arc::clone(callback);
        deliver(
            self.context.delivery_mode(),
            self.context.dispatcher(),
            move || callback(kind),
        );
    }
}

impl std::fmt::Debug for CatalogListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogListener")
            .field("opened", &self.opened.is_some())
            .field("closed", &self.closed.is_some())
            .finish_non_exhaustive()
    }
}
