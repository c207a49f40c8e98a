//! Host-facing entry points and the transport boundary.
//!
//! [`PlaytimeClient`] is what the host calls. Each asynchronous entry point
//! builds exactly one adapter from the caller's callbacks and hands it to the
//! [`Transport`], which reaches the remote service and later reports one
//! outcome on the adapter from whatever thread it uses.

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::core::{global, AppResult, Callback, DispatchContext, DispatchError, TickReport};
use crate::util::init_tracing;

use super::listeners::{
    CampaignAdapter, CampaignCallbacks, CatalogListener, ClickAdapter, ClickCallbacks,
    FaceVerificationAdapter, FaceVerificationCallbacks, InitAdapter, InitCallbacks,
    PayoutAdapter, PayoutCallbacks, RewardAdapter, RewardCallbacks, TosAdapter, TosCallbacks,
    VerificationStatusAdapter, VerificationStatusCallbacks, ViewAdapter, ViewCallbacks,
};
use super::params::{PlaytimeOptions, PlaytimeParams};
use super::types::UserEvent;

/// Which partner apps a campaign request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartnerAppsKind {
    /// Apps the user can install.
    All,
    /// Apps with advance-plus rewards.
    Advance,
    /// Partner apps already installed.
    Installed,
}

/// Connection to the remote rewards service.
///
/// Implementations issue the request and report exactly one outcome on the
/// supplied adapter, from any thread, converting native results into the
/// crate's value types first.
pub trait Transport: Send + Sync + 'static {
    /// Initialize the service.
    fn init(&self, sdk_hash: &str, options: &PlaytimeOptions, adapter: InitAdapter);

    /// Request the user's reward balance.
    fn request_rewards(&self, params: &PlaytimeParams, adapter: RewardAdapter);

    /// Pay out `coins`, or everything available when `None`.
    fn do_payout(&self, coins: Option<i64>, params: &PlaytimeParams, adapter: PayoutAdapter);

    /// Request partner apps of the given kind.
    fn request_partner_apps(
        &self,
        kind: PartnerAppsKind,
        params: &PlaytimeParams,
        adapter: CampaignAdapter,
    );

    /// Register the catalog listener, replacing any previous one.
    fn set_catalog_listener(&self, listener: CatalogListener);

    /// Record terms-of-service acceptance.
    fn set_tos_accepted(&self, adapter: TosAdapter);

    /// Start a face verification flow.
    fn face_verification(&self, adapter: FaceVerificationAdapter);

    /// Query the face verification status.
    fn face_verification_status(&self, adapter: VerificationStatusAdapter);

    /// Send the user to the store page of `package`.
    fn execute_click(
        &self,
        package: &str,
        sub_id1: Option<&str>,
        sub_id2: Option<&str>,
        adapter: ClickAdapter,
    );

    /// Record that the listing of `package` was shown.
    fn execute_view(
        &self,
        package: &str,
        sub_id1: Option<&str>,
        sub_id2: Option<&str>,
        adapter: ViewAdapter,
    );

    /// Open the service's own catalog screen.
    fn show_catalog(&self, params: &PlaytimeParams);

    /// Replace the acquisition parameters used by later requests.
    fn set_ua_params(&self, params: &PlaytimeParams);

    /// Report a host-side user event.
    fn send_user_event(&self, event: UserEvent, extra: Option<&str>, params: &PlaytimeParams);

    /// Prepare the web view used by click and view calls.
    fn init_web_view(&self);

    /// Open the system screen granting usage-data access.
    fn show_usage_permission_screen(&self);

    /// Numeric service version.
    fn version(&self) -> i32;

    /// Human-readable service version.
    fn version_name(&self) -> String;

    /// `true` once initialization succeeded.
    fn is_initialized(&self) -> bool;

    /// `true` if the user accepted the terms of service.
    fn has_accepted_tos(&self) -> bool;

    /// `true` if usage-data access was granted.
    fn has_accepted_usage_permission(&self) -> bool;

    /// Identifier the service assigned to the user, if any.
    fn user_id(&self) -> Option<String>;
}

/// Host-facing API over a [`Transport`].
#[derive(Debug)]
pub struct PlaytimeClient<T> {
    transport: T,
    context: DispatchContext,
}

impl<T: Transport> PlaytimeClient<T> {
    /// Create a client delivering through `context`.
    pub const fn new(transport: T, context: DispatchContext) -> Self {
        Self { transport, context }
    }

    /// Create a client delivering through the process-wide context.
    ///
    /// # Errors
    ///
    /// Returns any error from [`global::context`].
    pub fn with_global_context(transport: T) -> Result<Self, DispatchError> {
        Ok(Self::new(transport, global::context()?))
    }

    /// Create a client with its own context configured from the environment,
    /// installing the default tracing subscriber if the host has none.
    ///
    /// # Errors
    ///
    /// Fails when the environment holds an invalid configuration or worker
    /// threads cannot be started.
    pub fn from_env(transport: T) -> AppResult<Self> {
        init_tracing();
        let config = DispatchConfig::from_env()
            .map_err(anyhow::Error::msg)
            .context("reading dispatch configuration")?;
        let context = DispatchContext::new(config).context("starting dispatch context")?;
        Ok(Self::new(transport, context))
    }

    /// The dispatch context used for delivery.
    pub const fn context(&self) -> &DispatchContext {
        &self.context
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Run callbacks on the reporting thread instead of the main thread.
    /// Call before the first asynchronous call.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::LegacyModeSealed` after the first call.
    pub fn set_use_legacy_callbacks(&self, legacy: bool) -> Result<(), DispatchError> {
        self.context.set_use_legacy_callbacks(legacy)
    }

    /// Drain callbacks queued for the main thread.
    pub fn tick(&self) -> TickReport {
        self.context.tick()
    }

    /// Initialize the service.
    pub fn init(&self, sdk_hash: &str, options: &PlaytimeOptions, callbacks: InitCallbacks) {
        let adapter = self.context.adapter("init", callbacks);
        debug!(call_id = %adapter.call_id(), "issuing init");
        self.transport.init(sdk_hash, options, adapter);
    }

    /// Request the user's reward balance.
    pub fn request_rewards(&self, params: &PlaytimeParams, callbacks: RewardCallbacks) {
        let adapter = self.context.adapter("request_rewards", callbacks);
        debug!(call_id = %adapter.call_id(), "issuing request_rewards");
        self.transport.request_rewards(params, adapter);
    }

    /// Pay out `coins`, or everything available when `None`.
    pub fn do_payout(&self, coins: Option<i64>, params: &PlaytimeParams, callbacks: PayoutCallbacks) {
        let adapter = self.context.adapter("do_payout", callbacks);
        debug!(call_id = %adapter.call_id(), ?coins, "issuing do_payout");
        self.transport.do_payout(coins, params, adapter);
    }

    /// Request partner apps the user can install.
    pub fn request_partner_apps(&self, params: &PlaytimeParams, callbacks: CampaignCallbacks) {
        self.partner_apps(PartnerAppsKind::All, params, callbacks);
    }

    /// Request partner apps with advance-plus rewards.
    pub fn request_advance_partner_apps(
        &self,
        params: &PlaytimeParams,
        callbacks: CampaignCallbacks,
    ) {
        self.partner_apps(PartnerAppsKind::Advance, params, callbacks);
    }

    /// Request partner apps already installed on the device.
    pub fn request_installed_partner_apps(
        &self,
        params: &PlaytimeParams,
        callbacks: CampaignCallbacks,
    ) {
        self.partner_apps(PartnerAppsKind::Installed, params, callbacks);
    }

    /// Register catalog open/close callbacks. Either may be `None`.
    pub fn set_catalog_listener(
        &self,
        opened: Option<Callback<String>>,
        closed: Option<Callback<String>>,
    ) {
        let listener = CatalogListener::new(self.context.clone(), opened, closed);
        debug!(?listener, "registering catalog listener");
        self.transport.set_catalog_listener(listener);
    }

    /// Record terms-of-service acceptance.
    pub fn set_tos_accepted(&self, callbacks: TosCallbacks) {
        let adapter = self.context.adapter("set_tos_accepted", callbacks);
        debug!(call_id = %adapter.call_id(), "issuing set_tos_accepted");
        self.transport.set_tos_accepted(adapter);
    }

    /// Start a face verification flow.
    pub fn face_verification(&self, callbacks: FaceVerificationCallbacks) {
        let adapter = self.context.adapter("face_verification", callbacks);
        debug!(call_id = %adapter.call_id(), "issuing face_verification");
        self.transport.face_verification(adapter);
    }

    /// Query the face verification status.
    pub fn face_verification_status(&self, callbacks: VerificationStatusCallbacks) {
        let adapter = self.context.adapter("face_verification_status", callbacks);
        debug!(call_id = %adapter.call_id(), "issuing face_verification_status");
        self.transport.face_verification_status(adapter);
    }

    /// Send the user to the store page of `package`. The named outcome
    /// `ExecutionState::AlreadyInProgress` reports a click still running.
    pub fn execute_click(
        &self,
        package: &str,
        sub_id1: Option<&str>,
        sub_id2: Option<&str>,
        callbacks: ClickCallbacks,
    ) {
        let adapter = self.context.adapter("execute_click", callbacks);
        debug!(call_id = %adapter.call_id(), package, "issuing execute_click");
        self.transport.execute_click(package, sub_id1, sub_id2, adapter);
    }

    /// Record that the listing of `package` was shown. The named outcome
    /// `ExecutionState::AlreadyInProgress` reports a view still running.
    pub fn execute_view(
        &self,
        package: &str,
        sub_id1: Option<&str>,
        sub_id2: Option<&str>,
        callbacks: ViewCallbacks,
    ) {
        let adapter = self.context.adapter("execute_view", callbacks);
        debug!(call_id = %adapter.call_id(), package, "issuing execute_view");
        self.transport.execute_view(package, sub_id1, sub_id2, adapter);
    }

    /// Open the service's catalog screen.
    pub fn show_catalog(&self, params: &PlaytimeParams) {
        self.transport.show_catalog(params);
    }

    /// Replace the acquisition parameters used by later requests.
    pub fn set_ua_params(&self, params: &PlaytimeParams) {
        self.transport.set_ua_params(params);
    }

    /// Report a host-side user event. Video events expect the partner app id
    /// in `extra`.
    pub fn send_user_event(&self, event: UserEvent, extra: Option<&str>, params: &PlaytimeParams) {
        if event.needs_app_id() && extra.is_none() {
            warn!(?event, "video event sent without an app id");
        }
        self.transport.send_user_event(event, extra, params);
    }

    /// Prepare the web view. Call before `execute_click` or `execute_view`.
    pub fn init_web_view(&self) {
        self.transport.init_web_view();
    }

    /// Open the system screen granting usage-data access.
    pub fn show_usage_permission_screen(&self) {
        self.transport.show_usage_permission_screen();
    }

    /// Numeric service version.
    pub fn version(&self) -> i32 {
        self.transport.version()
    }

    /// Human-readable service version.
    pub fn version_name(&self) -> String {
        self.transport.version_name()
    }

    /// `true` once initialization succeeded.
    pub fn is_initialized(&self) -> bool {
        self.transport.is_initialized()
    }

    /// `true` if the user accepted the terms of service.
    pub fn has_accepted_tos(&self) -> bool {
        self.transport.has_accepted_tos()
    }

    /// `true` if usage-data access was granted.
    pub fn has_accepted_usage_permission(&self) -> bool {
        self.transport.has_accepted_usage_permission()
    }

    /// Identifier the service assigned to the user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.transport.user_id()
    }

    fn partner_apps(
        &self,
        kind: PartnerAppsKind,
        params: &PlaytimeParams,
        callbacks: CampaignCallbacks,
    ) {
        let adapter = self.context.adapter("request_partner_apps", callbacks);
        debug!(call_id = %adapter.call_id(), ?kind, "issuing request_partner_apps");
        self.transport.request_partner_apps(kind, params, adapter);
    }
}
