//! Request parameters and initialization options.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User-acquisition parameters attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeParams {
    /// Acquisition network.
    pub ua_network: Option<String>,
    /// Acquisition channel.
    pub ua_channel: Option<String>,
    /// Sub-publisher, encrypted form.
    pub ua_sub_publisher_encrypted: Option<String>,
    /// Sub-publisher, clear text.
    pub ua_sub_publisher_cleartext: Option<String>,
    /// Placement within the host app.
    pub placement: Option<String>,
}

impl PlaytimeParams {
    /// Empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for network plus channel.
    pub fn ua(network: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::new().with_ua_network(network).with_ua_channel(channel)
    }

    /// Set the acquisition network.
    #[must_use]
    pub fn with_ua_network(mut self, val: impl Into<String>) -> Self {
        self.ua_network = Some(val.into());
        self
    }

    /// Set the acquisition channel.
    #[must_use]
    pub fn with_ua_channel(mut self, val: impl Into<String>) -> Self {
        self.ua_channel = Some(val.into());
        self
    }

    /// Set the encrypted sub-publisher.
    #[must_use]
    pub fn with_ua_sub_publisher_encrypted(mut self, val: impl Into<String>) -> Self {
        self.ua_sub_publisher_encrypted = Some(val.into());
        self
    }

    /// Set the clear-text sub-publisher.
    #[must_use]
    pub fn with_ua_sub_publisher_cleartext(mut self, val: impl Into<String>) -> Self {
        self.ua_sub_publisher_cleartext = Some(val.into());
        self
    }

    /// Set the placement.
    #[must_use]
    pub fn with_placement(mut self, val: impl Into<String>) -> Self {
        self.placement = Some(val.into());
        self
    }
}

/// Extra sub ids attached to the user at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeExtensions {
    /// First sub id.
    pub sub_id1: Option<String>,
    /// Second sub id.
    pub sub_id2: Option<String>,
    /// Third sub id.
    pub sub_id3: Option<String>,
    /// Fourth sub id.
    pub sub_id4: Option<String>,
    /// Fifth sub id.
    pub sub_id5: Option<String>,
}

impl PlaytimeExtensions {
    /// No sub ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first sub id.
    #[must_use]
    pub fn with_sub_id1(mut self, val: impl Into<String>) -> Self {
        self.sub_id1 = Some(val.into());
        self
    }

    /// Set the second sub id.
    #[must_use]
    pub fn with_sub_id2(mut self, val: impl Into<String>) -> Self {
        self.sub_id2 = Some(val.into());
        self
    }

    /// Set the third sub id.
    #[must_use]
    pub fn with_sub_id3(mut self, val: impl Into<String>) -> Self {
        self.sub_id3 = Some(val.into());
        self
    }

    /// Set the fourth sub id.
    #[must_use]
    pub fn with_sub_id4(mut self, val: impl Into<String>) -> Self {
        self.sub_id4 = Some(val.into());
        self
    }

    /// Set the fifth sub id.
    #[must_use]
    pub fn with_sub_id5(mut self, val: impl Into<String>) -> Self {
        self.sub_id5 = Some(val.into());
        self
    }
}

/// Gender reported in a [`PlaytimeUserProfile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaytimeGender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Not disclosed.
    #[default]
    Unknown,
}

/// Demographic profile passed at initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeUserProfile {
    /// Reported gender.
    pub gender: PlaytimeGender,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
}

impl PlaytimeUserProfile {
    /// Empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gender.
    #[must_use]
    pub const fn with_gender(mut self, gender: PlaytimeGender) -> Self {
        self.gender = gender;
        self
    }

    /// Set the date of birth.
    #[must_use]
    pub const fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }

    /// Birthday as milliseconds since the Unix epoch, at UTC midnight.
    #[must_use]
    pub fn birthday_epoch_millis(&self) -> Option<i64> {
        self.birthday
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }
}

/// Options passed to service initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeOptions {
    /// Host-chosen user identifier.
    pub user_id: Option<String>,
    /// The host already collected terms-of-service consent.
    pub tos_accepted: bool,
    /// Process the service should run in.
    pub application_process_name: Option<String>,
    /// Acquisition parameters applied to every request.
    pub params: Option<PlaytimeParams>,
    /// Extra sub ids.
    pub extensions: Option<PlaytimeExtensions>,
    /// Demographic profile.
    pub user_profile: Option<PlaytimeUserProfile>,
}

impl PlaytimeOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user identifier.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Record that the user accepted the terms of service in the host app.
    #[must_use]
    pub const fn with_tos_accepted(mut self, accepted: bool) -> Self {
        self.tos_accepted = accepted;
        self
    }

    /// Set the application process name.
    #[must_use]
    pub fn with_application_process_name(mut self, name: impl Into<String>) -> Self {
        self.application_process_name = Some(name.into());
        self
    }

    /// Set the default acquisition parameters.
    #[must_use]
    pub fn with_params(mut self, params: PlaytimeParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Set the extra sub ids.
    #[must_use]
    pub fn with_extensions(mut self, extensions: PlaytimeExtensions) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Set the demographic profile.
    #[must_use]
    pub const fn with_user_profile(mut self, profile: PlaytimeUserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let params = PlaytimeParams::ua("network", "channel").with_placement("shop");
        assert_eq!(params.ua_network.as_deref(), Some("network"));
        assert_eq!(params.ua_channel.as_deref(), Some("channel"));
        assert_eq!(params.placement.as_deref(), Some("shop"));
        assert!(params.ua_sub_publisher_cleartext.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = PlaytimeOptions::new()
            .with_user_id("user-1")
            .with_params(PlaytimeParams::new().with_placement("menu"));
        assert_eq!(options.user_id.as_deref(), Some("user-1"));
        assert_eq!(
            options.params.and_then(|p| p.placement).as_deref(),
            Some("menu")
        );
    }

    #[test]
    fn test_options_carry_extensions_and_profile() {
        let options = PlaytimeOptions::new()
            .with_tos_accepted(true)
            .with_extensions(PlaytimeExtensions::new().with_sub_id1("a").with_sub_id5("e"))
            .with_user_profile(PlaytimeUserProfile::new().with_gender(PlaytimeGender::Female));
        assert!(options.tos_accepted);
        let extensions = options.extensions.unwrap();
        assert_eq!(extensions.sub_id1.as_deref(), Some("a"));
        assert!(extensions.sub_id3.is_none());
        assert_eq!(extensions.sub_id5.as_deref(), Some("e"));
        assert_eq!(options.user_profile.unwrap().gender, PlaytimeGender::Female);
    }

    #[test]
    fn test_birthday_epoch_millis() {
        let profile = PlaytimeUserProfile::new();
        assert_eq!(profile.gender, PlaytimeGender::Unknown);
        assert!(profile.birthday_epoch_millis().is_none());

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        let profile = profile.with_birthday(epoch);
        assert_eq!(profile.birthday_epoch_millis(), Some(86_400_000));
    }

    #[test]
    fn test_user_profile_json() {
        let profile = PlaytimeUserProfile::new()
            .with_gender(PlaytimeGender::Male)
            .with_birthday(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"gender":"MALE","birthday":"1990-05-17"}"#);
    }
}
