//! Application (OAuth client registration) record.

use serde::{Deserialize, Serialize};

use crate::entity::{
    Entity, LocalizedStrings, Properties, Record, new_concurrency_token, new_identifier,
};

/// A registered client application.
///
/// Authorizations and tokens reference an application through its `id`
/// (by value, without enforced referential integrity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Unique identifier, assigned once at construction.
    pub id: String,

    /// Client identifier; unique across applications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret. May be hashed or encrypted by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Client type (`confidential`, `public`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,

    /// Consent type (`explicit`, `implicit`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_type: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Localized display names, keyed by culture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_names: Option<LocalizedStrings>,

    /// Granted permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Logout callback URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_logout_redirect_uris: Option<Vec<String>>,

    /// Callback URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uris: Option<Vec<String>>,

    /// Requirements (e.g. PKCE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,

    /// Additional properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    /// Optimistic concurrency token, regenerated on every update.
    pub concurrency_token: String,
}

impl Application {
    /// Creates an empty application with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_identifier(),
            client_id: None,
            client_secret: None,
            client_type: None,
            consent_type: None,
            display_name: None,
            display_names: None,
            permissions: None,
            post_logout_redirect_uris: None,
            redirect_uris: None,
            requirements: None,
            properties: None,
            concurrency_token: new_concurrency_token(),
        }
    }

    /// Returns `true` if `address` is one of the registered redirect URIs.
    #[must_use]
    pub fn has_redirect_uri(&self, address: &str) -> bool {
        self.redirect_uris
            .as_ref()
            .is_some_and(|uris| uris.iter().any(|uri| uri == address))
    }

    /// Returns `true` if `address` is one of the registered logout redirect URIs.
    #[must_use]
    pub fn has_post_logout_redirect_uri(&self, address: &str) -> bool {
        self.post_logout_redirect_uris
            .as_ref()
            .is_some_and(|uris| uris.iter().any(|uri| uri == address))
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Application {
    const KIND: &'static str = "application";

    fn id(&self) -> &str {
        &self.id
    }

    fn concurrency_token(&self) -> &str {
        &self.concurrency_token
    }

    fn set_concurrency_token(&mut self, token: String) {
        self.concurrency_token = token;
    }
}

impl Entity for Application {
    type Base = Self;

    fn base(&self) -> &Self {
        self
    }

    fn base_mut(&mut self) -> &mut Self {
        self
    }
}
