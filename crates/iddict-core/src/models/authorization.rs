//! Authorization record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::constants::{authorization_types, statuses};
use crate::entity::{Entity, Properties, Record, new_concurrency_token, new_identifier};

/// A grant of scopes by a subject to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    /// Unique identifier, assigned once at construction.
    pub id: String,

    /// Identifier of the owning application (weak reference).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    /// UTC creation date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::timestamp::option"
    )]
    pub creation_date: Option<OffsetDateTime>,

    /// Additional properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Status (`valid`, `revoked`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Subject the authorization was granted by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Authorization type (`ad-hoc`, `permanent`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Optimistic concurrency token, regenerated on every update.
    pub concurrency_token: String,
}

impl Authorization {
    /// Creates an empty authorization with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_identifier(),
            application_id: None,
            creation_date: None,
            properties: None,
            scopes: None,
            status: None,
            subject: None,
            kind: None,
            concurrency_token: new_concurrency_token(),
        }
    }

    /// Returns `true` if every scope in `requested` was granted.
    #[must_use]
    pub fn has_scopes<S: AsRef<str>>(&self, requested: &[S]) -> bool {
        let granted = self.scopes.as_deref().unwrap_or_default();
        requested
            .iter()
            .all(|scope| granted.iter().any(|g| g == scope.as_ref()))
    }

    /// Returns `true` if the status is `valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status.as_deref() == Some(statuses::VALID)
    }

    /// Returns `true` if the type is `ad-hoc`.
    #[must_use]
    pub fn is_ad_hoc(&self) -> bool {
        self.kind.as_deref() == Some(authorization_types::AD_HOC)
    }
}

impl Default for Authorization {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Authorization {
    const KIND: &'static str = "authorization";

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

impl Entity for Authorization {
    type Base = Self;

    fn base(&self) -> &Self {
        self
    }

    fn base_mut(&mut self) -> &mut Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_scope_subset() {
        let mut authorization = Authorization::new();
        authorization.scopes = Some(vec!["a".into(), "b".into(), "c".into()]);

        assert!(authorization.has_scopes(&["a", "b"]));
        assert!(!authorization.has_scopes(&["a", "z"]));
        assert!(authorization.has_scopes::<&str>(&[]));
    }

    #[test]
    fn test_no_scopes_only_matches_empty_request() {
        let authorization = Authorization::new();
        assert!(authorization.has_scopes::<&str>(&[]));
        assert!(!authorization.has_scopes(&["openid"]));
    }

    #[test]
    fn test_creation_date_is_unix_seconds() {
        let mut authorization = Authorization::new();
        authorization.creation_date = Some(datetime!(2024-01-01 00:00 UTC));
        authorization.kind = Some(authorization_types::AD_HOC.into());

        let json = serde_json::to_value(&authorization).unwrap();
        assert_eq!(json["creation_date"], 1_704_067_200);
        assert_eq!(json["type"], "ad-hoc");

        let restored: Authorization = serde_json::from_value(json).unwrap();
        assert_eq!(restored.creation_date, authorization.creation_date);
        assert!(restored.is_ad_hoc());
        assert!(!restored.is_valid());
    }
}
