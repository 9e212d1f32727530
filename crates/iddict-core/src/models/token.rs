//! Token record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::constants::statuses;
use crate::entity::{Entity, Properties, Record, new_concurrency_token, new_identifier};

/// A token issued to an application, optionally tied to an authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Unique identifier, assigned once at construction.
    pub id: String,

    /// Identifier of the owning application (weak reference).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    /// Identifier of the owning authorization (weak reference).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_id: Option<String>,

    /// UTC creation date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::timestamp::option"
    )]
    pub creation_date: Option<OffsetDateTime>,

    /// UTC expiration date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::timestamp::option"
    )]
    pub expiration_date: Option<OffsetDateTime>,

    /// UTC redemption date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::timestamp::option"
    )]
    pub redemption_date: Option<OffsetDateTime>,

    /// Payload of a reference token. May be encrypted by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Reference identifier of a reference token; unique when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,

    /// Additional properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    /// Status (`valid`, `inactive`, `redeemed`, `revoked`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Subject the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Token type (`access_token`, `refresh_token`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Optimistic concurrency token, regenerated on every update.
    pub concurrency_token: String,
}

impl Token {
    /// Creates an empty token with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_identifier(),
            application_id: None,
            authorization_id: None,
            creation_date: None,
            expiration_date: None,
            redemption_date: None,
            payload: None,
            reference_id: None,
            properties: None,
            status: None,
            subject: None,
            kind: None,
            concurrency_token: new_concurrency_token(),
        }
    }

    /// Returns `true` if the token has an expiration date in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiration_date
            .is_some_and(|exp| exp < OffsetDateTime::now_utc())
    }

    /// Returns `true` if the status is `valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status.as_deref() == Some(statuses::VALID)
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Token {
    const KIND: &'static str = "token";

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

impl Entity for Token {
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
    use time::Duration;

    #[test]
    fn test_is_expired() {
        let mut token = Token::new();
        assert!(!token.is_expired());

        token.expiration_date = Some(OffsetDateTime::now_utc() - Duration::minutes(5));
        assert!(token.is_expired());

        token.expiration_date = Some(OffsetDateTime::now_utc() + Duration::hours(1));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let token = Token::new();
        let json = serde_json::to_value(&token).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("id"));
        assert!(object.contains_key("concurrency_token"));
    }
}
