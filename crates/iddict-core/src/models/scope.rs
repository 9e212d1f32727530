//! Scope record.

use serde::{Deserialize, Serialize};

use crate::entity::{
    Entity, LocalizedStrings, Properties, Record, new_concurrency_token, new_identifier,
};

/// A named scope and the resources it grants access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// Unique identifier, assigned once at construction.
    pub id: String,

    /// Unique scope name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Public description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Localized descriptions, keyed by culture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<LocalizedStrings>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Localized display names, keyed by culture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_names: Option<LocalizedStrings>,

    /// Resources (audiences) associated with the scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,

    /// Additional properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    /// Optimistic concurrency token, regenerated on every update.
    pub concurrency_token: String,
}

impl Scope {
    /// Creates an empty scope with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_identifier(),
            name: None,
            description: None,
            descriptions: None,
            display_name: None,
            display_names: None,
            resources: None,
            properties: None,
            concurrency_token: new_concurrency_token(),
        }
    }

    /// Returns `true` if `resource` is associated with this scope.
    #[must_use]
    pub fn has_resource(&self, resource: &str) -> bool {
        self.resources
            .as_ref()
            .is_some_and(|resources| resources.iter().any(|r| r == resource))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Scope {
    const KIND: &'static str = "scope";

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

impl Entity for Scope {
    type Base = Self;

    fn base(&self) -> &Self {
        self
    }

    fn base_mut(&mut self) -> &mut Self {
        self
    }
}
