//! Store options: collection names and the database source.

use serde::{Deserialize, Serialize};

use iddict_core::{StoreError, StoreResult};

use crate::config::SqliteConfig;
use crate::database::SqliteDatabase;

/// Default collection holding applications.
pub const DEFAULT_APPLICATIONS_COLLECTION: &str = "openiddict_applications";
/// Default collection holding authorizations.
pub const DEFAULT_AUTHORIZATIONS_COLLECTION: &str = "openiddict_authorizations";
/// Default collection holding scopes.
pub const DEFAULT_SCOPES_COLLECTION: &str = "openiddict_scopes";
/// Default collection holding tokens.
pub const DEFAULT_TOKENS_COLLECTION: &str = "openiddict_tokens";

/// Names of the four collections (one table each).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub applications: String,
    pub authorizations: String,
    pub scopes: String,
    pub tokens: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            applications: DEFAULT_APPLICATIONS_COLLECTION.into(),
            authorizations: DEFAULT_AUTHORIZATIONS_COLLECTION.into(),
            scopes: DEFAULT_SCOPES_COLLECTION.into(),
            tokens: DEFAULT_TOKENS_COLLECTION.into(),
        }
    }
}

impl CollectionNames {
    /// Checks every name.
    ///
    /// # Errors
    ///
    /// Returns an argument error naming the first invalid collection.
    pub fn validate(&self) -> StoreResult<()> {
        validate_collection_name(&self.applications, "applications")?;
        validate_collection_name(&self.authorizations, "authorizations")?;
        validate_collection_name(&self.scopes, "scopes")?;
        validate_collection_name(&self.tokens, "tokens")?;
        Ok(())
    }
}

/// Checks that `name` is usable as a table name.
///
/// Names are interpolated into SQL, so only ASCII alphanumerics and `_`
/// are accepted.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] if the name is empty or contains
/// other characters.
pub fn validate_collection_name(name: &str, parameter: &'static str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::empty_argument(parameter, "collection name"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::invalid_argument(
            parameter,
            format!(
                "The collection name '{name}' is invalid: only ASCII letters, digits and \
                 underscores are allowed."
            ),
        ));
    }
    Ok(())
}

/// Options shared by the SQLite stores.
#[derive(Debug, Clone, Default)]
pub struct SqliteOptions {
    /// Collection names.
    pub collections: CollectionNames,

    /// Pre-bound database handle; preferred over `connection`.
    pub database: Option<SqliteDatabase>,

    /// Settings used to open the database when no handle is bound.
    pub connection: Option<SqliteConfig>,
}
