//! Well-known status and type values stored on entities.

/// Authorization and token statuses.
pub mod statuses {
    /// Not yet active (e.g. a reference token awaiting redemption).
    pub const INACTIVE: &str = "inactive";
    /// Already redeemed.
    pub const REDEEMED: &str = "redeemed";
    /// Rejected by the user or the server.
    pub const REJECTED: &str = "rejected";
    /// Explicitly revoked.
    pub const REVOKED: &str = "revoked";
    /// Currently valid.
    pub const VALID: &str = "valid";
}

/// Authorization types.
pub mod authorization_types {
    /// Created for a single flow; pruned once no token references it.
    pub const AD_HOC: &str = "ad-hoc";
    /// Persisted consent.
    pub const PERMANENT: &str = "permanent";
}

/// Application client types.
pub mod client_types {
    /// Client able to keep a secret.
    pub const CONFIDENTIAL: &str = "confidential";
    /// Client without a secret.
    pub const PUBLIC: &str = "public";
}

/// Application consent types.
pub mod consent_types {
    pub const EXPLICIT: &str = "explicit";
    pub const EXTERNAL: &str = "external";
    pub const IMPLICIT: &str = "implicit";
    pub const SYSTEMATIC: &str = "systematic";
}

/// Token types.
pub mod token_types {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    pub const DEVICE_CODE: &str = "device_code";
    pub const ID_TOKEN: &str = "id_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER_CODE: &str = "user_code";
}
