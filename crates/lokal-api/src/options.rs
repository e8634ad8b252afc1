// Tunnel access and header-rewrite rules.
//
// Plain data: every entry is an opaque rule string and the daemon does
// all validation. Serialized as a nested object in the start request.

use serde::{Deserialize, Deserializer, Serialize};

/// Whitelist/blacklist and header-rewrite rules attached to a tunnel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// `user:password` pairs required to reach the tunnel.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub basic_auth: Vec<String>,
    /// CIDR ranges allowed to connect.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cidr_allow: Vec<String>,
    /// CIDR ranges refused.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cidr_deny: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub request_header_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub request_header_remove: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub response_header_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub response_header_remove: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub header_key: Vec<String>,
}

/// The daemon sends `null` for a rule list it never populated.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no rule of any kind is set.
    pub fn is_empty(&self) -> bool {
        self.basic_auth.is_empty()
            && self.cidr_allow.is_empty()
            && self.cidr_deny.is_empty()
            && self.request_header_add.is_empty()
            && self.request_header_remove.is_empty()
            && self.response_header_add.is_empty()
            && self.response_header_remove.is_empty()
            && self.header_key.is_empty()
    }

    // ── Fluent adders ───────────────────────────────────────────────

    pub fn with_basic_auth(mut self, rule: impl Into<String>) -> Self {
        self.basic_auth.push(rule.into());
        self
    }

    pub fn with_cidr_allow(mut self, rule: impl Into<String>) -> Self {
        self.cidr_allow.push(rule.into());
        self
    }

    pub fn with_cidr_deny(mut self, rule: impl Into<String>) -> Self {
        self.cidr_deny.push(rule.into());
        self
    }

    pub fn with_request_header_add(mut self, rule: impl Into<String>) -> Self {
        self.request_header_add.push(rule.into());
        self
    }

    pub fn with_request_header_remove(mut self, rule: impl Into<String>) -> Self {
        self.request_header_remove.push(rule.into());
        self
    }

    pub fn with_response_header_add(mut self, rule: impl Into<String>) -> Self {
        self.response_header_add.push(rule.into());
        self
    }

    pub fn with_response_header_remove(mut self, rule: impl Into<String>) -> Self {
        self.response_header_remove.push(rule.into());
        self
    }

    pub fn with_header_key(mut self, rule: impl Into<String>) -> Self {
        self.header_key.push(rule.into());
        self
    }
}
