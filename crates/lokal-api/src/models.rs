// Daemon wire types
//
// Every daemon endpoint answers with the same envelope:
// `{ "success": bool, "message": "optional", "data": [tunnel, ...] }`.
// Tunnel fields are all optional on the way in; the client merges only
// the keys the daemon actually sent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::options::Options;

// ── Tunnel type ──────────────────────────────────────────────────────

/// Protocol the tunnel carries. Opaque to the client apart from
/// the HTTP check that decides whether a public port must be polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TunnelType {
    Http,
    Tcp,
    Udp,
    Other(String),
}

impl TunnelType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Other(s) => s,
        }
    }

    /// HTTP tunnels are routed by hostname and never get a dynamic port.
    pub fn is_http_like(&self) -> bool {
        matches!(self, Self::Http)
    }
}

impl From<String> for TunnelType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "HTTP" => Self::Http,
            "TCP" => Self::Tcp,
            "UDP" => Self::Udp,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for TunnelType {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<TunnelType> for String {
    fn from(value: TunnelType) -> Self {
        match value {
            TunnelType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tunnel record ────────────────────────────────────────────────────

/// A tunnel object as the daemon reports it.
///
/// Unknown keys are ignored. `null` and absent keys both land as `None`
/// and leave the local value untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel_type: Option<TunnelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_tunnel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_tunnel_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_public: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_mdns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

// ── Response envelope ────────────────────────────────────────────────

/// Standard daemon response envelope.
#[derive(Debug, Deserialize)]
pub struct TunnelEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<TunnelRecord>>,
}

impl TunnelEnvelope {
    /// Parse a response body, keeping the raw text on failure.
    pub fn parse(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.to_owned(),
            }
        })
    }

    /// The payload of a successful response.
    ///
    /// `success: false` becomes [`Error::RequestRejected`] with the
    /// daemon's message, regardless of the HTTP status it came with.
    pub fn into_tunnel(self) -> Result<TunnelRecord, Error> {
        if !self.success {
            return Err(Error::RequestRejected {
                message: self
                    .message
                    .unwrap_or_else(|| "request rejected by daemon".into()),
            });
        }
        self.into_first()
    }

    /// The first tunnel in `data`, ignoring the `success` flag.
    pub fn into_first(self) -> Result<TunnelRecord, Error> {
        self.data
            .and_then(|data| data.into_iter().next())
            .ok_or(Error::MissingTunnelData)
    }
}
