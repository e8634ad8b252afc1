use thiserror::Error;

/// Top-level error type for the `lokal-api` crate.
///
/// Covers request preconditions, daemon-reported failures, version
/// negotiation, and the HTTP transport. `lokal` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Preconditions ───────────────────────────────────────────────
    /// Neither a LAN nor a public address was requested before `create`.
    #[error("Please enable either LAN address or random/custom public URL")]
    MissingExposureTarget,

    /// `public_address` called on a tunnel that never asked for one.
    #[error("Public address is not requested by client")]
    NoPublicAddressRequested,

    /// `lan_address` called on a tunnel without an mDNS name.
    #[error("LAN address is not being set")]
    NoLanAddressConfigured,

    /// The tunnel has no daemon-assigned identity yet.
    #[error("Tunnel has not been created yet")]
    TunnelNotCreated,

    // ── Daemon ──────────────────────────────────────────────────────
    /// The daemon answered with `success: false`.
    #[error("Tunnel request rejected: {message}")]
    RequestRejected { message: String },

    /// The daemon is older than the minimum version this client supports.
    #[error(
        "Your local client is outdated, please update to minimum version {minimum} (server reports {server})"
    )]
    VersionMismatch { server: String, minimum: String },

    /// The version header was present but not a semantic version.
    #[error("Server reported an invalid version: {value:?}")]
    InvalidServerVersion { value: String },

    /// The response envelope carried no tunnel object.
    #[error("Daemon response did not include tunnel data")]
    MissingTunnelData,

    /// The public address uses a dynamic port that is still being allocated.
    /// Call again later.
    #[error(
        "Tunnel is using a random port, but it has not been assigned yet. Please try again later"
    )]
    PortNotYetAssigned,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP 409 from the daemon: an equivalent tunnel already exists.
    /// Carries the raw body and the daemon's advertised version, if any.
    #[error("Tunnel already exists (HTTP 409)")]
    DuplicateTunnel {
        body: String,
        server_version: Option<String>,
    },

    /// Any other non-2xx status from the daemon.
    #[error("Daemon returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP transport error (connection refused, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential could not be encoded as a header value.
    #[error("Invalid header value: {message}")]
    InvalidHeader { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status code carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::DuplicateTunnel { .. } => Some(409),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for the daemon's duplicate-tunnel conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateTunnel { .. })
    }

    /// Returns `true` if calling again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PortNotYetAssigned => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
