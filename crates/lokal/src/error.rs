//! CLI error types with miette diagnostics.
//!
//! Maps `lokal_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use lokal_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const VERSION: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Lokal daemon: {reason}")]
    #[diagnostic(
        code(lokal::connection_failed),
        help(
            "Check that the Lokal daemon is running.\n\
             Point at another daemon with --base-url or LOKAL_BASE_URL."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(lokal::timeout),
        help("Increase the timeout with --timeout or check the daemon.")
    )]
    Timeout,

    #[error("The daemon refused the credentials (HTTP {status})")]
    #[diagnostic(
        code(lokal::auth_failed),
        help("Check --api-token, or --username and --password.")
    )]
    AuthFailed { status: u16 },

    #[error("Lokal daemon {server} is older than the minimum supported {minimum}")]
    #[diagnostic(
        code(lokal::version_mismatch),
        help("Update the Lokal daemon to {minimum} or newer.")
    )]
    VersionMismatch { server: String, minimum: String },

    // ── Tunnel ───────────────────────────────────────────────────────

    #[error("A tunnel for this address already exists")]
    #[diagnostic(
        code(lokal::conflict),
        help("Pass --ignore-duplicate to adopt the existing tunnel.")
    )]
    Conflict,

    #[error("Daemon rejected the tunnel: {message}")]
    #[diagnostic(code(lokal::rejected))]
    Rejected { message: String },

    #[error("Public port still not assigned after {attempts} checks")]
    #[diagnostic(
        code(lokal::port_pending),
        help("Raise --max-attempts or --poll-interval and try again.")
    )]
    PortPending { attempts: u32 },

    #[error("Daemon API error: {message}")]
    #[diagnostic(code(lokal::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lokal::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(lokal::config),
        help("Inspect the effective configuration with: lokal config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(lokal::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout | Self::PortPending { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::VersionMismatch { .. } => exit_code::VERSION,
            Self::Conflict => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── lokal_api::Error → CliError mapping ──────────────────────────────

impl From<lokal_api::Error> for CliError {
    fn from(err: lokal_api::Error) -> Self {
        use lokal_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) if e.is_timeout() => CliError::Timeout,
            ApiError::Transport(ref e) if e.is_connect() => CliError::ConnectionFailed {
                reason: e.to_string(),
            },

            ApiError::Status {
                status: status @ (401 | 403),
                ..
            } => CliError::AuthFailed { status },

            ApiError::DuplicateTunnel { .. } => CliError::Conflict,

            ApiError::RequestRejected { message } => CliError::Rejected { message },

            ApiError::VersionMismatch { server, minimum } => {
                CliError::VersionMismatch { server, minimum }
            }

            ApiError::MissingExposureTarget => CliError::Validation {
                field: "expose".into(),
                reason: "pass --lan, --public, or both".into(),
            },

            ApiError::InvalidHeader { message } => CliError::Validation {
                field: "api_token".into(),
                reason: message,
            },

            ApiError::InvalidUrl(e) => CliError::Validation {
                field: "base_url".into(),
                reason: e.to_string(),
            },

            other => CliError::Api {
                message: other.to_string(),
            },
        }
    }
}
