// lokal-api: Async Rust client for the Lokal tunnel daemon

pub mod auth;
pub mod banner;
pub mod client;
pub mod error;
pub mod models;
pub mod options;
pub mod transport;
pub mod tunnel;
pub mod version;

pub use auth::{BasicAuth, Credentials};
pub use banner::{Banner, TerminalBanner};
pub use client::{Client, ClientConfig, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{TunnelEnvelope, TunnelRecord, TunnelType};
pub use options::Options;
pub use transport::{DaemonResponse, Transport, TransportConfig};
pub use tunnel::{Tunnel, TunnelState};
pub use version::{SERVER_MIN_VERSION, SERVER_VERSION_HEADER};
