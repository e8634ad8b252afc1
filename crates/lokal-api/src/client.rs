// Lokal daemon client
//
// Holds the transport configuration (base URL, credentials, timeouts) and
// hands out `Tunnel` builders bound to it. Carries no per-tunnel state.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::banner::{Banner, TerminalBanner};
use crate::error::Error;
use crate::transport::{DaemonResponse, Transport, TransportConfig};
use crate::tunnel::Tunnel;
use crate::version;

/// Where the daemon listens unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6174";

/// Everything needed to reach a daemon.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            credentials: Credentials::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Session holder and [`Tunnel`] factory.
///
/// Cheap to clone: clones share the same pooled HTTP client.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Transport,
    banner: Arc<dyn Banner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let transport = Transport::new(
            config.base_url.clone(),
            &config.credentials,
            &config.transport,
        )?;
        Ok(Self {
            config: config.clone(),
            transport,
            banner: Arc::new(TerminalBanner::auto()),
        })
    }

    /// Client for a daemon on the default local address, without credentials.
    pub fn local() -> Result<Self, Error> {
        Self::new(&ClientConfig::default())
    }

    /// Replace the base URL and, when given, overlay new credentials.
    ///
    /// Basic auth and the API token are set independently: passing only a
    /// token keeps an existing username/password, and vice versa.
    ///
    /// Only tunnels created afterwards see the change. A [`Tunnel`] holds its
    /// own copy of the client, so existing tunnels keep talking to the old
    /// daemon with the old credentials.
    pub fn configure(
        &mut self,
        base_url: Url,
        credentials: Option<Credentials>,
    ) -> Result<&mut Self, Error> {
        let mut config = self.config.clone();
        config.base_url = base_url;
        if let Some(credentials) = credentials {
            config.credentials.overlay(credentials);
        }

        self.transport = Transport::new(
            config.base_url.clone(),
            &config.credentials,
            &config.transport,
        )?;
        self.config = config;
        debug!(base_url = %self.config.base_url, "client reconfigured");
        Ok(self)
    }

    /// Swap the renderer used for startup banners.
    pub fn with_banner(mut self, banner: impl Banner + 'static) -> Self {
        self.banner = Arc::new(banner);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A fresh, unconfigured tunnel bound to this client as it is now.
    /// Later [`configure`](Self::configure) calls do not reach it. No network call.
    pub fn new_tunnel(&self) -> Tunnel {
        Tunnel::new(self.clone())
    }

    /// Reject responses from a daemon older than the supported minimum.
    pub fn check_server_version(&self, response: &DaemonResponse) -> Result<(), Error> {
        version::check_server_version(&response.headers)
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn banner(&self) -> &dyn Banner {
        self.banner.as_ref()
    }
}
