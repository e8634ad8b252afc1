// Tunnel lifecycle
//
// A `Tunnel` is configured locally, then `create` asks the daemon to start
// it and merges the daemon's view back in. Public tunnels on a non-HTTP
// protocol may get their port asynchronously; `public_address` polls the
// daemon once for it and asks the caller to come back later.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::Error;
use crate::models::{TunnelEnvelope, TunnelRecord, TunnelType};
use crate::options::Options;
use crate::version::{self, SERVER_MIN_VERSION};

const START_PATH: &str = "/api/tunnel/start";
const INFO_PATH: &str = "/api/tunnel/info";
const MDNS_SUFFIX: &str = ".local";

/// Where a tunnel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TunnelState {
    /// Missing a local address or any exposure target.
    Unconfigured,
    /// Ready to be created.
    Configured,
    /// The daemon accepted (or already had) the tunnel.
    Created,
    /// The public address carries its daemon-assigned port.
    Resolved,
}

/// Body of `POST /api/tunnel/start`.
#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    name: &'a str,
    tunnel_type: Option<&'a TunnelType>,
    local_address: &'a str,
    server_id: &'a str,
    address_tunnel: &'a str,
    address_tunnel_port: u16,
    address_public: &'a str,
    address_mdns: &'a str,
    inspect: bool,
    options: &'a Options,
}

/// A tunnel request and, once created, the daemon's view of it.
///
/// Setters return `&mut Self` for chaining:
///
/// ```no_run
/// # async fn run() -> Result<(), lokal_api::Error> {
/// let client = lokal_api::Client::local()?;
/// let mut tunnel = client.new_tunnel();
/// tunnel
///     .set_local_address("127.0.0.1:3000")
///     .set_tunnel_type("HTTP")
///     .set_lan_address("my-app.local")
///     .ignore_duplicate();
/// tunnel.create().await?;
/// println!("{}", tunnel.lan_address()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Tunnel {
    client: Client,
    state: TunnelState,

    id: String,
    server_id: String,
    name: String,
    tunnel_type: Option<TunnelType>,
    local_address: String,
    address_tunnel: String,
    address_tunnel_port: u16,
    address_public: String,
    address_mdns: String,
    inspect: bool,
    options: Options,

    ignore_duplicate: bool,
    startup_banner: bool,
}

impl Tunnel {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            state: TunnelState::Unconfigured,
            id: String::new(),
            server_id: String::new(),
            name: String::new(),
            tunnel_type: None,
            local_address: String::new(),
            address_tunnel: String::new(),
            address_tunnel_port: 0,
            address_public: String::new(),
            address_mdns: String::new(),
            inspect: false,
            options: Options::default(),
            ignore_duplicate: false,
            startup_banner: false,
        }
    }

    // ── Setters ──────────────────────────────────────────────────────

    /// `host:port` of the service being tunneled.
    pub fn set_local_address(&mut self, local_address: impl Into<String>) -> &mut Self {
        self.local_address = local_address.into();
        self.refresh_state();
        self
    }

    pub fn set_tunnel_type(&mut self, tunnel_type: impl Into<TunnelType>) -> &mut Self {
        self.tunnel_type = Some(tunnel_type.into());
        self
    }

    /// Enable request inspection on the daemon.
    pub fn set_inspection(&mut self, inspect: bool) -> &mut Self {
        self.inspect = inspect;
        self
    }

    /// mDNS name to expose on the LAN. A trailing `.local` is dropped;
    /// [`lan_address`](Self::lan_address) puts it back.
    pub fn set_lan_address(&mut self, lan_address: impl AsRef<str>) -> &mut Self {
        self.address_mdns = strip_mdns_suffix(lan_address.as_ref()).to_owned();
        self.refresh_state();
        self
    }

    /// Public address to request: empty, a bare host, or `host:port`.
    pub fn set_public_address(&mut self, public_address: impl Into<String>) -> &mut Self {
        self.address_public = public_address.into();
        self.refresh_state();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    /// Adopt an existing equivalent tunnel instead of failing on HTTP 409.
    pub fn ignore_duplicate(&mut self) -> &mut Self {
        self.ignore_duplicate = true;
        self
    }

    /// Print a summary banner after a successful `create`.
    pub fn show_startup_banner(&mut self) -> &mut Self {
        self.startup_banner = true;
        self
    }

    // ── Getters ──────────────────────────────────────────────────────

    pub fn state(&self) -> TunnelState {
        self.state
    }

    /// Daemon-assigned identifier; empty before creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tunnel_type(&self) -> Option<&TunnelType> {
        self.tunnel_type.as_ref()
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn address_tunnel(&self) -> &str {
        &self.address_tunnel
    }

    pub fn address_tunnel_port(&self) -> u16 {
        self.address_tunnel_port
    }

    /// Stored public address. May be a bare host whose port is still
    /// pending; use [`public_address`](Self::public_address) for a usable one.
    pub fn address_public(&self) -> &str {
        &self.address_public
    }

    /// Stored mDNS name, without the `.local` suffix.
    pub fn address_mdns(&self) -> &str {
        &self.address_mdns
    }

    pub fn inspection(&self) -> bool {
        self.inspect
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn is_ignoring_duplicate(&self) -> bool {
        self.ignore_duplicate
    }

    pub fn has_startup_banner(&self) -> bool {
        self.startup_banner
    }

    /// Current field values in wire form.
    pub fn snapshot(&self) -> TunnelRecord {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_owned())
        }

        TunnelRecord {
            id: non_empty(&self.id),
            name: non_empty(&self.name),
            tunnel_type: self.tunnel_type.clone(),
            local_address: non_empty(&self.local_address),
            server_id: non_empty(&self.server_id),
            address_tunnel: non_empty(&self.address_tunnel),
            address_tunnel_port: (self.address_tunnel_port != 0).then_some(self.address_tunnel_port),
            address_public: non_empty(&self.address_public),
            address_mdns: non_empty(&self.address_mdns),
            inspect: Some(self.inspect),
            options: Some(self.options.clone()),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Ask the daemon to start this tunnel.
    ///
    /// On success the daemon's tunnel object is merged into `self`. With
    /// [`ignore_duplicate`](Self::ignore_duplicate) set, an HTTP 409 is
    /// treated as success and the existing tunnel is adopted. Both paths
    /// reject a daemon older than [`SERVER_MIN_VERSION`]; every other
    /// failure is returned unchanged and leaves `self` as it was.
    pub async fn create(&mut self) -> Result<&mut Self, Error> {
        if self.address_mdns.is_empty() && self.address_public.is_empty() {
            return Err(Error::MissingExposureTarget);
        }

        let request = self.start_request();
        let outcome = self.client.transport().post(START_PATH, &request).await;

        let record = match outcome {
            Ok(response) => {
                self.client.check_server_version(&response)?;
                TunnelEnvelope::parse(&response.body)?.into_tunnel()?
            }
            Err(Error::DuplicateTunnel {
                body,
                server_version,
            }) if self.ignore_duplicate => {
                // Any 409 is taken to mean "this tunnel already exists".
                if let Some(ref server) = server_version {
                    version::check_version_str(server)?;
                }
                let record = TunnelEnvelope::parse(&body)?.into_first()?;
                info!(
                    id = record.id.as_deref().unwrap_or_default(),
                    "tunnel already exists, adopting it"
                );
                record
            }
            Err(e) => return Err(e),
        };

        self.merge(record);
        self.state = TunnelState::Created;

        if self.id.is_empty() || self.server_id.is_empty() {
            warn!(
                id = %self.id,
                server_id = %self.server_id,
                "daemon did not report a complete tunnel identity"
            );
        }
        debug!(id = %self.id, "tunnel created");

        if self.startup_banner {
            self.print_startup_banner();
        }

        Ok(self)
    }

    /// The `.local` name this tunnel is reachable under on the LAN.
    pub fn lan_address(&self) -> Result<String, Error> {
        if self.address_mdns.is_empty() {
            return Err(Error::NoLanAddressConfigured);
        }
        Ok(with_mdns_suffix(&self.address_mdns))
    }

    /// The usable public address.
    ///
    /// HTTP tunnels, and tunnels whose address already has a port, return
    /// immediately. Otherwise the port is still being allocated: the daemon
    /// is polled once, any port it reports is stored, and this call fails
    /// with [`Error::PortNotYetAssigned`]. The next call returns the stored
    /// address without touching the network.
    pub async fn public_address(&mut self) -> Result<String, Error> {
        if self.address_public.is_empty() {
            return Err(Error::NoPublicAddressRequested);
        }
        if self.state < TunnelState::Created {
            return Err(Error::TunnelNotCreated);
        }

        if self.port_pending() {
            self.refresh_public_port().await?;
            return Err(Error::PortNotYetAssigned);
        }

        if !self.is_http_like() {
            self.state = TunnelState::Resolved;
        }
        Ok(self.address_public.clone())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn start_request(&self) -> StartRequest<'_> {
        StartRequest {
            name: &self.name,
            tunnel_type: self.tunnel_type.as_ref(),
            local_address: &self.local_address,
            server_id: &self.server_id,
            address_tunnel: &self.address_tunnel,
            address_tunnel_port: self.address_tunnel_port,
            address_public: &self.address_public,
            address_mdns: &self.address_mdns,
            inspect: self.inspect,
            options: &self.options,
        }
    }

    fn is_http_like(&self) -> bool {
        self.tunnel_type.as_ref().is_some_and(TunnelType::is_http_like)
    }

    fn port_pending(&self) -> bool {
        !self.is_http_like() && !self.address_public.contains(':')
    }

    /// `GET /api/tunnel/info/{id}` and keep the public address if it now
    /// carries a port.
    async fn refresh_public_port(&mut self) -> Result<(), Error> {
        let path = format!("{INFO_PATH}/{}", self.id);
        let response = self.client.transport().get(&path).await?;
        self.client.check_server_version(&response)?;

        let record = TunnelEnvelope::parse(&response.body)?.into_tunnel()?;
        match record.address_public {
            Some(address) if address.contains(':') => {
                debug!(%address, "public port assigned");
                self.address_public = address;
            }
            _ => debug!("public port still pending"),
        }
        Ok(())
    }

    /// Copy every field the daemon reported onto `self`.
    fn merge(&mut self, record: TunnelRecord) {
        let TunnelRecord {
            id,
            name,
            tunnel_type,
            local_address,
            server_id,
            address_tunnel,
            address_tunnel_port,
            address_public,
            address_mdns,
            inspect,
            options,
        } = record;

        if let Some(id) = id {
            self.id = id;
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(tunnel_type) = tunnel_type {
            self.tunnel_type = Some(tunnel_type);
        }
        if let Some(local_address) = local_address {
            self.local_address = local_address;
        }
        if let Some(server_id) = server_id {
            self.server_id = server_id;
        }
        if let Some(address_tunnel) = address_tunnel {
            self.address_tunnel = address_tunnel;
        }
        if let Some(port) = address_tunnel_port {
            self.address_tunnel_port = port;
        }
        if let Some(address_public) = address_public {
            self.address_public = address_public;
        }
        if let Some(address_mdns) = address_mdns {
            self.address_mdns = strip_mdns_suffix(&address_mdns).to_owned();
        }
        if let Some(inspect) = inspect {
            self.inspect = inspect;
        }
        if let Some(options) = options {
            self.options = options;
        }
    }

    fn refresh_state(&mut self) {
        if self.state >= TunnelState::Created {
            return;
        }
        let exposed = !self.address_mdns.is_empty() || !self.address_public.is_empty();
        self.state = if exposed && !self.local_address.is_empty() {
            TunnelState::Configured
        } else {
            TunnelState::Unconfigured
        };
    }

    fn print_startup_banner(&self) {
        let public = (!self.address_public.is_empty()).then_some(self.address_public.as_str());
        let lan = self.lan_address().ok();
        self.client
            .banner()
            .render(SERVER_MIN_VERSION, public, lan.as_deref());
    }
}

fn strip_mdns_suffix(name: &str) -> &str {
    name.strip_suffix(MDNS_SUFFIX).unwrap_or(name)
}

fn with_mdns_suffix(name: &str) -> String {
    if name.ends_with(MDNS_SUFFIX) {
        name.to_owned()
    } else {
        format!("{name}{MDNS_SUFFIX}")
    }
}
