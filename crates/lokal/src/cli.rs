//! Clap derive structures for the `lokal` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lokal -- expose local services on the LAN and the internet
#[derive(Debug, Parser)]
#[command(
    name = "lokal",
    version,
    about = "Expose local services through the Lokal tunnel daemon",
    long_about = "Asks a locally running Lokal daemon to tunnel a local address,\n\
        either under a .local mDNS name on the LAN, a public address, or both.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Daemon URL (default http://127.0.0.1:6174)
    #[arg(long, short = 'u', env = "LOKAL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Username for basic auth
    #[arg(long, env = "LOKAL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for basic auth
    #[arg(long, env = "LOKAL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API token sent as X-Auth-Token
    #[arg(long, env = "LOKAL_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "LOKAL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Bare addresses, one per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a tunnel for a local address
    #[command(alias = "up")]
    Expose(ExposeArgs),

    /// Inspect and write the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TunnelKind {
    Http,
    Tcp,
    Udp,
}

#[derive(Debug, Args)]
pub struct ExposeArgs {
    /// Local address to tunnel (host:port)
    #[arg(long, short = 'l', value_name = "HOST:PORT")]
    pub local_address: String,

    /// Tunnel name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Tunnel protocol
    #[arg(long = "type", short = 't', value_enum, default_value = "http")]
    pub tunnel_type: TunnelKind,

    /// mDNS name on the LAN (".local" optional)
    #[arg(long)]
    pub lan: Option<String>,

    /// Public address to request (host or host:port)
    #[arg(long)]
    pub public: Option<String>,

    /// Enable request inspection
    #[arg(long)]
    pub inspect: bool,

    /// Adopt an existing identical tunnel instead of failing
    #[arg(long)]
    pub ignore_duplicate: bool,

    /// Print the startup banner once the tunnel is up
    #[arg(long)]
    pub banner: bool,

    /// Wait until the daemon assigns the public port
    #[arg(long, requires = "public")]
    pub wait_public: bool,

    /// Seconds between public port checks
    #[arg(long, default_value_t = 2)]
    pub poll_interval: u64,

    /// Give up waiting after this many checks (a pending port takes at least 2)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(2..))]
    pub max_attempts: u32,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Access and header-rewrite rules; each flag may be repeated.
#[derive(Debug, Args)]
#[command(next_help_heading = "Rules")]
pub struct RuleArgs {
    /// Require basic auth
    #[arg(long, value_name = "USER:PASS")]
    pub basic_auth: Vec<String>,

    /// Allow a CIDR range
    #[arg(long, value_name = "CIDR")]
    pub cidr_allow: Vec<String>,

    /// Deny a CIDR range
    #[arg(long, value_name = "CIDR")]
    pub cidr_deny: Vec<String>,

    /// Add a request header
    #[arg(long, value_name = "RULE")]
    pub request_header_add: Vec<String>,

    /// Remove a request header
    #[arg(long, value_name = "RULE")]
    pub request_header_remove: Vec<String>,

    /// Add a response header
    #[arg(long, value_name = "RULE")]
    pub response_header_add: Vec<String>,

    /// Remove a response header
    #[arg(long, value_name = "RULE")]
    pub response_header_remove: Vec<String>,

    /// Require a header key
    #[arg(long, value_name = "KEY")]
    pub header_key: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Show the effective configuration (secrets masked)
    Show,
    /// Write the effective configuration (flags + env) to the config file
    Init,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
