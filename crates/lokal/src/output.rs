//! Output formatting: table, JSON, plain.

use std::io::{self, IsTerminal, Write};

use tabled::{Table, Tabled, settings::Style};

use lokal_api::Tunnel;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render a created tunnel in the chosen format.
///
/// - `table`: one row per populated field
/// - `json`: the tunnel's wire representation
/// - `plain`: the public address, then the LAN address, one per line
pub fn render_tunnel(format: &OutputFormat, tunnel: &Tunnel) -> Result<String, CliError> {
    let lan = tunnel.lan_address().ok();

    Ok(match format {
        OutputFormat::Table => {
            let port = tunnel.address_tunnel_port();
            let rows: Vec<FieldRow> = [
                ("ID", tunnel.id().to_owned()),
                ("Name", tunnel.name().to_owned()),
                (
                    "Type",
                    tunnel.tunnel_type().map(ToString::to_string).unwrap_or_default(),
                ),
                ("Local", tunnel.local_address().to_owned()),
                ("Public", tunnel.address_public().to_owned()),
                ("LAN", lan.unwrap_or_default()),
                ("Tunnel", tunnel.address_tunnel().to_owned()),
                (
                    "Tunnel Port",
                    if port == 0 { String::new() } else { port.to_string() },
                ),
                ("Server", tunnel.server_id().to_owned()),
            ]
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| FieldRow { field, value })
            .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&tunnel.snapshot())?,
        OutputFormat::Plain => [Some(tunnel.address_public().to_owned()), lan]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
