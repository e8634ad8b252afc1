// Startup banner printed after a tunnel comes up.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write as _};

use owo_colors::{AnsiColors, OwoColorize};

const LOGO: &str = r"    __       _         _
   / /  ___ | | ____ _| |  ___  ___
  / /  / _ \| |/ / _  | | / __|/ _ \
 / /__| (_) |   < (_| | |_\__ \ (_) |
 \____/\___/|_|\_\__,_|_(_)___/\___/";

const PALETTE: [AnsiColors; 5] = [
    AnsiColors::Magenta,
    AnsiColors::Blue,
    AnsiColors::Cyan,
    AnsiColors::Green,
    AnsiColors::Red,
];

/// Renders a human-readable summary once a tunnel is up.
///
/// Called by [`Tunnel::create`](crate::Tunnel::create) when the startup
/// banner is enabled, after both fresh creation and duplicate adoption.
pub trait Banner: Send + Sync {
    fn render(&self, min_version: &str, public_address: Option<&str>, lan_address: Option<&str>);
}

/// Prints the Lokal logo and tunnel addresses to stdout.
#[derive(Debug, Clone, Copy)]
pub struct TerminalBanner {
    color: bool,
}

impl Default for TerminalBanner {
    fn default() -> Self {
        Self::auto()
    }
}

impl TerminalBanner {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn auto() -> Self {
        Self::new(io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
    }

    /// Build the banner text without printing it.
    pub fn compose(
        &self,
        min_version: &str,
        public_address: Option<&str>,
        lan_address: Option<&str>,
    ) -> String {
        let mut out = String::new();

        for (i, line) in LOGO.lines().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            if self.color {
                let _ = writeln!(out, "{}", line.color(color));
            } else {
                let _ = writeln!(out, "{line}");
            }
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "{}\t{min_version}",
            self.label("Minimum Lokal Client", AnsiColors::Red)
        );
        if let Some(address) = public_address {
            let _ = writeln!(
                out,
                "{}\t\thttps://{address}",
                self.label("Public Address", AnsiColors::Cyan)
            );
        }
        if let Some(address) = lan_address {
            let _ = writeln!(
                out,
                "{}\t\thttps://{address}",
                self.label("LAN Address", AnsiColors::Green)
            );
        }
        out
    }

    fn label(&self, text: &str, color: AnsiColors) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_owned()
        }
    }
}

impl Banner for TerminalBanner {
    fn render(&self, min_version: &str, public_address: Option<&str>, lan_address: Option<&str>) {
        let text = self.compose(min_version, public_address, lan_address);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{text}");
    }
}
