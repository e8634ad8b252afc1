//! `lokal expose`: create a tunnel and report where it is reachable.

use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{debug, info};

use lokal_api::{Client, Error as ApiError, Options, Tunnel, TunnelType};

use crate::cli::{ExposeArgs, GlobalOpts, RuleArgs, TunnelKind};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ExposeArgs, client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let mut tunnel = build_tunnel(client, &args, global.quiet);

    tunnel.create().await?;
    info!(id = tunnel.id(), "tunnel ready");

    if args.wait_public {
        let address = wait_for_public_address(
            &mut tunnel,
            Duration::from_secs(args.poll_interval),
            args.max_attempts,
            global.quiet,
        )
        .await?;
        debug!(%address, "public address resolved");
    }

    let rendered = output::render_tunnel(&global.output, &tunnel)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn build_tunnel(client: &Client, args: &ExposeArgs, quiet: bool) -> Tunnel {
    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address(&args.local_address)
        .set_tunnel_type(tunnel_type(args.tunnel_type))
        .set_inspection(args.inspect)
        .set_options(rule_options(&args.rules));

    if let Some(ref name) = args.name {
        tunnel.set_name(name);
    }
    if let Some(ref lan) = args.lan {
        tunnel.set_lan_address(lan);
    }
    if let Some(ref public) = args.public {
        tunnel.set_public_address(public);
    }
    if args.ignore_duplicate {
        tunnel.ignore_duplicate();
    }
    if args.banner && !quiet {
        tunnel.show_startup_banner();
    }
    tunnel
}

fn tunnel_type(kind: TunnelKind) -> TunnelType {
    match kind {
        TunnelKind::Http => TunnelType::Http,
        TunnelKind::Tcp => TunnelType::Tcp,
        TunnelKind::Udp => TunnelType::Udp,
    }
}

fn rule_options(rules: &RuleArgs) -> Options {
    Options {
        basic_auth: rules.basic_auth.clone(),
        cidr_allow: rules.cidr_allow.clone(),
        cidr_deny: rules.cidr_deny.clone(),
        request_header_add: rules.request_header_add.clone(),
        request_header_remove: rules.request_header_remove.clone(),
        response_header_add: rules.response_header_add.clone(),
        response_header_remove: rules.response_header_remove.clone(),
        header_key: rules.header_key.clone(),
    }
}

/// Keep asking for the public address until its port is assigned.
///
/// Only `PortNotYetAssigned` is retried; any other error ends the wait.
async fn wait_for_public_address(
    tunnel: &mut Tunnel,
    interval: Duration,
    max_attempts: u32,
    quiet: bool,
) -> Result<String, CliError> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_message("waiting for the daemon to assign a public port");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut result = Err(CliError::PortPending {
        attempts: max_attempts,
    });
    for attempt in 1..=max_attempts {
        match tunnel.public_address().await {
            Ok(address) => {
                result = Ok(address);
                break;
            }
            Err(ApiError::PortNotYetAssigned) => {
                debug!(attempt, "public port not assigned yet");
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
            Err(e) => {
                result = Err(e.into());
                break;
            }
        }
    }

    spinner.finish_and_clear();
    result
}
