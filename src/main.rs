#![allow(dead_code)]

mod ash;
mod bridge;
mod logging;
mod settings;
#[cfg(test)]
mod test;

use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use bridge::handle;
use logging::setup_logging;
use settings::Settings;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, instrument};

/// Bridge EZSP payloads from TCP clients to an NCP speaking ASH.
#[derive(FromArgs, Debug)]
struct Args {
    /// path to the configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// NCP endpoint, overriding the configured one
    #[argh(option)]
    ncp: Option<String>,
}

/// The bridge listens on the configured port for one client at a time.
/// Each client gets a fresh connection to the NCP and a fresh ASH link.
///
/// ## Client protocol
///
/// Every message in either direction is a 2-byte big-endian length followed
/// by that many bytes of EZSP payload, between 3 and 128 bytes long.
///
/// ## NCP link
///
/// The bridge plays the host side of ASH: it sends RST, waits for RSTACK and
/// then carries client payloads in DATA frames. Frames the NCP sends are
/// acknowledged and their payloads forwarded to the client. Whenever the link
/// drops the bridge resets it and keeps going; payloads queued at that point
/// are lost.
#[instrument]
#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let mut settings = Settings::new(args.config.as_deref())?;
    if let Some(ncp) = args.ncp {
        settings.ncp.address = ncp;
    }
    setup_logging(settings.loglevel, settings.json_logs);

    let addr = settings.socket_addr();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!({ error = ?e }, "Unable to bind listener at {}: {}", addr, e);
        e
    })?;
    info!("Server listening at {}", addr);

    loop {
        let (client, client_addr) = loop {
            match listener.accept().await {
                Ok(v) => break v,
                Err(e) => {
                    error!(error = ?e, "Failed to accept connection from client: {}", e);
                }
            };
        };
        info!(%client_addr, "Received connection from {}", client_addr);

        let ncp = match TcpStream::connect(&settings.ncp.address).await {
            Ok(ncp) => ncp,
            Err(e) => {
                error!(error = %e, ncp = %settings.ncp.address, "Unable to reach NCP: {}", e);
                continue;
            }
        };
        client.set_nodelay(true)?;
        ncp.set_nodelay(true)?;

        match handle(client, ncp, &settings.ash).await {
            Ok(()) => info!(%client_addr, "Connection to {} closed", client_addr),
            Err(e) => error!(error = %e, %client_addr, "Session with {} failed: {:#}", client_addr, e),
        }
    }
}
