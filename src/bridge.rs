use std::{collections::VecDeque, time::Duration};

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{
    io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    select,
    time::{interval, MissedTickBehavior},
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, instrument, trace, warn};

use crate::ash::{self, AshConfig, BufferedPort, Engine, Role, MAX_DATA_FIELD_LEN};

/// Timer service interval while both streams are quiet.
const TICK: Duration = Duration::from_millis(10);
/// Bytes the engine may write toward the NCP per pass.
const NCP_TX_LIMIT: usize = 256;
/// Client payloads held while the link has no transmit space.
const BACKLOG_LIMIT: usize = 32;

/// Client payloads travel as a 2-byte big-endian length followed by the
/// payload.
pub fn client_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(2)
        .max_frame_length(MAX_DATA_FIELD_LEN)
        .new_codec()
}

/// Run one client session: payloads from `client` go to the NCP in DATA
/// frames and DATA frames from the NCP go back to `client`.
///
/// The ASH link is reset when the session starts and again whenever it
/// drops. Returns once the client disconnects.
#[instrument(skip_all)]
pub async fn handle<C, N>(client: C, ncp: N, config: &AshConfig) -> Result<()>
where
    C: AsyncRead + AsyncWrite + Unpin,
    N: AsyncRead + AsyncWrite + Unpin,
{
    let mut engine = Engine::new(config.clone(), Role::Host).context("Invalid ASH settings")?;
    let mut port = BufferedPort::new(NCP_TX_LIMIT);
    let mut client = Framed::new(client, client_codec());
    let (mut ncp_rx, mut ncp_tx) = split(ncp);
    let mut backlog: VecDeque<Bytes> = VecDeque::new();
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    engine.reset();
    loop {
        select! {
            res = ncp_rx.read_buf(port.rx_mut()) => {
                if res.context("Failed to read from NCP")? == 0 {
                    return Err(anyhow!("NCP stream closed"));
                }
            }
            item = client.next(), if backlog.len() < BACKLOG_LIMIT => match item {
                Some(Ok(payload)) => {
                    trace!(len = payload.len(), "Payload from client");
                    backlog.push_back(payload.freeze());
                }
                Some(Err(e)) => return Err(e).context("Failed to read from client"),
                None => {
                    info!(counters = ?engine.counters(), "Client disconnected");
                    return Ok(());
                }
            },
            _ = ticker.tick() => {}
        }

        while engine.is_tx_space_available() {
            let Some(payload) = backlog.pop_front() else {
                break;
            };
            if let Err(e) = engine.send(payload, false) {
                warn!(error = %e, "Dropping client payload: {}", e);
            }
        }

        if let Err(e) = engine.send_exec(&mut port) {
            recover(&mut engine, e);
        }
        loop {
            match engine.receive(&mut port) {
                Ok(Some(payload)) => client
                    .send(payload)
                    .await
                    .context("Failed to write to client")?,
                Ok(None) => break,
                Err(e) if e.needs_reset() => recover(&mut engine, e),
                Err(e) => debug!(error = %e, "Discarded frame from NCP"),
            }
        }
        // Acknowledgements for what was just received.
        if let Err(e) = engine.send_exec(&mut port) {
            recover(&mut engine, e);
        }

        if port.has_output() {
            ncp_tx
                .write_all_buf(port.tx_mut())
                .await
                .context("Failed to write to NCP")?;
        }
    }
}

fn recover(engine: &mut Engine, err: ash::Error) {
    warn!(error = %err, counters = ?engine.counters(), "ASH link dropped, resetting: {}", err);
    engine.reset();
}
