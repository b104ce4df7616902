mod connection;
mod receive;
mod transmit;

use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

pub use self::connection::{ConnectionState, Role};
use super::{
    codec::{FrameDecoder, FrameEncoder},
    config::{AshConfig, ConfigError},
    constants::{MAX_DATA_FIELD_LEN, MIN_DATA_FIELD_LEN},
    counters::Counters,
    error::{Error, Result},
    port::SerialPort,
    queues::Queues,
    timer::{AckTimer, Timer},
    types::ResetReason,
    FrameNumber,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendState {
    Idle,
    SendingShortFrame,
    SendingDataFrame,
    RetransmittingDataFrame,
}

#[derive(Debug, Default)]
struct Flags {
    reject: bool,
    retransmitting: bool,
    nak_pending: bool,
    ack_pending: bool,
    rst_pending: bool,
    rst_ack_pending: bool,
    error_pending: bool,
    cancel_pending: bool,
    /// An in-sequence DATA frame was dropped because the receive slot was full.
    rx_dropped: bool,
    /// The last ACK or NAK sent carried the not-ready flag.
    not_ready_sent: bool,
    /// XOFF received and not yet followed by XON.
    xoff: bool,
}

/// A polled ASH link endpoint.
///
/// The engine owns every buffer and counter of one link. It never blocks:
/// [`Engine::send_exec`] writes while the port has room and
/// [`Engine::poll_receive`] reads while the port has bytes.
#[derive(Debug)]
pub struct Engine {
    config: AshConfig,
    role: Role,
    state: ConnectionState,
    flags: Flags,
    send_state: SendState,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    queues: Queues,
    /// Next frame number to send.
    frm_tx: FrameNumber,
    /// Next frame number to retransmit.
    frm_retx: FrameNumber,
    /// Oldest unacknowledged frame number.
    ack_rx: FrameNumber,
    /// Last acknowledgement number sent.
    ack_tx: FrameNumber,
    /// Next frame number expected from the peer.
    frm_rx: FrameNumber,
    /// Consecutive ACK timeouts.
    timeouts: u16,
    ack_timer: AckTimer,
    nr_timer: Timer,
    reboot_timer: Timer,
    rst_timer: Timer,
    /// Code sent in our RSTACK and ERROR frames.
    local_reason: ResetReason,
    /// Code received in the peer's RSTACK.
    peer_reason: Option<ResetReason>,
    counters: Counters,
}

impl Engine {
    pub fn new(config: AshConfig, role: Role) -> std::result::Result<Engine, ConfigError> {
        config.validate()?;
        Ok(Engine {
            ack_timer: AckTimer::new(
                config.ack_time_init(),
                config.ack_time_min(),
                config.ack_time_max(),
            ),
            queues: Queues::new(config.tx_buffers),
            config,
            role,
            state: ConnectionState::Disconnected,
            flags: Flags::default(),
            send_state: SendState::Idle,
            encoder: FrameEncoder::idle(),
            decoder: FrameDecoder::new(),
            frm_tx: FrameNumber::zero(),
            frm_retx: FrameNumber::zero(),
            ack_rx: FrameNumber::zero(),
            ack_tx: FrameNumber::zero(),
            frm_rx: FrameNumber::zero(),
            timeouts: 0,
            nr_timer: Timer::default(),
            reboot_timer: Timer::default(),
            rst_timer: Timer::default(),
            local_reason: ResetReason::PowerOn,
            peer_reason: None,
            counters: Counters::default(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    /// Reset reason reported by the peer's last RSTACK.
    pub fn reset_reason(&self) -> Option<ResetReason> {
        self.peer_reason
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// DATA frames sent and not yet acknowledged.
    pub fn outstanding(&self) -> usize {
        (self.frm_tx - self.ack_rx) as usize
    }

    /// Current adaptive ACK timeout.
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timer.period()
    }

    /// Transmit buffers currently owned by the queues.
    pub fn buffers_in_use(&self) -> usize {
        self.queues.buffers_in_use()
    }

    pub fn is_tx_space_available(&self) -> bool {
        self.is_connected() && self.queues.has_tx_space()
    }

    /// Queue an opaque payload for transmission in a DATA frame.
    pub fn send(&mut self, payload: Bytes, high_priority: bool) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        if !(MIN_DATA_FIELD_LEN..=MAX_DATA_FIELD_LEN).contains(&payload.len()) {
            return Err(Error::InvalidPayload(payload.len()));
        }
        let len = payload.len();
        self.queues
            .enqueue(payload, high_priority)
            .map_err(|_| Error::NoTxSpace)?;
        trace!(len, high_priority, "Queued payload");
        Ok(())
    }

    /// Hand the received payload, if any, to the caller.
    pub fn take_received(&mut self) -> Option<Bytes> {
        let payload = self.queues.take_received()?;
        if self.flags.rx_dropped {
            // The peer will not resend the dropped frame until it times out.
            self.flags.rx_dropped = false;
            self.flags.nak_pending = true;
        } else if self.flags.not_ready_sent {
            self.flags.ack_pending = true;
        }
        Some(payload)
    }

    /// Process incoming bytes until a DATA payload is available or the port
    /// runs dry.
    ///
    /// Recoverable errors are returned as they happen; call again to keep
    /// going. Errors for which [`Error::needs_reset`] is true mean the link
    /// dropped.
    pub fn receive(&mut self, port: &mut impl SerialPort) -> Result<Option<Bytes>> {
        loop {
            if let Some(payload) = self.take_received() {
                return Ok(Some(payload));
            }
            if !self.poll_receive(port)? {
                return Ok(None);
            }
        }
    }
}
