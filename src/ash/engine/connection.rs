use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{Engine, Flags, SendState};
use crate::ash::{
    constants::ASH_VERSION_2,
    error::{Error, Result},
    types::ResetReason,
    FrameNumber,
};

/// Which side of the handshake the engine plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Sends RST and waits for RSTACK.
    Host,
    /// Answers RST with RSTACK.
    Ncp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    AwaitingRstAck,
    Connected,
}

impl Engine {
    /// Drop all link state and start a new handshake by sending CAN and RST.
    #[instrument(skip(self), fields(role = ?self.role))]
    pub fn reset(&mut self) {
        info!("Resetting ASH link");
        self.reinitialize();
        self.peer_reason = None;
        self.state = ConnectionState::AwaitingRstAck;
        self.flags.cancel_pending = true;
        self.flags.rst_pending = true;
    }

    /// Release every buffer and return all sequence state to its initial
    /// value. A frame being written is cancelled.
    pub(super) fn reinitialize(&mut self) {
        let mid_frame = self.encoder.is_mid_frame();
        self.flags = Flags {
            cancel_pending: mid_frame,
            xoff: self.flags.xoff,
            ..Default::default()
        };
        self.encoder.abort();
        self.send_state = SendState::Idle;
        self.queues.clear();
        self.frm_tx = FrameNumber::zero();
        self.frm_retx = FrameNumber::zero();
        self.ack_rx = FrameNumber::zero();
        self.ack_tx = FrameNumber::zero();
        self.frm_rx = FrameNumber::zero();
        self.timeouts = 0;
        self.ack_timer.reset();
        self.nr_timer.stop();
        self.reboot_timer.stop();
        self.rst_timer.stop();
    }

    pub(super) fn disconnect(&mut self) {
        self.reinitialize();
        self.state = ConnectionState::Disconnected;
    }

    /// Drop the link after a local failure and tell the peer why.
    pub(super) fn fail(&mut self, reason: ResetReason) {
        self.disconnect();
        self.local_reason = reason;
        self.flags.error_pending = true;
    }

    pub(super) fn enter_connected(&mut self) {
        self.state = ConnectionState::Connected;
    }

    pub(super) fn receive_rst(&mut self, now: Instant) -> Result<()> {
        self.reinitialize();
        match self.role {
            Role::Ncp => {
                info!("RST received, answering with RSTACK");
                self.local_reason = ResetReason::Software;
                self.state = ConnectionState::AwaitingRstAck;
                self.flags.rst_ack_pending = true;
                if !self.config.reboot_delay().is_zero() {
                    self.reboot_timer.start(now, self.config.reboot_delay());
                }
                Ok(())
            }
            Role::Host => {
                warn!("Peer sent RST, link must be renegotiated");
                self.state = ConnectionState::Disconnected;
                Err(Error::PeerReset)
            }
        }
    }

    pub(super) fn receive_rst_ack(&mut self, version: u8, code: u8) -> Result<()> {
        let expected = self.role == Role::Host
            && self.state == ConnectionState::AwaitingRstAck
            && !self.flags.rst_pending;
        if !expected {
            debug!(version, code, "Ignoring unexpected RSTACK");
            return Ok(());
        }
        self.rst_timer.stop();
        if version != ASH_VERSION_2 {
            warn!(version, "RSTACK carries an unsupported ASH version");
            self.disconnect();
            return Err(Error::UnsupportedVersion(version));
        }
        let reason = ResetReason::from(code);
        self.peer_reason = Some(reason);
        self.enter_connected();
        info!(?reason, "ASH link connected");
        Ok(())
    }

    pub(super) fn receive_error(&mut self, version: u8, code: u8) -> Result<()> {
        if self.state == ConnectionState::Disconnected {
            debug!(version, code, "Ignoring ERROR while disconnected");
            return Ok(());
        }
        warn!(version, code, "Peer reported error {:#04x}, link dropped", code);
        self.disconnect();
        Err(Error::PeerError { version, code })
    }
}
