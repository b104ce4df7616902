use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::{ConnectionState, Engine, SendState};
use crate::ash::{
    codec::FrameEncoder,
    constants::{ASH_VERSION_2, CANCEL_BYTE},
    error::{Error, Result},
    frame::Frame,
    port::SerialPort,
    types::ResetReason,
};

impl Engine {
    /// Service the timers, then write frame bytes while the port accepts
    /// them.
    ///
    /// Fatal timer expiries are reported here; the bytes telling the peer
    /// about it are still written by the same call.
    pub fn send_exec(&mut self, port: &mut impl SerialPort) -> Result<()> {
        let now = Instant::now();
        let result = self.poll_timers(now);

        while port.write_available() {
            if self.flags.cancel_pending {
                self.flags.cancel_pending = false;
                self.encoder.abort();
                self.send_state = SendState::Idle;
                port.write_byte(CANCEL_BYTE);
                self.counters.tx_cancel += 1;
                self.counters.tx_bytes += 1;
                continue;
            }
            if self.flags.xoff {
                break;
            }
            if self.send_state == SendState::Idle && !self.start_next_frame(now) {
                break;
            }
            match self.encoder.next_byte() {
                Some(byte) => {
                    port.write_byte(byte);
                    self.counters.tx_bytes += 1;
                }
                None => self.send_state = SendState::Idle,
            }
        }
        if self.encoder.is_done() {
            self.send_state = SendState::Idle;
        }
        result
    }

    fn poll_timers(&mut self, now: Instant) -> Result<()> {
        if self.nr_timer.poll_expired(now) {
            debug!("Not-ready hold expired");
        }
        if self.reboot_timer.poll_expired(now) {
            trace!("Reboot delay elapsed");
        }
        if self.rst_timer.poll_expired(now) && self.state == ConnectionState::AwaitingRstAck {
            warn!("No RSTACK within {:?}", self.config.time_rst());
            self.disconnect();
            return Err(Error::ResetTimeout);
        }
        if self.ack_timer.poll_expired(now) && self.is_connected() {
            self.timeouts += 1;
            self.counters.ack_timeouts += 1;
            if self.timeouts > u16::from(self.config.max_timeouts) {
                warn!(
                    timeouts = self.timeouts,
                    "Too many consecutive ACK timeouts, link dropped"
                );
                self.fail(ResetReason::MaxAckTimeout);
                return Err(Error::MaxAckTimeouts(self.config.max_timeouts));
            }
            debug!(
                timeouts = self.timeouts,
                period = ?self.ack_timer.period(),
                "ACK timeout, retransmitting from {}",
                self.ack_rx
            );
            self.start_retransmission();
        }
        Ok(())
    }

    /// Pick the highest priority frame that may be sent now and load it into
    /// the encoder.
    fn start_next_frame(&mut self, now: Instant) -> bool {
        let (frame, state) = if self.flags.error_pending {
            self.flags.error_pending = false;
            let frame = Frame::error(ASH_VERSION_2, self.local_reason.into());
            (frame, SendState::SendingShortFrame)
        } else if self.flags.rst_ack_pending && !self.reboot_timer.is_running() {
            self.flags.rst_ack_pending = false;
            self.enter_connected();
            let frame = Frame::rst_ack(ASH_VERSION_2, self.local_reason.into());
            (frame, SendState::SendingShortFrame)
        } else if self.flags.rst_pending {
            self.flags.rst_pending = false;
            self.rst_timer.start(now, self.config.time_rst());
            (Frame::Rst, SendState::SendingShortFrame)
        } else if !self.is_connected() {
            return false;
        } else if self.flags.nak_pending || self.flags.ack_pending {
            let n_rdy = self.queues.is_rx_full();
            let frame = if self.flags.nak_pending {
                self.counters.tx_nak += 1;
                Frame::nak(n_rdy, self.frm_rx)
            } else {
                self.counters.tx_ack += 1;
                Frame::ack(n_rdy, self.frm_rx)
            };
            self.flags.nak_pending = false;
            self.flags.ack_pending = false;
            self.flags.not_ready_sent = n_rdy;
            self.ack_tx = self.frm_rx;
            (frame, SendState::SendingShortFrame)
        } else if let Some(body) = self.next_retransmission() {
            let frame = Frame::data(self.frm_retx, true, self.frm_rx, body);
            self.frm_retx += 1;
            if self.frm_retx == self.frm_tx {
                self.flags.retransmitting = false;
            }
            self.piggyback_ack();
            self.ack_timer.start_if_idle(now);
            self.counters.tx_re_data += 1;
            (frame, SendState::RetransmittingDataFrame)
        } else if self.outstanding() < self.config.tx_k as usize {
            let allow_normal = !self.nr_timer.is_running();
            let Some(body) = self.queues.start_transmit(self.frm_tx, allow_normal) else {
                return false;
            };
            let frame = Frame::data(self.frm_tx, false, self.frm_rx, body);
            self.frm_tx += 1;
            self.piggyback_ack();
            self.ack_timer.start_if_idle(now);
            self.counters.tx_data += 1;
            (frame, SendState::SendingDataFrame)
        } else {
            return false;
        };

        trace!(%frame, "Sending frame");
        self.encoder = FrameEncoder::new(&frame, self.config.randomize);
        self.send_state = state;
        true
    }

    fn next_retransmission(&mut self) -> Option<Bytes> {
        if !self.flags.retransmitting {
            return None;
        }
        let body = self.queues.retransmit_payload(self.frm_retx);
        if body.is_none() {
            self.flags.retransmitting = false;
        }
        body
    }

    /// Every DATA frame acknowledges everything received so far.
    fn piggyback_ack(&mut self) {
        self.ack_tx = self.frm_rx;
        self.flags.ack_pending = false;
    }

    /// Resend every outstanding frame, oldest first.
    pub(super) fn start_retransmission(&mut self) {
        if self.ack_rx != self.frm_tx {
            self.frm_retx = self.ack_rx;
            self.flags.retransmitting = true;
        }
    }
}
