use bytes::{Bytes, BytesMut};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{ConnectionState, Engine};
use crate::ash::{
    codec::Decoded,
    error::{Error, Result},
    frame::Frame,
    port::SerialPort,
    randomizer::Randomizer,
    FrameNumber,
};

impl Engine {
    /// Read bytes until one frame has been processed or the port runs dry.
    ///
    /// Returns `Ok(true)` if a frame was handled.
    pub fn poll_receive(&mut self, port: &mut impl SerialPort) -> Result<bool> {
        while let Some(byte) = port.read_byte() {
            self.counters.rx_bytes += 1;
            match self.decoder.decode_byte(byte) {
                Ok(None) => {}
                Ok(Some(Decoded::Xon)) => {
                    if self.config.xon_xoff {
                        self.flags.xoff = false;
                    }
                }
                Ok(Some(Decoded::Xoff)) => {
                    if self.config.xon_xoff {
                        trace!("XOFF received");
                        self.flags.xoff = true;
                    }
                }
                Ok(Some(Decoded::Frame(raw))) => {
                    let now = Instant::now();
                    return self.receive_frame(raw, now).map(|_| true);
                }
                Err(err) => {
                    debug!(%err, "Discarding received frame");
                    self.counters.record_rx_error(&err);
                    if err != Error::Cancelled {
                        self.reject();
                    }
                    return Err(err);
                }
            }
        }
        Ok(false)
    }

    fn receive_frame(&mut self, raw: Bytes, now: Instant) -> Result<()> {
        let frame = match Frame::parse(&raw) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%err, "Discarding malformed frame");
                self.counters.record_rx_error(&err);
                self.reject();
                return Err(err);
            }
        };
        trace!(%frame, "Received frame");

        match frame {
            Frame::Rst => self.receive_rst(now),
            Frame::RstAck { version, code } => self.receive_rst_ack(version, code),
            Frame::Error { version, code } => self.receive_error(version, code),
            frame => match self.state {
                ConnectionState::Connected => self.receive_connected(frame, now),
                ConnectionState::Disconnected => {
                    debug!(%frame, "Not connected, answering with ERROR");
                    self.flags.error_pending = true;
                    Ok(())
                }
                ConnectionState::AwaitingRstAck => {
                    trace!(%frame, "Discarding frame received during reset");
                    Ok(())
                }
            },
        }
    }

    fn receive_connected(&mut self, frame: Frame, now: Instant) -> Result<()> {
        match &frame {
            Frame::Data { re_tx, .. } => {
                self.counters.rx_data += 1;
                if *re_tx {
                    self.counters.rx_re_data += 1;
                }
            }
            Frame::Ack { .. } => self.counters.rx_ack += 1,
            Frame::Nak { .. } => self.counters.rx_nak += 1,
            _ => {}
        }
        if let Some(ack_num) = frame.ack_number() {
            self.process_ack_number(ack_num, now)?;
        }

        match frame {
            Frame::Data {
                frm_num,
                re_tx,
                body,
                ..
            } => self.receive_data(frm_num, re_tx, body),
            Frame::Ack { n_rdy, .. } => {
                self.update_not_ready(n_rdy, now);
                Ok(())
            }
            Frame::Nak { n_rdy, .. } => {
                self.update_not_ready(n_rdy, now);
                debug!("NAK received, retransmitting from {}", self.ack_rx);
                self.start_retransmission();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Release every frame the peer acknowledged.
    fn process_ack_number(&mut self, ack_num: FrameNumber, now: Instant) -> Result<()> {
        if !ack_num.within(self.ack_rx, self.frm_tx) {
            let err = Error::BadAckNumber(ack_num);
            debug!(%err, ack_rx = %self.ack_rx, frm_tx = %self.frm_tx);
            self.counters.record_rx_error(&err);
            self.reject();
            return Err(err);
        }
        if ack_num == self.ack_rx {
            return Ok(());
        }

        if !self.flags.retransmitting {
            if let Some(rtt) = self.ack_timer.elapsed(now) {
                self.ack_timer.adapt(rtt);
            }
        }
        while self.ack_rx != ack_num {
            self.queues.release_acked(self.ack_rx);
            self.ack_rx += 1;
        }
        self.timeouts = 0;

        if self.ack_rx == self.frm_tx {
            self.ack_timer.stop();
        } else {
            self.ack_timer.restart(now);
        }
        if self.flags.retransmitting {
            if !self.frm_retx.within(self.ack_rx, self.frm_tx) {
                self.frm_retx = self.ack_rx;
            }
            if self.frm_retx == self.frm_tx {
                self.flags.retransmitting = false;
            }
        }
        trace!(ack_rx = %self.ack_rx, outstanding = self.outstanding(), "Frames acknowledged");
        Ok(())
    }

    fn receive_data(&mut self, frm_num: FrameNumber, re_tx: bool, body: Bytes) -> Result<()> {
        if frm_num == self.frm_rx {
            let payload = if self.config.randomize {
                let mut buf = BytesMut::from(&body[..]);
                Randomizer::apply(&mut buf);
                buf.freeze()
            } else {
                body
            };
            if self.queues.put_received(payload).is_err() {
                let err = Error::NoRxSpace(frm_num);
                debug!(%err, "Receive slot occupied, dropping frame");
                self.counters.record_rx_error(&err);
                self.flags.rx_dropped = true;
                return Err(err);
            }
            self.frm_rx += 1;
            self.flags.reject = false;
            self.flags.ack_pending = true;
            trace!(%frm_num, "Accepted DATA frame");
            Ok(())
        } else if re_tx {
            trace!(%frm_num, expected = %self.frm_rx, "Duplicate DATA frame");
            self.counters.rx_duplicates += 1;
            self.flags.ack_pending = true;
            Ok(())
        } else {
            let err = Error::OutOfSequence(frm_num);
            debug!(%err, expected = %self.frm_rx);
            self.counters.record_rx_error(&err);
            self.reject();
            Err(err)
        }
    }

    fn update_not_ready(&mut self, n_rdy: bool, now: Instant) {
        if n_rdy {
            self.nr_timer.start(now, self.config.nr_time());
        } else {
            self.nr_timer.stop();
        }
    }

    /// Ask for retransmission with a single NAK until an in-sequence frame
    /// arrives.
    fn reject(&mut self) {
        if self.is_connected() && !self.flags.reject {
            self.flags.reject = true;
            self.flags.nak_pending = true;
        }
    }
}
