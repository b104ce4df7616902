use bytes::{BufMut, Bytes, BytesMut};

use crate::ash::{
    checksum::frame_checksum,
    constants::{CRC_LEN, FLAG_BYTE},
    escaping::{stuff, Stuffed},
    frame::Frame,
    randomizer::Randomizer,
};

/// Produces the stuffed wire bytes of one frame, one byte per call, so output
/// can stop whenever the serial port has no room.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    raw: Bytes,
    pos: usize,
    escaped: Option<u8>,
    flag_sent: bool,
}

impl FrameEncoder {
    pub fn new(frame: &Frame, randomize: bool) -> FrameEncoder {
        let mut buf = BytesMut::with_capacity(1 + frame.data_len() + CRC_LEN);
        buf.put_u8(frame.control_byte());
        frame.put_data(&mut buf);
        if randomize && matches!(frame, Frame::Data { .. }) {
            Randomizer::apply(&mut buf[1..]);
        }
        let checksum = frame_checksum(&buf);
        buf.put_u16(checksum);

        FrameEncoder {
            raw: buf.freeze(),
            pos: 0,
            escaped: None,
            flag_sent: false,
        }
    }

    /// An encoder with nothing left to send.
    pub fn idle() -> FrameEncoder {
        FrameEncoder {
            flag_sent: true,
            ..Default::default()
        }
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.escaped.take() {
            return Some(byte);
        }
        match self.raw.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                let stuffed = stuff(byte);
                if let Stuffed::Escaped(second) = stuffed {
                    self.escaped = Some(second);
                }
                Some(stuffed.first())
            }
            None if !self.flag_sent => {
                self.flag_sent = true;
                Some(FLAG_BYTE)
            }
            None => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.flag_sent
    }

    /// True once at least one byte of the frame went out and the frame is not
    /// yet complete.
    pub fn is_mid_frame(&self) -> bool {
        !self.flag_sent && (self.pos > 0 || self.escaped.is_some())
    }

    /// Drop whatever remains of the frame.
    pub fn abort(&mut self) {
        *self = FrameEncoder::idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ash::FrameNumber;

    fn drain(encoder: &mut FrameEncoder) -> Vec<u8> {
        std::iter::from_fn(|| encoder.next_byte()).collect()
    }

    #[test]
    fn it_encodes_an_rst_frame() {
        let mut encoder = FrameEncoder::new(&Frame::Rst, true);

        assert_eq!(drain(&mut encoder), [0xC0, 0x38, 0xBC, 0x7E]);
        assert!(encoder.is_done());
    }

    #[test]
    fn it_encodes_an_rst_ack_frame() {
        let mut encoder = FrameEncoder::new(&Frame::rst_ack(0x02, 0x02), true);

        assert_eq!(drain(&mut encoder), [0xC1, 0x02, 0x02, 0x9B, 0x7B, 0x7E]);
    }

    #[test]
    fn it_encodes_ack_frames() {
        let mut encoder = FrameEncoder::new(&Frame::ack(false, FrameNumber::new_truncate(1)), true);

        assert_eq!(drain(&mut encoder), [0x81, 0x60, 0x59, 0x7E]);
    }

    #[test]
    fn it_stuffs_reserved_bytes_in_the_data_field() {
        let frame = Frame::data(
            FrameNumber::zero(),
            false,
            FrameNumber::zero(),
            Bytes::from_static(&[0x7E, 0x11, 0x01]),
        );
        let mut encoder = FrameEncoder::new(&frame, false);
        let wire = drain(&mut encoder);

        assert_eq!(&wire[..6], [0x00, 0x7D, 0x5E, 0x7D, 0x31, 0x01]);
        assert_eq!(wire.last(), Some(&0x7E));
    }

    #[test]
    fn it_tracks_a_frame_in_progress() {
        let mut encoder = FrameEncoder::new(&Frame::Rst, false);
        assert!(!encoder.is_mid_frame());

        encoder.next_byte();
        assert!(encoder.is_mid_frame());

        encoder.abort();
        assert!(!encoder.is_mid_frame());
        assert_eq!(encoder.next_byte(), None);
    }

    #[test]
    fn an_idle_encoder_has_nothing_to_send() {
        let mut encoder = FrameEncoder::idle();

        assert!(encoder.is_done());
        assert_eq!(encoder.next_byte(), None);
    }
}
