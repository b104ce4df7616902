use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::ash::{
    checksum::verify_checksum,
    constants::{
        CANCEL_BYTE, CRC_LEN, ESCAPE_BYTE, FLAG_BYTE, MAX_FRAME_WITH_CRC_LEN,
        MIN_FRAME_WITH_CRC_LEN, SUB_BYTE, WAKE_BYTE, XOFF_BYTE, XON_BYTE,
    },
    error::{Error, Result},
    escaping::unstuff,
};

#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Unstuffed control byte and data field, checksum already verified and
    /// stripped.
    Frame(Bytes),
    Xon,
    Xoff,
}

/// Byte-at-a-time frame assembler.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    len: usize,
    escape: bool,
    comm_error: bool,
}

impl FrameDecoder {
    pub fn new() -> FrameDecoder {
        FrameDecoder {
            buf: BytesMut::with_capacity(MAX_FRAME_WITH_CRC_LEN),
            len: 0,
            escape: false,
            comm_error: false,
        }
    }

    fn in_progress(&self) -> bool {
        self.len > 0 || self.escape || self.comm_error
    }

    fn clear(&mut self) {
        self.buf.clear();
        self.len = 0;
        self.escape = false;
        self.comm_error = false;
    }

    /// Feed one received byte. `Ok(None)` means the frame is still being
    /// assembled, or the byte was discarded.
    pub fn decode_byte(&mut self, byte: u8) -> Result<Option<Decoded>> {
        match byte {
            FLAG_BYTE => {
                let res = self.finish();
                self.clear();
                res
            }
            CANCEL_BYTE => {
                let cancelled = self.in_progress();
                self.clear();
                if cancelled {
                    trace!("Frame cancelled by sender");
                    Err(Error::Cancelled)
                } else {
                    Ok(None)
                }
            }
            SUB_BYTE => {
                trace!("Substitute byte received, discarding until next flag");
                self.comm_error = true;
                self.escape = false;
                Ok(None)
            }
            XON_BYTE => Ok(Some(Decoded::Xon)),
            XOFF_BYTE => Ok(Some(Decoded::Xoff)),
            ESCAPE_BYTE => {
                self.escape = true;
                Ok(None)
            }
            WAKE_BYTE if !self.in_progress() => Ok(None),
            byte => {
                let byte = if self.escape {
                    self.escape = false;
                    unstuff(byte)
                } else {
                    byte
                };
                if !self.comm_error {
                    self.len += 1;
                    if self.len <= MAX_FRAME_WITH_CRC_LEN {
                        self.buf.put_u8(byte);
                    }
                }
                Ok(None)
            }
        }
    }

    fn finish(&mut self) -> Result<Option<Decoded>> {
        if self.comm_error || self.escape {
            return Err(Error::CommError);
        }
        if self.len == 0 {
            return Ok(None);
        }
        if self.len < MIN_FRAME_WITH_CRC_LEN {
            return Err(Error::TooShort);
        }
        if self.len > MAX_FRAME_WITH_CRC_LEN {
            return Err(Error::TooLong);
        }
        if !verify_checksum(&self.buf) {
            return Err(Error::BadCrc);
        }
        let raw = self.buf.split_to(self.len - CRC_LEN).freeze();
        Ok(Some(Decoded::Frame(raw)))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        FrameDecoder::new()
    }
}
