mod parsers;

use std::fmt::Display;

use bytes::{BufMut, Bytes, BytesMut};
use nom::{combinator::all_consuming, error::Error as NomError, Finish};

use super::{
    constants::{
        ERROR_CONTROL, MAX_DATA_FIELD_LEN, MIN_DATA_FIELD_LEN, RST_ACK_CONTROL, RST_CONTROL,
    },
    error::{Error, Result},
    FrameNumber,
};

/// Frame class determined from the control byte alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Ack,
    Nak,
    Rst,
    RstAck,
    Error,
    Invalid,
}

impl FrameKind {
    pub fn classify(control: u8) -> FrameKind {
        match control {
            0x00..=0x7F => FrameKind::Data,
            0x80..=0x9F => FrameKind::Ack,
            0xA0..=0xBF => FrameKind::Nak,
            RST_CONTROL => FrameKind::Rst,
            RST_ACK_CONTROL => FrameKind::RstAck,
            ERROR_CONTROL => FrameKind::Error,
            _ => FrameKind::Invalid,
        }
    }

    /// True if a data field of `len` bytes is legal for this class.
    fn accepts_len(self, len: usize) -> bool {
        match self {
            FrameKind::Data => (MIN_DATA_FIELD_LEN..=MAX_DATA_FIELD_LEN).contains(&len),
            FrameKind::Ack | FrameKind::Nak | FrameKind::Rst => len == 0,
            FrameKind::RstAck | FrameKind::Error => len == 2,
            FrameKind::Invalid => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Data {
        frm_num: FrameNumber,
        re_tx: bool,
        ack_num: FrameNumber,
        body: Bytes,
    },
    Ack {
        res: bool,
        n_rdy: bool,
        ack_num: FrameNumber,
    },
    Nak {
        res: bool,
        n_rdy: bool,
        ack_num: FrameNumber,
    },
    Rst,
    RstAck {
        version: u8,
        code: u8,
    },
    Error {
        version: u8,
        code: u8,
    },
}

impl Frame {
    pub fn data(frm_num: FrameNumber, re_tx: bool, ack_num: FrameNumber, body: Bytes) -> Frame {
        Frame::Data {
            frm_num,
            re_tx,
            ack_num,
            body,
        }
    }

    pub fn ack(n_rdy: bool, ack_num: FrameNumber) -> Frame {
        Frame::Ack {
            res: false,
            n_rdy,
            ack_num,
        }
    }

    pub fn nak(n_rdy: bool, ack_num: FrameNumber) -> Frame {
        Frame::Nak {
            res: false,
            n_rdy,
            ack_num,
        }
    }

    pub fn rst_ack(version: u8, code: u8) -> Frame {
        Frame::RstAck { version, code }
    }

    pub fn error(version: u8, code: u8) -> Frame {
        Frame::Error { version, code }
    }

    /// Classify and parse an unstuffed frame whose checksum has already been
    /// validated and stripped.
    pub fn parse(raw: &Bytes) -> Result<Frame> {
        let (&control, data) = raw.split_first().ok_or(Error::TooShort)?;
        let kind = FrameKind::classify(control);
        if kind == FrameKind::Invalid {
            return Err(Error::BadControl(control));
        }
        if !kind.accepts_len(data.len()) {
            return Err(Error::BadLength {
                control,
                len: data.len(),
            });
        }

        all_consuming(parsers::frame(raw))(&raw[..])
            .finish()
            .map(|(_, frame)| frame)
            .map_err(|_: NomError<&[u8]>| Error::BadControl(control))
    }

    pub fn control_byte(&self) -> u8 {
        match self {
            Frame::Data {
                frm_num,
                re_tx,
                ack_num,
                ..
            } => (**frm_num << 4) | ((*re_tx as u8) << 3) | **ack_num,
            Frame::Ack {
                res,
                n_rdy,
                ack_num,
            } => 0x80 | ((*res as u8) << 4) | ((*n_rdy as u8) << 3) | **ack_num,
            Frame::Nak {
                res,
                n_rdy,
                ack_num,
            } => 0xA0 | ((*res as u8) << 4) | ((*n_rdy as u8) << 3) | **ack_num,
            Frame::Rst => RST_CONTROL,
            Frame::RstAck { .. } => RST_ACK_CONTROL,
            Frame::Error { .. } => ERROR_CONTROL,
        }
    }

    pub fn data_len(&self) -> usize {
        match self {
            Frame::Data { body, .. } => body.len(),
            Frame::RstAck { .. } | Frame::Error { .. } => 2,
            _ => 0,
        }
    }

    /// Write the data field, as it appears before randomization, into `buf`.
    pub fn put_data(&self, buf: &mut BytesMut) {
        match self {
            Frame::Data { body, .. } => buf.put_slice(body),
            Frame::RstAck { version, code } | Frame::Error { version, code } => {
                buf.put_u8(*version);
                buf.put_u8(*code);
            }
            _ => {}
        }
    }

    /// ACK number carried by DATA, ACK and NAK frames.
    pub fn ack_number(&self) -> Option<FrameNumber> {
        match self {
            Frame::Data { ack_num, .. } | Frame::Ack { ack_num, .. } | Frame::Nak { ack_num, .. } => {
                Some(*ack_num)
            }
            _ => None,
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frame::Data {
                frm_num,
                re_tx,
                ack_num,
                body,
            } => write!(
                f,
                "DATA(frm_num={}, ack_num={}, re_tx={}, len={})",
                frm_num,
                ack_num,
                re_tx,
                body.len()
            ),
            Frame::Ack { n_rdy, ack_num, .. } => {
                write!(f, "ACK(ack_num={}, n_rdy={})", ack_num, n_rdy)
            }
            Frame::Nak { n_rdy, ack_num, .. } => {
                write!(f, "NAK(ack_num={}, n_rdy={})", ack_num, n_rdy)
            }
            Frame::Rst => write!(f, "RST"),
            Frame::RstAck { version, code } => {
                write!(f, "RSTACK(version={}, code={:#04x})", version, code)
            }
            Frame::Error { version, code } => {
                write!(f, "ERROR(version={}, code={:#04x})", version, code)
            }
        }
    }
}
