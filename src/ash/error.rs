use thiserror::Error;

use super::FrameNumber;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame is shorter than the minimum frame length")]
    TooShort,
    #[error("frame is longer than the maximum frame length")]
    TooLong,
    #[error("frame checksum is invalid")]
    BadCrc,
    #[error("serial communication error while receiving a frame")]
    CommError,
    #[error("frame was cancelled by the sender")]
    Cancelled,
    #[error("unknown control byte {0:#04x}")]
    BadControl(u8),
    #[error("invalid data field length {len} for control byte {control:#04x}")]
    BadLength { control: u8, len: usize },
    #[error("acknowledgement number {0} is outside the transmit window")]
    BadAckNumber(FrameNumber),
    #[error("DATA frame {0} is out of sequence")]
    OutOfSequence(FrameNumber),
    #[error("no receive space for DATA frame {0}")]
    NoRxSpace(FrameNumber),
    #[error("no transmit buffer available")]
    NoTxSpace,
    #[error("payload of {0} bytes does not fit a DATA frame")]
    InvalidPayload(usize),
    #[error("link is not connected")]
    NotConnected,
    #[error("exceeded {0} consecutive ACK timeouts")]
    MaxAckTimeouts(u8),
    #[error("no RSTACK received within the reset timeout")]
    ResetTimeout,
    #[error("peer reported error code {code:#04x} (version {version})")]
    PeerError { version: u8, code: u8 },
    #[error("peer reset the link")]
    PeerReset,
    #[error("unsupported ASH version {0}")]
    UnsupportedVersion(u8),
}

/// Coarse classification of an [`Error`], used by callers to decide whether
/// the link must be renegotiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Framing,
    Sequence,
    ResourceExhaustion,
    ConnectionFatal,
    ProtocolViolation,
    Usage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooShort
            | Error::TooLong
            | Error::BadCrc
            | Error::CommError
            | Error::Cancelled
            | Error::BadControl(_)
            | Error::BadLength { .. } => ErrorKind::Framing,
            Error::BadAckNumber(_) | Error::OutOfSequence(_) => ErrorKind::Sequence,
            Error::NoRxSpace(_) | Error::NoTxSpace => ErrorKind::ResourceExhaustion,
            Error::MaxAckTimeouts(_)
            | Error::ResetTimeout
            | Error::PeerError { .. }
            | Error::UnsupportedVersion(_) => ErrorKind::ConnectionFatal,
            Error::PeerReset => ErrorKind::ProtocolViolation,
            Error::NotConnected | Error::InvalidPayload(_) => ErrorKind::Usage,
        }
    }

    /// True if the engine dropped to Disconnected and needs a new handshake.
    pub fn needs_reset(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConnectionFatal | ErrorKind::ProtocolViolation
        )
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
