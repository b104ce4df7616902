pub const FLAG_BYTE: u8 = 0x7E;
pub const ESCAPE_BYTE: u8 = 0x7D;
pub const XON_BYTE: u8 = 0x11;
pub const XOFF_BYTE: u8 = 0x13;
pub const SUB_BYTE: u8 = 0x18;
pub const CANCEL_BYTE: u8 = 0x1A;
pub const WAKE_BYTE: u8 = 0xFF;

pub const RESERVED_BYTES: [u8; 6] = [FLAG_BYTE, ESCAPE_BYTE, XON_BYTE, XOFF_BYTE, SUB_BYTE, CANCEL_BYTE];

/// Stuffed bytes are sent as `ESCAPE_BYTE, byte ^ ESCAPE_FLIP`.
pub const ESCAPE_FLIP: u8 = 0x20;

pub const RST_CONTROL: u8 = 0xC0;
pub const RST_ACK_CONTROL: u8 = 0xC1;
pub const ERROR_CONTROL: u8 = 0xC2;

pub const MIN_DATA_FIELD_LEN: usize = 3;
pub const MAX_DATA_FIELD_LEN: usize = 128;
pub const CRC_LEN: usize = 2;
/// Control byte plus CRC.
pub const MIN_FRAME_WITH_CRC_LEN: usize = 1 + CRC_LEN;
pub const MAX_FRAME_WITH_CRC_LEN: usize = 1 + MAX_DATA_FIELD_LEN + CRC_LEN;

pub const RESET_UNKNOWN: u8 = 0x00;
pub const RESET_EXTERNAL: u8 = 0x01;
pub const RESET_POWERON: u8 = 0x02;
pub const RESET_WATCHDOG: u8 = 0x03;
pub const RESET_ASSERT: u8 = 0x06;
pub const RESET_BOOTLOADER: u8 = 0x09;
pub const RESET_SOFTWARE: u8 = 0x0B;
pub const ERROR_MAX_ACK_TIMEOUT: u8 = 0x51;

pub const ASH_VERSION_2: u8 = 0x02;
