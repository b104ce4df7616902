use std::{
    fmt::Display,
    ops::{Add, AddAssign, Deref, Sub},
};

use super::constants::{
    ERROR_MAX_ACK_TIMEOUT, RESET_ASSERT, RESET_BOOTLOADER, RESET_EXTERNAL, RESET_POWERON,
    RESET_SOFTWARE, RESET_UNKNOWN, RESET_WATCHDOG,
};

fn three_bit_wrapped_add(lhs: u8, rhs: u8) -> u8 {
    lhs.wrapping_add(rhs) & 0x07
}

/// A modulo-8 frame or acknowledgement number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameNumber(u8);

impl FrameNumber {
    pub fn new(value: u8) -> Option<FrameNumber> {
        if value > 7 {
            None
        } else {
            Some(FrameNumber(value))
        }
    }

    pub fn new_truncate(value: u8) -> FrameNumber {
        FrameNumber(value & 0x07)
    }

    pub fn zero() -> FrameNumber {
        FrameNumber(0)
    }

    /// Number of increments needed to get from `from` to `self`.
    pub fn distance_from(self, from: FrameNumber) -> u8 {
        self.0.wrapping_sub(from.0) & 0x07
    }

    /// True if `self` lies in the inclusive wrap-around range `[low, high]`.
    pub fn within(self, low: FrameNumber, high: FrameNumber) -> bool {
        self.distance_from(low) <= high.distance_from(low)
    }
}

impl Deref for FrameNumber {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u8> for FrameNumber {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FrameNumber::new(value).ok_or("FrameNumber only accepts values between 0 and 7")
    }
}

impl From<FrameNumber> for u8 {
    fn from(val: FrameNumber) -> Self {
        val.0
    }
}

impl Add<u8> for FrameNumber {
    type Output = FrameNumber;

    fn add(self, rhs: u8) -> Self::Output {
        FrameNumber(three_bit_wrapped_add(self.0, rhs))
    }
}

impl AddAssign<u8> for FrameNumber {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = three_bit_wrapped_add(self.0, rhs);
    }
}

impl Sub for FrameNumber {
    type Output = u8;

    fn sub(self, rhs: FrameNumber) -> Self::Output {
        self.distance_from(rhs)
    }
}

impl Display for FrameNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Reason code carried by RSTACK and ERROR frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetReason {
    Unknown,
    External,
    PowerOn,
    Watchdog,
    Assert,
    Bootloader,
    Software,
    MaxAckTimeout,
    Other(u8),
}

impl From<u8> for ResetReason {
    fn from(value: u8) -> Self {
        match value {
            RESET_UNKNOWN => ResetReason::Unknown,
            RESET_EXTERNAL => ResetReason::External,
            RESET_POWERON => ResetReason::PowerOn,
            RESET_WATCHDOG => ResetReason::Watchdog,
            RESET_ASSERT => ResetReason::Assert,
            RESET_BOOTLOADER => ResetReason::Bootloader,
            RESET_SOFTWARE => ResetReason::Software,
            ERROR_MAX_ACK_TIMEOUT => ResetReason::MaxAckTimeout,
            other => ResetReason::Other(other),
        }
    }
}

impl From<ResetReason> for u8 {
    fn from(value: ResetReason) -> Self {
        match value {
            ResetReason::Unknown => RESET_UNKNOWN,
            ResetReason::External => RESET_EXTERNAL,
            ResetReason::PowerOn => RESET_POWERON,
            ResetReason::Watchdog => RESET_WATCHDOG,
            ResetReason::Assert => RESET_ASSERT,
            ResetReason::Bootloader => RESET_BOOTLOADER,
            ResetReason::Software => RESET_SOFTWARE,
            ResetReason::MaxAckTimeout => ERROR_MAX_ACK_TIMEOUT,
            ResetReason::Other(code) => code,
        }
    }
}
