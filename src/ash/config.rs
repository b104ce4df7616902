use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Upper bound for every millisecond tunable.
pub const MAX_TIME_MS: u16 = 8192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tx_k must be between 1 and 7, got {0}")]
    WindowSize(u8),
    #[error("{name} must be below 8192 ms, got {value} ms")]
    TimeOutOfRange { name: &'static str, value: u16 },
    #[error("ACK times must satisfy 0 < min <= init <= max")]
    AckTimeOrder,
    #[error("max_timeouts must be at least 1")]
    MaxTimeouts,
    #[error("time_rst must be greater than zero")]
    ResetTime,
    #[error("tx_buffers ({buffers}) must be at least tx_k ({tx_k})")]
    TxBuffers { buffers: usize, tx_k: u8 },
}

/// Tunable parameters of an ASH link. Times are in milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AshConfig {
    /// Maximum number of DATA frames in flight.
    pub tx_k: u8,
    /// XOR the DATA field with the pseudo-random sequence.
    pub randomize: bool,
    pub ack_time_init: u16,
    pub ack_time_min: u16,
    pub ack_time_max: u16,
    /// How long to wait for RSTACK after sending RST.
    pub time_rst: u16,
    /// Consecutive ACK timeouts tolerated before the link is declared down.
    pub max_timeouts: u8,
    /// Delay between receiving RST and answering with RSTACK.
    pub reboot_delay: u16,
    /// How long a not-ready indication from the peer holds back DATA frames.
    pub nr_time: u16,
    /// Transmit buffers shared by the queues and the retransmit window.
    pub tx_buffers: usize,
    /// Honour XON/XOFF received from the peer.
    pub xon_xoff: bool,
}

impl AshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=7).contains(&self.tx_k) {
            return Err(ConfigError::WindowSize(self.tx_k));
        }
        for (name, value) in [
            ("ack_time_init", self.ack_time_init),
            ("ack_time_min", self.ack_time_min),
            ("ack_time_max", self.ack_time_max),
            ("time_rst", self.time_rst),
            ("reboot_delay", self.reboot_delay),
            ("nr_time", self.nr_time),
        ] {
            if value >= MAX_TIME_MS {
                return Err(ConfigError::TimeOutOfRange { name, value });
            }
        }
        if self.ack_time_min == 0
            || self.ack_time_min > self.ack_time_init
            || self.ack_time_init > self.ack_time_max
        {
            return Err(ConfigError::AckTimeOrder);
        }
        if self.max_timeouts == 0 {
            return Err(ConfigError::MaxTimeouts);
        }
        if self.time_rst == 0 {
            return Err(ConfigError::ResetTime);
        }
        if self.tx_buffers < self.tx_k as usize {
            return Err(ConfigError::TxBuffers {
                buffers: self.tx_buffers,
                tx_k: self.tx_k,
            });
        }
        Ok(())
    }

    pub fn ack_time_init(&self) -> Duration {
        Duration::from_millis(self.ack_time_init.into())
    }

    pub fn ack_time_min(&self) -> Duration {
        Duration::from_millis(self.ack_time_min.into())
    }

    pub fn ack_time_max(&self) -> Duration {
        Duration::from_millis(self.ack_time_max.into())
    }

    pub fn time_rst(&self) -> Duration {
        Duration::from_millis(self.time_rst.into())
    }

    pub fn reboot_delay(&self) -> Duration {
        Duration::from_millis(self.reboot_delay.into())
    }

    pub fn nr_time(&self) -> Duration {
        Duration::from_millis(self.nr_time.into())
    }
}

impl Default for AshConfig {
    fn default() -> Self {
        AshConfig {
            tx_k: 3,
            randomize: true,
            ack_time_init: 800,
            ack_time_min: 400,
            ack_time_max: 2400,
            time_rst: 2500,
            max_timeouts: 6,
            reboot_delay: 0,
            nr_time: 480,
            tx_buffers: 16,
            xon_xoff: false,
        }
    }
}
