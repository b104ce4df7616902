mod checksum;
mod codec;
mod config;
mod constants;
mod counters;
mod engine;
mod error;
mod escaping;
mod frame;
mod pool;
mod port;
mod queues;
mod randomizer;
mod timer;
mod types;

pub use config::{AshConfig, ConfigError};
pub use constants::MAX_DATA_FIELD_LEN;
pub use counters::Counters;
pub use engine::{ConnectionState, Engine, Role, SendState};
pub use error::{Error, ErrorKind, Result};
pub use port::{BufferedPort, SerialPort};
pub use types::{FrameNumber, ResetReason};

#[cfg(test)]
pub(crate) use constants::FLAG_BYTE;
