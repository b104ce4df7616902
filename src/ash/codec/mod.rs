mod decoder;
mod encoder;

pub use decoder::{Decoded, FrameDecoder};
pub use encoder::FrameEncoder;
