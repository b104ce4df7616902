use bytes::{Buf, BufMut, BytesMut};
#[cfg(test)]
use mockall::automock;

/// Non-blocking byte access to the serial link.
#[cfg_attr(test, automock)]
pub trait SerialPort {
    /// Next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;
    fn write_byte(&mut self, byte: u8);
    /// True if `write_byte` can accept another byte now.
    fn write_available(&self) -> bool;
}

/// A [`SerialPort`] backed by two byte buffers, filled and drained by whatever
/// owns the real stream.
#[derive(Debug)]
pub struct BufferedPort {
    rx: BytesMut,
    tx: BytesMut,
    tx_limit: usize,
}

impl BufferedPort {
    pub fn new(tx_limit: usize) -> BufferedPort {
        BufferedPort {
            rx: BytesMut::with_capacity(1024),
            tx: BytesMut::with_capacity(tx_limit),
            tx_limit,
        }
    }

    /// Buffer bytes are read from the link into.
    pub fn rx_mut(&mut self) -> &mut BytesMut {
        &mut self.rx
    }

    /// Bytes waiting to be written to the link.
    pub fn tx_mut(&mut self) -> &mut BytesMut {
        &mut self.tx
    }

    pub fn has_output(&self) -> bool {
        !self.tx.is_empty()
    }
}

impl SerialPort for BufferedPort {
    fn read_byte(&mut self) -> Option<u8> {
        if self.rx.has_remaining() {
            Some(self.rx.get_u8())
        } else {
            None
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.tx.put_u8(byte);
    }

    fn write_available(&self) -> bool {
        self.tx.len() < self.tx_limit
    }
}
