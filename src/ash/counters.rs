use super::Error;

/// Link statistics, never reset by the engine except on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub tx_bytes: u64,
    pub tx_data: u64,
    pub tx_ack: u64,
    pub tx_nak: u64,
    pub tx_re_data: u64,
    pub tx_cancel: u64,
    pub rx_bytes: u64,
    pub rx_data: u64,
    pub rx_ack: u64,
    pub rx_nak: u64,
    pub rx_re_data: u64,
    pub rx_cancelled: u64,
    pub rx_crc_errors: u64,
    pub rx_comm_errors: u64,
    pub rx_too_short: u64,
    pub rx_too_long: u64,
    pub rx_bad_control: u64,
    pub rx_bad_length: u64,
    pub rx_bad_ack_number: u64,
    pub rx_out_of_sequence: u64,
    pub rx_duplicates: u64,
    pub rx_no_buffer: u64,
    pub ack_timeouts: u64,
}

impl Counters {
    pub(crate) fn record_rx_error(&mut self, error: &Error) {
        let counter = match error {
            Error::TooShort => &mut self.rx_too_short,
            Error::TooLong => &mut self.rx_too_long,
            Error::BadCrc => &mut self.rx_crc_errors,
            Error::CommError => &mut self.rx_comm_errors,
            Error::Cancelled => &mut self.rx_cancelled,
            Error::BadControl(_) => &mut self.rx_bad_control,
            Error::BadLength { .. } => &mut self.rx_bad_length,
            Error::BadAckNumber(_) => &mut self.rx_bad_ack_number,
            Error::OutOfSequence(_) => &mut self.rx_out_of_sequence,
            Error::NoRxSpace(_) => &mut self.rx_no_buffer,
            _ => return,
        };
        *counter += 1;
    }
}
