use crc::{Crc, Digest, CRC_16_XMODEM};

// CRC-CCITT: polynomial 0x1021, seeded with 0xFFFF.
static CRC_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

pub fn crc_digester() -> Digest<'static, u16> {
    CRC_CCITT.digest_with_initial(0xFFFF)
}

pub fn frame_checksum(frame: &[u8]) -> u16 {
    let mut digester = crc_digester();
    digester.update(frame);
    digester.finalize()
}

/// Validate a frame whose last two bytes are its big endian checksum.
pub fn verify_checksum(frame_with_crc: &[u8]) -> bool {
    match frame_with_crc.len().checked_sub(2) {
        Some(split) => {
            let (body, crc) = frame_with_crc.split_at(split);
            frame_checksum(body) == u16::from_be_bytes([crc[0], crc[1]])
        }
        None => false,
    }
}
