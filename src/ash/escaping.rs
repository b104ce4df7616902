use super::constants::{ESCAPE_BYTE, ESCAPE_FLIP, RESERVED_BYTES};

pub fn is_reserved(byte: u8) -> bool {
    RESERVED_BYTES.contains(&byte)
}

/// Wire representation of a single frame byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stuffed {
    Plain(u8),
    Escaped(u8),
}

impl Stuffed {
    pub fn first(self) -> u8 {
        match self {
            Stuffed::Plain(byte) => byte,
            Stuffed::Escaped(_) => ESCAPE_BYTE,
        }
    }
}

pub fn stuff(byte: u8) -> Stuffed {
    if is_reserved(byte) {
        Stuffed::Escaped(byte ^ ESCAPE_FLIP)
    } else {
        Stuffed::Plain(byte)
    }
}

pub fn unstuff(byte: u8) -> u8 {
    byte ^ ESCAPE_FLIP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_escapes_reserved_bytes() {
        let frame = [0x00, 0x7E, 0x7D, 0x11, 0x13, 0x18, 0x1A];
        let res: Vec<u8> = frame
            .iter()
            .flat_map(|&b| match stuff(b) {
                Stuffed::Plain(b) => vec![b],
                escaped @ Stuffed::Escaped(b) => vec![escaped.first(), b],
            })
            .collect();

        assert_eq!(
            res,
            [0x00, 0x7D, 0x5E, 0x7D, 0x5D, 0x7D, 0x31, 0x7D, 0x33, 0x7D, 0x38, 0x7D, 0x3A]
        );
    }

    #[test]
    fn it_leaves_wake_byte_unescaped() {
        assert_eq!(stuff(0xFF), Stuffed::Plain(0xFF));
    }

    #[test]
    fn it_unescapes_reserved_bytes() {
        assert_eq!(unstuff(0x5E), 0x7E);
        assert_eq!(unstuff(0x31), 0x11);
    }
}
