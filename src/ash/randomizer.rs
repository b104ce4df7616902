/// Pseudo-random sequence XORed over every DATA field.
#[derive(Debug, Clone)]
pub struct Randomizer {
    reg: u8,
}

impl Randomizer {
    pub fn new() -> Randomizer {
        Randomizer { reg: 0x42 }
    }

    pub fn next_mask(&mut self) -> u8 {
        let mask = self.reg;
        self.reg = (self.reg >> 1) ^ ((self.reg & 0x01) * 0xB8);
        mask
    }

    /// Randomize (or de-randomize, the operation is its own inverse) a buffer.
    pub fn apply(buf: &mut [u8]) {
        let mut randomizer = Randomizer::new();
        for item in buf {
            *item ^= randomizer.next_mask();
        }
    }
}

impl Default for Randomizer {
    fn default() -> Self {
        Randomizer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Randomizer;

    #[test]
    fn it_computes_the_correct_sequence() {
        let mut buf = [0u8; 5];
        Randomizer::apply(&mut buf);
        assert_eq!(buf, [0x42, 0x21, 0xA8, 0x54, 0x2A])
    }

    #[test]
    fn it_restores_randomized_data() {
        let mut buf = [0x00, 0x00, 0x00, 0x02];
        Randomizer::apply(&mut buf);
        assert_eq!(buf, [0x42, 0x21, 0xA8, 0x56]);
        Randomizer::apply(&mut buf);
        assert_eq!(buf, [0x00, 0x00, 0x00, 0x02]);
    }
}
