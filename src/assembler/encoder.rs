//! Byte-level encoding of resolved values.
//!
//! Words are 32 bits, little-endian. Values are reduced modulo 2^32 (words)
//! or 2^8 (bytes), so negative values come out in two's complement.
use super::source::Position;

pub fn encode_word(value: i64) -> [u8; 4] {
    (value as u32).to_le_bytes()
}

pub fn encode_byte(value: i64) -> u8 {
    value as u8
}

pub fn decode_word(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// The bytes emitted for one instruction or directive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Fragment {
    /// Value of `$` when the fragment was emitted.
    pub address: i64,
    pub position: Position,
    pub bytes: Vec<u8>,
}

impl Fragment {
    /// The fragment's bytes as whole words. A trailing partial word is
    /// zero-extended.
    pub fn words(&self) -> Vec<u32> {
        self.bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                decode_word(word)
            })
            .collect()
    }
}

/// Concatenates fragments in order into the final image. No padding is
/// inserted between them.
pub fn link(fragments: &[Fragment]) -> Vec<u8> {
    let mut image = Vec::with_capacity(fragments.iter().map(|f| f.bytes.len()).sum());
    for fragment in fragments {
        image.extend_from_slice(&fragment.bytes);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fragment(address: i64, bytes: Vec<u8>) -> Fragment {
        Fragment { address, position: Position::default(), bytes }
    }

    #[test]
    fn test_encode_word() {
        assert_eq!(encode_word(1), [1, 0, 0, 0]);
        assert_eq!(encode_word(0xFFAA_0033), [0x33, 0x00, 0xAA, 0xFF]);
        assert_eq!(encode_word(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encode_word(0x1_0000_0010), [0x10, 0, 0, 0]);
    }

    #[test]
    fn test_encode_byte() {
        assert_eq!(encode_byte(1), 1);
        assert_eq!(encode_byte(257), 1);
        assert_eq!(encode_byte(-1), 0xFF);
        assert_eq!(encode_byte(-256), 0);
    }

    #[test]
    fn test_link() {
        let fragments = vec![fragment(0, vec![1, 2]), fragment(2, vec![]), fragment(0x80, vec![3])];
        assert_eq!(link(&fragments), vec![1, 2, 3]);
        assert_eq!(link(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_words() {
        let f = fragment(0, vec![1, 0, 0, 0, 0x33, 0, 0xAA, 0xFF, 7]);
        assert_eq!(f.words(), vec![1, 0xFFAA_0033, 7]);
    }

    proptest! {
        #[test]
        fn word_round_trip(value in any::<u32>()) {
            prop_assert_eq!(decode_word(encode_word(value as i64)), value);
        }

        #[test]
        fn word_wraps_modulo_2_32(value in any::<i64>()) {
            prop_assert_eq!(decode_word(encode_word(value)) as i64, value.rem_euclid(1 << 32));
        }
    }
}
