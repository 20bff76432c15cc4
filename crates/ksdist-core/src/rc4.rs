//! RC4 keystream generator.
//!
//! RC4 is used here as a statistical test subject because its early
//! keystream bytes are measurably biased. It is not a security primitive.

use crate::error::{Error, Result};
use crate::generator::KeystreamGenerator;

const N: usize = 256;

/// RFC 6229 test key (128 bits).
const REFERENCE_KEY: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
];

/// RFC 6229 keystream for [`REFERENCE_KEY`]. The RFC publishes
/// non-contiguous 32-byte windows; each entry is (offset, window).
const REFERENCE_WINDOWS: [(usize, [u8; 32]); 9] = [
    (0, [
        0x9a, 0xc7, 0xcc, 0x9a, 0x60, 0x9d, 0x1e, 0xf7, 0xb2, 0x93, 0x28, 0x99, 0xcd, 0xe4, 0x1b, 0x97,
        0x52, 0x48, 0xc4, 0x95, 0x90, 0x14, 0x12, 0x6a, 0x6e, 0x8a, 0x84, 0xf1, 0x1d, 0x1a, 0x9e, 0x1c,
    ]),
    (240, [
        0x06, 0x59, 0x02, 0xe4, 0xb6, 0x20, 0xf6, 0xcc, 0x36, 0xc8, 0x58, 0x9f, 0x66, 0x43, 0x2f, 0x2b,
        0xd3, 0x9d, 0x56, 0x6b, 0xc6, 0xbc, 0xe3, 0x01, 0x07, 0x68, 0x15, 0x15, 0x49, 0xf3, 0x87, 0x3f,
    ]),
    (496, [
        0xb6, 0xd1, 0xe6, 0xc4, 0xa5, 0xe4, 0x77, 0x1c, 0xad, 0x79, 0x53, 0x8d, 0xf2, 0x95, 0xfb, 0x11,
        0xc6, 0x8c, 0x1d, 0x5c, 0x55, 0x9a, 0x97, 0x41, 0x23, 0xdf, 0x1d, 0xbc, 0x52, 0xa4, 0x3b, 0x89,
    ]),
    (752, [
        0xc5, 0xec, 0xf8, 0x8d, 0xe8, 0x97, 0xfd, 0x57, 0xfe, 0xd3, 0x01, 0x70, 0x1b, 0x82, 0xa2, 0x59,
        0xec, 0xcb, 0xe1, 0x3d, 0xe1, 0xfc, 0xc9, 0x1c, 0x11, 0xa0, 0xb2, 0x6c, 0x0b, 0xc8, 0xfa, 0x4d,
    ]),
    (1008, [
        0xe7, 0xa7, 0x25, 0x74, 0xf8, 0x78, 0x2a, 0xe2, 0x6a, 0xab, 0xcf, 0x9e, 0xbc, 0xd6, 0x60, 0x65,
        0xbd, 0xf0, 0x32, 0x4e, 0x60, 0x83, 0xdc, 0xc6, 0xd3, 0xce, 0xdd, 0x3c, 0xa8, 0xc5, 0x3c, 0x16,
    ]),
    (1520, [
        0xb4, 0x01, 0x10, 0xc4, 0x19, 0x0b, 0x56, 0x22, 0xa9, 0x61, 0x16, 0xb0, 0x01, 0x7e, 0xd2, 0x97,
        0xff, 0xa0, 0xb5, 0x14, 0x64, 0x7e, 0xc0, 0x4f, 0x63, 0x06, 0xb8, 0x92, 0xae, 0x66, 0x11, 0x81,
    ]),
    (2032, [
        0xd0, 0x3d, 0x1b, 0xc0, 0x3c, 0xd3, 0x3d, 0x70, 0xdf, 0xf9, 0xfa, 0x5d, 0x71, 0x96, 0x3e, 0xbd,
        0x8a, 0x44, 0x12, 0x64, 0x11, 0xea, 0xa7, 0x8b, 0xd5, 0x1e, 0x8d, 0x87, 0xa8, 0x87, 0x9b, 0xf5,
    ]),
    (3056, [
        0xfa, 0xbe, 0xb7, 0x60, 0x28, 0xad, 0xe2, 0xd0, 0xe4, 0x87, 0x22, 0xe4, 0x6c, 0x46, 0x15, 0xa3,
        0xc0, 0x5d, 0x88, 0xab, 0xd5, 0x03, 0x57, 0xf9, 0x35, 0xa6, 0x3c, 0x59, 0xee, 0x53, 0x76, 0x23,
    ]),
    (4080, [
        0xff, 0x38, 0x26, 0x5c, 0x16, 0x42, 0xc1, 0xab, 0xe8, 0xd3, 0xc2, 0xfe, 0x5e, 0x57, 0x2b, 0xf8,
        0xa3, 0x6a, 0x4c, 0x30, 0x1a, 0xe8, 0xac, 0x13, 0x61, 0x0c, 0xcb, 0xc1, 0x22, 0x56, 0xca, 0xcc,
    ]),
];

/// RC4 state: a permutation of `0..256` and two cursors.
#[derive(Clone)]
pub struct Rc4 {
    s: [u8; N],
    i: u8,
    j: u8,
}

impl Rc4 {
    #[inline(always)]
    fn step(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        self.s[self.i as usize].wrapping_add(self.s[self.j as usize])
    }

    /// Current permutation, for invariant checks.
    pub fn permutation(&self) -> &[u8; N] {
        &self.s
    }
}

impl KeystreamGenerator for Rc4 {
    const NAME: &'static str = "rc4";
    const KEY_LEN: usize = 16;

    /// # Panics
    ///
    /// Panics if `key` is empty.
    fn from_key(key: &[u8]) -> Self {
        assert!(!key.is_empty(), "rc4 key cannot be empty");

        let mut s = [0u8; N];
        for (slot, v) in s.iter_mut().zip(0u8..=255) {
            *slot = v;
        }

        let mut j = 0u8;
        for (i, &k) in (0..N).zip(key.iter().cycle()) {
            j = j.wrapping_add(s[i]).wrapping_add(k);
            s.swap(i, j as usize);
        }

        Self { s, i: 0, j: 0 }
    }

    #[inline]
    fn fill(&mut self, out: &mut [u8]) {
        for b in out.iter_mut() {
            let t = self.step();
            *b = self.s[t as usize];
        }
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    fn self_test() -> Result<()> {
        let mut rc4 = Self::from_key(&REFERENCE_KEY);
        let mut position = 0usize;
        let mut window = [0u8; 32];

        for (offset, expected) in &REFERENCE_WINDOWS {
            rc4.advance(offset - position);
            rc4.fill(&mut window);
            position = offset + window.len();

            if let Some(k) = (0..window.len()).find(|&k| window[k] != expected[k]) {
                return Err(Error::SelfTest {
                    generator: Self::NAME,
                    offset: offset + k,
                    expected: expected[k],
                    actual: window[k],
                });
            }
        }

        log::debug!("{} self-test passed ({} windows)", Self::NAME, REFERENCE_WINDOWS.len());
        Ok(())
    }
}
