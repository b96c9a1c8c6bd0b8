//! Big-endian packing of the fixed-width integers used on the APNs wire.
//!
//! APNs's legacy binary protocol carries everything in network byte order:
//! token/payload lengths, notification identifiers, expiry timestamps, and
//! the frame length prefix. This module is the single place that does the
//! byte<->integer conversion, mirroring the read/write buffer split the
//! teacher crate uses for its own wire format.

use crate::error::{Error, Result};

/// Append a big-endian `u8` to `buf`.
pub fn pack_u8(buf: &mut Vec<u8>, val: u8) {
    buf.push(val);
}

/// Append a big-endian `u16` to `buf`.
pub fn pack_u16_be(buf: &mut Vec<u8>, val: u16) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Append a big-endian `u32` to `buf`.
pub fn pack_u32_be(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Overwrite 4 bytes at `pos` with a big-endian `u32`, used to back-patch
/// length prefixes after the body they describe has been written.
pub fn set_u32_be(buf: &mut [u8], pos: usize, val: u32) {
    buf[pos..pos + 4].copy_from_slice(&val.to_be_bytes());
}

/// A cursor over a byte slice for reading the fixed-width wire primitives.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.require(2)?;
        let val = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.require(4)?;
        let val = u32::from_be_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(val)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// Decode a 64-character hex device token into its 32 raw bytes.
pub fn decode_token_hex(token_hex: &str) -> Result<[u8; 32]> {
    if token_hex.len() != 64 {
        return Err(Error::InvalidToken {
            len: token_hex.len(),
        });
    }
    let mut out = [0u8; 32];
    for (i, chunk) in out.iter_mut().enumerate() {
        let byte_str = token_hex
            .get(i * 2..i * 2 + 2)
            .ok_or(Error::InvalidToken { len: token_hex.len() })?;
        *chunk = u8::from_str_radix(byte_str, 16).map_err(|_| Error::InvalidToken {
            len: token_hex.len(),
        })?;
    }
    Ok(out)
}

/// Encode 32 raw token bytes back into lowercase hex, for display/round-trips.
pub fn encode_token_hex(token: &[u8; 32]) -> String {
    token.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_u8_round_trips() {
        for n in 0..=u8::MAX {
            let mut buf = Vec::new();
            pack_u8(&mut buf, n);
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_u8().unwrap(), n);
        }
    }

    #[test]
    fn pack_unpack_u16_round_trips() {
        for n in [0u16, 1, 255, 256, 65535] {
            let mut buf = Vec::new();
            pack_u16_be(&mut buf, n);
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_u16_be().unwrap(), n);
        }
    }

    #[test]
    fn pack_unpack_u32_round_trips() {
        for n in [0u32, 1, 65535, 65536, u32::MAX] {
            let mut buf = Vec::new();
            pack_u32_be(&mut buf, n);
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_u32_be().unwrap(), n);
        }
    }

    #[test]
    fn set_u32_be_back_patches_in_place() {
        let mut buf = vec![0u8; 8];
        pack_u32_be(&mut buf, 0xDEADBEEF);
        set_u32_be(&mut buf, 0, 0x01020304);
        assert_eq!(&buf[0..4], &0x01020304u32.to_be_bytes());
    }

    #[test]
    fn read_past_end_is_buffer_too_small() {
        let buf = [0u8; 1];
        let mut r = Reader::new(&buf);
        assert!(r.read_u32_be().is_err());
    }

    #[test]
    fn token_hex_round_trips() {
        let hex = "99036da8fa94117c2ac999fdb3fa7275f42cc5fa851e2cccc1ad03937c7ed8d1";
        let bytes = decode_token_hex(hex).unwrap();
        assert_eq!(encode_token_hex(&bytes), hex);
    }

    #[test]
    fn token_hex_wrong_length_is_rejected() {
        assert!(decode_token_hex("abcd").is_err());
    }

    #[test]
    fn token_hex_non_hex_is_rejected() {
        let bad = "zz".repeat(32);
        assert!(decode_token_hex(&bad).is_err());
    }
}
