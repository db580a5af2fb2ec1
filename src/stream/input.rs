//! Borrowed binary input

use std::collections::BTreeSet;

use tracing::trace;

use crate::errors::{MetadataError, MetadataResult};
use crate::version::WireVersion;

use super::{OPTIONAL_FALSE, OPTIONAL_NONE, OPTIONAL_TRUE};

/// Cursor over a borrowed byte slice bound to a negotiated peer version.
#[derive(Debug, Clone)]
pub struct StreamInput<'a> {
    data: &'a [u8],
    pos: usize,
    version: WireVersion,
}

impl<'a> StreamInput<'a> {
    pub fn new(data: &'a [u8], version: WireVersion) -> Self {
        Self {
            data,
            pos: 0,
            version,
        }
    }

    pub fn version(&self) -> WireVersion {
        self.version
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> MetadataResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(MetadataError::decode(format!(
                "unexpected end of stream: wanted {} bytes at offset {}, {} available",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> MetadataResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Advances past exactly `n` bytes.
    ///
    /// A declared length that runs past the end of the buffer means the
    /// stream is truncated or tampered with.
    pub fn skip(&mut self, n: usize) -> MetadataResult<()> {
        if self.remaining() < n {
            return Err(MetadataError::corrupt(format!(
                "failed to skip {} bytes at offset {}: only {} available",
                n,
                self.pos,
                self.remaining()
            )));
        }
        trace!(offset = self.pos, len = n, "skipping bytes");
        self.pos += n;
        Ok(())
    }

    pub fn read_byte(&mut self) -> MetadataResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Raw bytes with no length prefix.
    pub fn read_bytes(&mut self, n: usize) -> MetadataResult<&'a [u8]> {
        self.take(n)
    }

    pub fn read_bool(&mut self) -> MetadataResult<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MetadataError::decode(format!(
                "unexpected byte [0x{:02x}] for boolean",
                other
            ))),
        }
    }

    pub fn read_optional_bool(&mut self) -> MetadataResult<Option<bool>> {
        match self.read_byte()? {
            OPTIONAL_FALSE => Ok(Some(false)),
            OPTIONAL_TRUE => Ok(Some(true)),
            OPTIONAL_NONE => Ok(None),
            other => Err(MetadataError::decode(format!(
                "unexpected byte [0x{:02x}] for optional boolean",
                other
            ))),
        }
    }

    pub fn read_short(&mut self) -> MetadataResult<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_int(&mut self) -> MetadataResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_long(&mut self) -> MetadataResult<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn read_float(&mut self) -> MetadataResult<f32> {
        Ok(f32::from_bits(self.read_int()? as u32))
    }

    pub fn read_double(&mut self) -> MetadataResult<f64> {
        Ok(f64::from_bits(self.read_long()? as u64))
    }

    pub fn read_vint(&mut self) -> MetadataResult<i32> {
        let mut result: u32 = 0;
        for i in 0..5 {
            let b = self.read_byte()?;
            if i == 4 && b & 0xf0 != 0 {
                return Err(MetadataError::decode(format!(
                    "invalid vint: fifth byte [0x{:02x}] overflows 32 bits",
                    b
                )));
            }
            result |= ((b & 0x7f) as u32) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result as i32);
            }
        }
        Err(MetadataError::decode("invalid vint: more than 5 bytes"))
    }

    pub fn read_vlong(&mut self) -> MetadataResult<u64> {
        let mut result: u64 = 0;
        for i in 0..10 {
            let b = self.read_byte()?;
            if i == 9 && b > 1 {
                return Err(MetadataError::decode(format!(
                    "invalid vlong: tenth byte [0x{:02x}] overflows 64 bits",
                    b
                )));
            }
            result |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(MetadataError::decode("invalid vlong: more than 10 bytes"))
    }

    /// A vint used as a collection size or byte length.
    pub(crate) fn read_len(&mut self) -> MetadataResult<usize> {
        let len = self.read_vint()?;
        usize::try_from(len)
            .map_err(|_| MetadataError::decode(format!("negative length [{}]", len)))
    }

    pub fn read_string(&mut self) -> MetadataResult<String> {
        let count = self.read_len()?;
        let mut units = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let b = self.read_byte()? as u16;
            let unit = match b >> 4 {
                0..=7 => b,
                12 | 13 => {
                    let b2 = self.read_byte()? as u16;
                    ((b & 0x1f) << 6) | (b2 & 0x3f)
                }
                14 => {
                    let b2 = self.read_byte()? as u16;
                    let b3 = self.read_byte()? as u16;
                    ((b & 0x0f) << 12) | ((b2 & 0x3f) << 6) | (b3 & 0x3f)
                }
                _ => {
                    return Err(MetadataError::decode(format!(
                        "invalid string; unexpected character [0x{:02x}]",
                        b
                    )))
                }
            };
            units.push(unit);
        }
        String::from_utf16(&units)
            .map_err(|e| MetadataError::decode(format!("invalid string: {}", e)))
    }

    pub fn read_optional_string(&mut self) -> MetadataResult<Option<String>> {
        if self.read_bool()? {
            Ok(Some(self.read_string()?))
        } else {
            Ok(None)
        }
    }

    pub fn read_string_set(&mut self) -> MetadataResult<BTreeSet<String>> {
        let count = self.read_len()?;
        let mut set = BTreeSet::new();
        for _ in 0..count {
            set.insert(self.read_string()?);
        }
        Ok(set)
    }

    pub fn read_byte_array(&mut self) -> MetadataResult<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_vlong_array(&mut self) -> MetadataResult<Vec<u64>> {
        let len = self.read_len()?;
        let mut values = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            values.push(self.read_vlong()?);
        }
        Ok(values)
    }
}
