//! Growable binary output

use crate::errors::MetadataResult;
use crate::version::WireVersion;

use super::{OPTIONAL_FALSE, OPTIONAL_NONE, OPTIONAL_TRUE};

/// Append-only byte sink bound to a negotiated peer version.
#[derive(Debug, Clone)]
pub struct StreamOutput {
    buf: Vec<u8>,
    version: WireVersion,
}

impl StreamOutput {
    pub fn new(version: WireVersion) -> Self {
        Self {
            buf: Vec::new(),
            version,
        }
    }

    pub fn with_capacity(version: WireVersion, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            version,
        }
    }

    pub fn version(&self) -> WireVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn write_optional_bool(&mut self, value: Option<bool>) {
        self.buf.push(match value {
            Some(false) => OPTIONAL_FALSE,
            Some(true) => OPTIONAL_TRUE,
            None => OPTIONAL_NONE,
        });
    }

    pub fn write_short(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_int(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_long(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_float(&mut self, value: f32) {
        self.write_int(value.to_bits() as i32);
    }

    pub fn write_double(&mut self, value: f64) {
        self.write_long(value.to_bits() as i64);
    }

    /// Negative values are written as their unsigned 32-bit image (5 bytes).
    pub fn write_vint(&mut self, value: i32) {
        let mut v = value as u32;
        while v & !0x7f != 0 {
            self.buf.push(((v & 0x7f) | 0x80) as u8);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    pub fn write_vlong(&mut self, value: u64) {
        let mut v = value;
        while v & !0x7f != 0 {
            self.buf.push(((v & 0x7f) | 0x80) as u8);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    /// Length as a vint. Collections larger than `i32::MAX` cannot be framed.
    pub(crate) fn write_len(&mut self, len: usize) {
        self.write_vint(len as i32);
    }

    /// UTF-16 unit count, then each unit as 1 to 3 bytes.
    pub fn write_string(&mut self, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_len(units.len());
        for unit in units {
            let c = unit as u32;
            if c <= 0x7f {
                self.buf.push(c as u8);
            } else if c > 0x07ff {
                self.buf.push((0xe0 | ((c >> 12) & 0x0f)) as u8);
                self.buf.push((0x80 | ((c >> 6) & 0x3f)) as u8);
                self.buf.push((0x80 | (c & 0x3f)) as u8);
            } else {
                self.buf.push((0xc0 | ((c >> 6) & 0x1f)) as u8);
                self.buf.push((0x80 | (c & 0x3f)) as u8);
            }
        }
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.write_bool(true);
                self.write_string(s);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_string_collection<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a String>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = values.into_iter();
        self.write_len(iter.len());
        for value in iter {
            self.write_string(value);
        }
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_vlong_array(&mut self, values: &[u64]) {
        self.write_len(values.len());
        for &v in values {
            self.write_vlong(v);
        }
    }

    /// Encodes `body` as one extension entry.
    ///
    /// At or after the skippable-fields threshold the body is buffered and
    /// emitted behind a vint byte length. Older peers get the body unframed.
    pub fn write_skippable<F>(&mut self, body: F) -> MetadataResult<()>
    where
        F: FnOnce(&mut StreamOutput) -> MetadataResult<()>,
    {
        if self.version.supports_skippable_fields() {
            let mut scratch = StreamOutput::new(self.version);
            body(&mut scratch)?;
            self.write_len(scratch.len());
            self.buf.extend_from_slice(&scratch.buf);
            Ok(())
        } else {
            body(self)
        }
    }
}
