//! Raw deflate codec framed as `[D F L \0][deflate stream]`

use std::io::{self, BufReader, BufWriter, Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::errors::{MetadataError, MetadataResult};

use super::{Compressor, StreamEncoder};

const HEADER: [u8; 4] = [b'D', b'F', b'L', 0];
const LEVEL: u32 = 3;
const BUFFER_SIZE: usize = 4096;

/// Deflate without zlib wrapping, at a fixed low compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateCompressor;

impl DeflateCompressor {
    pub const NAME: &'static str = "SIMPLE_DEFLATE";
}

impl Compressor for DeflateCompressor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn header_length(&self) -> usize {
        HEADER.len()
    }

    fn is_compressed(&self, bytes: &[u8]) -> bool {
        bytes.len() >= HEADER.len() && bytes[..HEADER.len()] == HEADER
    }

    fn compress(&self, raw: &[u8]) -> MetadataResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(HEADER.len() + raw.len() / 2);
        buffer.extend_from_slice(&HEADER);

        let mut encoder = DeflateEncoder::new(buffer, Compression::new(LEVEL));
        encoder
            .write_all(raw)
            .map_err(|e| MetadataError::io("deflate compression failed", e))?;
        encoder
            .finish()
            .map_err(|e| MetadataError::io("deflate compression failed", e))
    }

    fn decompress(&self, compressed: &[u8]) -> MetadataResult<Vec<u8>> {
        if !self.is_compressed(compressed) {
            return Err(MetadataError::decode(
                "input is not compressed with DEFLATE: missing header",
            ));
        }

        let mut decoder = DeflateDecoder::new(&compressed[HEADER.len()..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| MetadataError::decode(format!("corrupt deflate stream: {}", e)))?;
        Ok(out)
    }

    fn output_stream<'a>(
        &self,
        sink: &'a mut dyn Write,
    ) -> MetadataResult<Box<dyn StreamEncoder + 'a>> {
        sink.write_all(&HEADER)
            .map_err(|e| MetadataError::io("failed to write compression header", e))?;
        let encoder = DeflateEncoder::new(sink, Compression::new(LEVEL));
        Ok(Box::new(DeflateStreamEncoder {
            inner: BufWriter::with_capacity(BUFFER_SIZE, encoder),
        }))
    }

    fn input_stream<'a>(&self, source: &'a mut dyn Read) -> MetadataResult<Box<dyn Read + 'a>> {
        let mut header = [0u8; 4];
        source
            .read_exact(&mut header)
            .map_err(|e| MetadataError::decode(format!("failed to read compression header: {}", e)))?;
        if header != HEADER {
            return Err(MetadataError::decode(
                "input stream is not compressed with DEFLATE",
            ));
        }
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            DeflateDecoder::new(source),
        )))
    }
}

struct DeflateStreamEncoder<'a> {
    inner: BufWriter<DeflateEncoder<&'a mut dyn Write>>,
}

impl Write for DeflateStreamEncoder<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl StreamEncoder for DeflateStreamEncoder<'_> {
    fn finish(self: Box<Self>) -> MetadataResult<()> {
        let encoder = self
            .inner
            .into_inner()
            .map_err(|e| MetadataError::io("failed to flush compression buffer", e.into_error()))?;
        encoder
            .finish()
            .map_err(|e| MetadataError::io("failed to finish deflate stream", e))?;
        Ok(())
    }
}
