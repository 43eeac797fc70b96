//! FlateDecode filter, chunked wrapper of flate2's low level api.
use crate::{
    chunk::Codec,
    error::{FilterError, Result},
};
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use log::warn;

const MIN_OUTPUT: usize = 1024;

/// True if `cmf`, `flg` form a valid zlib header using deflate.
fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0f == 8 && (u16::from(cmf) << 8 | u16::from(flg)) % 31 == 0
}

fn grow(out: &mut Vec<u8>) {
    if out.len() == out.capacity() {
        out.reserve(out.capacity().max(MIN_OUTPUT));
    }
}

/// Inflates zlib data, falls back to raw deflate if the zlib header is missing.
#[derive(Default)]
pub struct FlateDecoder {
    inner: Option<Decompress>,
    // first bytes kept until the header can be checked
    header: Vec<u8>,
    done: bool,
}

impl FlateDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn inflate(
        inner: &mut Decompress,
        mut input: &[u8],
        flush: FlushDecompress,
        out: &mut Vec<u8>,
    ) -> Result<bool> {
        loop {
            grow(out);
            let (before_in, before_out) = (inner.total_in(), inner.total_out());
            let status = inner
                .decompress_vec(input, out, flush)
                .map_err(|e| FilterError::Primitive(e.to_string()))?;
            let consumed = (inner.total_in() - before_in) as usize;
            let produced = inner.total_out() - before_out;
            input = &input[consumed..];
            match status {
                Status::StreamEnd => return Ok(true),
                _ if out.len() == out.capacity() => continue,
                _ if input.is_empty() || (consumed == 0 && produced == 0) => return Ok(false),
                _ => {}
            }
        }
    }

    /// Initialize the decompressor once two bytes are known, returns the
    /// bytes to feed.
    fn init(&mut self, input: &[u8], at_end: bool) -> Option<Vec<u8>> {
        let n = (2 - self.header.len()).min(input.len());
        self.header.extend_from_slice(&input[..n]);
        if self.header.len() < 2 && !at_end {
            return None;
        }
        let zlib = matches!(self.header[..], [cmf, flg, ..] if is_zlib_header(cmf, flg));
        if !zlib {
            warn!("flate stream without zlib header, inflate as raw deflate");
        }
        self.inner = Some(Decompress::new(zlib));
        let mut data = std::mem::take(&mut self.header);
        data.extend_from_slice(&input[n..]);
        Some(data)
    }
}

impl Codec for FlateDecoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.done {
            return Ok(vec![]);
        }
        let mut out = Vec::with_capacity(input.len() * 3);
        let data;
        let input = if self.inner.is_some() {
            input
        } else {
            match self.init(input, false) {
                Some(d) => {
                    data = d;
                    &data[..]
                }
                None => return Ok(out),
            }
        };
        if let Some(inner) = self.inner.as_mut() {
            self.done = Self::inflate(inner, input, FlushDecompress::None, &mut out)?;
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![];
        if self.done {
            return Ok(out);
        }
        if self.inner.is_none() {
            if self.header.is_empty() {
                // empty stream
                return Ok(out);
            }
            let data = self.init(&[], true).unwrap_or_default();
            if let Some(inner) = self.inner.as_mut() {
                Self::inflate(inner, &data, FlushDecompress::None, &mut out)?;
            }
        }
        if let Some(inner) = self.inner.as_mut() {
            self.done = Self::inflate(inner, &[], FlushDecompress::Finish, &mut out)?;
        }
        if !self.done {
            warn!("flate stream ends without end of block");
            self.done = true;
        }
        Ok(out)
    }

    fn is_finished(&self) -> bool {
        self.done
    }
}

/// Deflates into a zlib stream.
pub struct FlateEncoder {
    inner: Compress,
}

impl FlateEncoder {
    pub fn new() -> Self {
        Self {
            inner: Compress::new(Compression::default(), true),
        }
    }

    fn deflate(&mut self, mut input: &[u8], flush: FlushCompress) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() / 2 + 64);
        loop {
            grow(&mut out);
            let (before_in, before_out) = (self.inner.total_in(), self.inner.total_out());
            let status = self
                .inner
                .compress_vec(input, &mut out, flush)
                .map_err(|e| FilterError::Primitive(e.to_string()))?;
            let consumed = (self.inner.total_in() - before_in) as usize;
            let produced = self.inner.total_out() - before_out;
            input = &input[consumed..];
            match status {
                Status::StreamEnd => break,
                _ if out.len() == out.capacity() => {}
                _ if flush == FlushCompress::Finish => {}
                _ if input.is_empty() => break,
                _ if consumed == 0 && produced == 0 => {
                    return Err(FilterError::Primitive("deflate made no progress".into()))
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

impl Default for FlateEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for FlateEncoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(vec![]);
        }
        self.deflate(input, FlushCompress::None)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        self.deflate(&[], FlushCompress::Finish)
    }
}
