//! Pull based chunk streams.
//!
//! A chunk source is any iterator of `Result<Vec<u8>>`. Codecs are state
//! machines fed one input chunk at a time, [`CodecStream`] drives a codec
//! from a source and is itself a source, so stages chain by wrapping.
use crate::error::Result;

/// Chunk size used when the caller does not configure one.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A stateful encoder or decoder.
///
/// `process` consumes the whole input chunk and returns whatever output it
/// allows, keeping incomplete units (a partial code, group or row) in the
/// codec. `finish` is called once after the last chunk and must either
/// resolve the leftover state or fail.
pub trait Codec {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    fn finish(&mut self) -> Result<Vec<u8>>;

    /// True once the codec has seen its end marker, further input is ignored.
    fn is_finished(&self) -> bool {
        false
    }

    /// Process `data` as the only chunk, and finish.
    fn run(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut r = self.process(data)?;
        r.extend(self.finish()?);
        Ok(r)
    }
}

impl<C: Codec + ?Sized> Codec for &mut C {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        (**self).process(input)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        (**self).finish()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        (**self).process(input)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        (**self).finish()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// Runs `first`, feeding its output to `second`.
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Codec, B: Codec> Chain<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Codec, B: Codec> Codec for Chain<A, B> {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mid = self.first.process(input)?;
        self.second.process(&mid)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mid = self.first.finish()?;
        let mut r = self.second.process(&mid)?;
        r.extend(self.second.finish()?);
        Ok(r)
    }

    fn is_finished(&self) -> bool {
        self.first.is_finished()
    }
}

/// Type erased chunk source, the unit pipelines are built from.
pub type ChunkSource<'a> = Box<dyn Iterator<Item = Result<Vec<u8>>> + 'a>;

/// Split `data` into chunks of `size` bytes, `size` 0 yields `data` as one chunk.
pub fn chunks_of(data: &[u8], size: usize) -> impl Iterator<Item = Result<Vec<u8>>> + '_ {
    let size = if size == 0 { data.len().max(1) } else { size };
    data.chunks(size).map(|c| Ok(c.to_vec()))
}

/// Drain `source`, concatenating all chunks.
pub fn collect_chunks(source: impl Iterator<Item = Result<Vec<u8>>>) -> Result<Vec<u8>> {
    let mut r = vec![];
    for chunk in source {
        r.extend_from_slice(&chunk?);
    }
    Ok(r)
}

/// Drives `codec` with chunks pulled from `source`.
///
/// Each `next()` pulls as many input chunks as needed to produce one non
/// empty output chunk. After the source is exhausted `finish()` is called
/// once. The stream is fused after an error.
pub struct CodecStream<S, C> {
    source: S,
    codec: C,
    done: bool,
}

impl<S, C> CodecStream<S, C> {
    pub fn new(source: S, codec: C) -> Self {
        Self {
            source,
            codec,
            done: false,
        }
    }
}

impl<S, C> Iterator for CodecStream<S, C>
where
    S: Iterator<Item = Result<Vec<u8>>>,
    C: Codec,
{
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let r = match self.source.next() {
                Some(Ok(chunk)) if !self.codec.is_finished() => self.codec.process(&chunk),
                Some(Ok(_)) | None => {
                    self.done = true;
                    self.codec.finish()
                }
                Some(Err(e)) => Err(e),
            };
            match r {
                Ok(out) if out.is_empty() => continue,
                Ok(out) => return Some(Ok(out)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
