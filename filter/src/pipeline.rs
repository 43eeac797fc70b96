//! Build codecs from filter names and chain them.
use crate::{
    ascii85::{Ascii85Decoder, Ascii85Encoder},
    ascii_hex::{AsciiHexDecoder, AsciiHexEncoder},
    chunk::{chunks_of, collect_chunks, Chain, ChunkSource, Codec, CodecStream},
    error::{FilterError, Result},
    flate::{FlateDecoder, FlateEncoder},
    lzw::{LzwDecoder, LzwEncoder},
    params::{FilterOptions, FilterParameters, Predictor},
    predictor::{PredictorDecoder, PredictorEncoder},
    run_length::{RunLengthDecoder, RunLengthEncoder},
};
use log::{debug, error};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
pub enum FilterName {
    #[strum(to_string = "ASCIIHexDecode", serialize = "AHx")]
    AsciiHex,
    #[strum(to_string = "ASCII85Decode", serialize = "A85")]
    Ascii85,
    #[strum(to_string = "LZWDecode", serialize = "LZW")]
    Lzw,
    #[strum(to_string = "FlateDecode", serialize = "Fl")]
    Flate,
    #[strum(to_string = "RunLengthDecode", serialize = "RL")]
    RunLength,
}

impl FilterName {
    /// Parse filter name, full name or abbreviation used in inline images.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| FilterError::UnknownFilter(name.to_owned()))
    }

    /// LZW and Flate accept predictor parameters.
    pub fn accepts_predictor(self) -> bool {
        matches!(self, Self::Lzw | Self::Flate)
    }
}

/// Logs errors with the filter name, like other stream decode failures.
struct Logged {
    name: FilterName,
    encode: bool,
    codec: Box<dyn Codec>,
}

impl Logged {
    fn log<T>(&self, r: Result<T>) -> Result<T> {
        r.map_err(|err| {
            let op = if self.encode { "encode" } else { "decode" };
            error!("Failed to {} stream using {}: {}", op, self.name, &err);
            err
        })
    }
}

impl Codec for Logged {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let r = self.codec.process(input);
        self.log(r)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let r = self.codec.finish();
        self.log(r)
    }

    fn is_finished(&self) -> bool {
        self.codec.is_finished()
    }
}

/// Create decoder of one filter. For LZW and Flate a predictor in `params`
/// is undone after decompression.
pub fn decoder(
    name: FilterName,
    params: &FilterParameters,
    options: &FilterOptions,
) -> Result<Box<dyn Codec>> {
    fn with_predictor(
        c: impl Codec + 'static,
        params: &FilterParameters,
        options: &FilterOptions,
    ) -> Result<Box<dyn Codec>> {
        Ok(match params.predictor()? {
            Predictor::None => Box::new(c),
            p => Box::new(Chain::new(
                c,
                PredictorDecoder::new(p, params.layout()?, options.strictness),
            )),
        })
    }

    Ok(match name {
        FilterName::AsciiHex => Box::new(AsciiHexDecoder::new()),
        FilterName::Ascii85 => Box::new(Ascii85Decoder::new()),
        FilterName::RunLength => Box::new(RunLengthDecoder::new()),
        FilterName::Lzw => with_predictor(
            LzwDecoder::new(params.is_early_change()),
            params,
            options,
        )?,
        FilterName::Flate => with_predictor(FlateDecoder::new(), params, options)?,
    })
}

/// Create encoder of one filter, the reverse of [`decoder`]. For LZW and
/// Flate a predictor in `params` is applied before compression.
pub fn encoder(name: FilterName, params: &FilterParameters) -> Result<Box<dyn Codec>> {
    fn with_predictor(
        c: impl Codec + 'static,
        params: &FilterParameters,
    ) -> Result<Box<dyn Codec>> {
        Ok(match params.predictor()? {
            Predictor::None => Box::new(c),
            p => Box::new(Chain::new(PredictorEncoder::new(p, params.layout()?), c)),
        })
    }

    Ok(match name {
        FilterName::AsciiHex => Box::new(AsciiHexEncoder),
        FilterName::Ascii85 => Box::new(Ascii85Encoder::new()),
        FilterName::RunLength => Box::new(RunLengthEncoder::new()),
        FilterName::Lzw => with_predictor(LzwEncoder::new(params.is_early_change()), params)?,
        FilterName::Flate => with_predictor(FlateEncoder::new(), params)?,
    })
}

/// Decode chunks of `source` with one filter.
pub fn decode<'a>(
    source: impl Iterator<Item = Result<Vec<u8>>> + 'a,
    name: FilterName,
    params: &FilterParameters,
    options: &FilterOptions,
) -> Result<ChunkSource<'a>> {
    let codec = Logged {
        name,
        encode: false,
        codec: decoder(name, params, options)?,
    };
    Ok(Box::new(CodecStream::new(source, codec)))
}

/// Encode chunks of `source` with one filter.
pub fn encode<'a>(
    source: impl Iterator<Item = Result<Vec<u8>>> + 'a,
    name: FilterName,
    params: &FilterParameters,
) -> Result<ChunkSource<'a>> {
    let codec = Logged {
        name,
        encode: true,
        codec: encoder(name, params)?,
    };
    Ok(Box::new(CodecStream::new(source, codec)))
}

/// Filters of one stream, in the order of the stream `Filter` entry.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    filters: Vec<(FilterName, FilterParameters)>,
    options: FilterOptions,
}

impl Pipeline {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            filters: vec![],
            options,
        }
    }

    pub fn push(mut self, name: FilterName, params: FilterParameters) -> Self {
        self.filters.push((name, params));
        self
    }

    /// Build from filter names and their optional parameters, missing
    /// parameters use defaults.
    pub fn from_names<'a>(
        names: impl IntoIterator<Item = (&'a str, Option<FilterParameters>)>,
        options: FilterOptions,
    ) -> Result<Self> {
        let filters = names
            .into_iter()
            .map(|(n, p)| Ok((FilterName::parse(n)?, p.unwrap_or_default())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters, options })
    }

    pub fn filters(&self) -> &[(FilterName, FilterParameters)] {
        &self.filters
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Decode `source`, filters applied in order.
    pub fn decode<'a>(
        &self,
        source: impl Iterator<Item = Result<Vec<u8>>> + 'a,
    ) -> Result<ChunkSource<'a>> {
        debug!("decode pipeline: {:?}", self.filters);
        let mut s: ChunkSource<'a> = Box::new(source);
        for (name, params) in &self.filters {
            s = decode(s, *name, params, &self.options)?;
        }
        Ok(s)
    }

    /// Encode `source`, filters applied in reverse order, so that decoding
    /// the result gives `source` back.
    pub fn encode<'a>(
        &self,
        source: impl Iterator<Item = Result<Vec<u8>>> + 'a,
    ) -> Result<ChunkSource<'a>> {
        debug!("encode pipeline: {:?}", self.filters);
        let mut s: ChunkSource<'a> = Box::new(source);
        for (name, params) in self.filters.iter().rev() {
            s = encode(s, *name, params)?;
        }
        Ok(s)
    }

    pub fn decode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        collect_chunks(self.decode(chunks_of(data, self.options.chunk_size))?)
    }

    pub fn encode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        collect_chunks(self.encode(chunks_of(data, self.options.chunk_size))?)
    }
}

#[cfg(test)]
mod tests;
