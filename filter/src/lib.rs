//! Streaming encoders and decoders of PDF stream filters.
//!
//! Every filter is a [`Codec`](chunk::Codec): a state machine fed with
//! chunks of any size. [`Pipeline`] chains the filters listed for a stream.
#![deny(clippy::dbg_macro)]
pub mod ascii85;
pub mod ascii_hex;
pub mod chunk;
mod error;
pub mod flate;
pub mod lzw;
pub mod params;
pub mod pipeline;
pub mod predictor;
pub mod run_length;

pub use chunk::{chunks_of, collect_chunks, ChunkSource, Codec, CodecStream};
pub use error::{FilterError, Result};
pub use params::{FilterOptions, FilterParameters, PngFilter, Predictor, Strictness};
pub use pipeline::{FilterName, Pipeline};
