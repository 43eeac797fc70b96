//! TIFF and PNG predictors used by LZWDecode and FlateDecode.
use crate::{
    chunk::Codec,
    error::{FilterError, Result},
    params::{PngFilter, Predictor, SampleLayout, Strictness},
};
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use log::warn;

/// Paeth, returns a, b, or c, whichever is closet to a + b - c
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let aa = i16::from(a);
    let bb = i16::from(b);
    let cc = i16::from(c);

    let p = aa + bb - cc;

    let da = (p - aa).abs();
    let db = (p - bb).abs();
    let dc = (p - cc).abs();

    if da <= db && da <= dc {
        a
    } else if db <= dc {
        b
    } else {
        c
    }
}

fn png_predict(filter: PngFilter, a: u8, b: u8, c: u8) -> u8 {
    match filter {
        PngFilter::None => 0,
        PngFilter::Sub => a,
        PngFilter::Up => b,
        PngFilter::Average => ((u16::from(a) + u16::from(b)) / 2) as u8,
        PngFilter::Paeth => paeth(a, b, c),
    }
}

/// Restore one png row, `row` starts with the filter tag and may be shorter
/// than a full row. `upper` is the previous restored row, updated in place.
fn png_decode_row(row: &[u8], upper: &mut [u8], bpp: usize, out: &mut Vec<u8>) -> Result<()> {
    let Some((&tag, data)) = row.split_first() else {
        return Ok(());
    };
    let filter = PngFilter::from_repr(tag)
        .ok_or_else(|| FilterError::format(format!("unknown png predictor: {}", tag)))?;

    let start = out.len();
    out.extend_from_slice(data);
    let cur = &mut out[start..];
    if filter != PngFilter::None {
        for i in 0..cur.len() {
            let (a, c) = if i >= bpp {
                (cur[i - bpp], upper[i - bpp])
            } else {
                (0, 0)
            };
            cur[i] = cur[i].wrapping_add(png_predict(filter, a, upper[i], c));
        }
    }
    upper[..cur.len()].copy_from_slice(cur);
    Ok(())
}

/// Filter one row with `filter`, prefixing the tag. `upper` is the previous
/// raw row, updated in place.
fn png_encode_row(filter: PngFilter, row: &[u8], upper: &mut [u8], bpp: usize, out: &mut Vec<u8>) {
    out.push(filter as u8);
    out.extend(row.iter().enumerate().map(|(i, &x)| {
        let (a, c) = if i >= bpp {
            (row[i - bpp], upper[i - bpp])
        } else {
            (0, 0)
        };
        x.wrapping_sub(png_predict(filter, a, upper[i], c))
    }));
    upper[..row.len()].copy_from_slice(row);
}

/// Apply tiff predictor 2 to one row in place, `row` may be a truncated row.
fn tiff_row(row: &mut [u8], layout: &SampleLayout, decode: bool) -> Result<()> {
    let colors = layout.colors;
    let bpc = layout.bits_per_component;
    if bpc == 8 {
        if decode {
            for i in colors..row.len() {
                row[i] = row[i].wrapping_add(row[i - colors]);
            }
        } else {
            for i in (colors..row.len()).rev() {
                row[i] = row[i].wrapping_sub(row[i - colors]);
            }
        }
        return Ok(());
    }

    let n = (row.len() * 8 / bpc).min(layout.columns * colors);
    let mask = (1u32 << bpc) - 1;
    let mut samples = Vec::with_capacity(n);
    let mut r = BitReader::endian(&row[..], BigEndian);
    for _ in 0..n {
        samples.push(r.read::<u32>(bpc as u32)?);
    }
    if decode {
        for i in colors..n {
            samples[i] = samples[i].wrapping_add(samples[i - colors]) & mask;
        }
    } else {
        for i in (colors..n).rev() {
            samples[i] = samples[i].wrapping_sub(samples[i - colors]) & mask;
        }
    }

    let mut w = BitWriter::endian(Vec::with_capacity(row.len()), BigEndian);
    for s in samples {
        w.write(bpc as u32, s)?;
    }
    w.byte_align()?;
    let bytes = w.into_writer();
    // keep padding bits at the end of the row untouched
    let (full, rem) = (n * bpc / 8, n * bpc % 8);
    row[..full].copy_from_slice(&bytes[..full]);
    if rem > 0 {
        let mask = 0xffu8 << (8 - rem);
        row[full] = (bytes[full] & mask) | (row[full] & !mask);
    }
    Ok(())
}

/// Splits incoming chunks into rows of fixed size, keeping the partial row.
#[derive(Debug)]
struct RowBuffer {
    size: usize,
    pending: Vec<u8>,
}

impl RowBuffer {
    fn new(size: usize) -> Self {
        Self {
            size,
            pending: Vec::with_capacity(size),
        }
    }

    fn feed(&mut self, mut input: &[u8], mut f: impl FnMut(&[u8]) -> Result<()>) -> Result<()> {
        if !self.pending.is_empty() {
            let n = (self.size - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..n]);
            input = &input[n..];
            if self.pending.len() < self.size {
                return Ok(());
            }
            f(&self.pending)?;
            self.pending.clear();
        }

        let mut rows = input.chunks_exact(self.size);
        for row in &mut rows {
            f(row)?;
        }
        self.pending.extend_from_slice(rows.remainder());
        Ok(())
    }

    fn take_pending(&mut self) -> Option<Vec<u8>> {
        (!self.pending.is_empty()).then(|| std::mem::take(&mut self.pending))
    }

    /// Take the incomplete last row, error if strict.
    fn take_partial(&mut self, strictness: Strictness) -> Result<Option<Vec<u8>>> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let msg = format!(
            "predictor row needs {} bytes, only {} left",
            self.size,
            self.pending.len()
        );
        match strictness {
            Strictness::Strict => Err(FilterError::truncated(msg)),
            Strictness::Lenient => {
                warn!("{}, process as truncated row", msg);
                Ok(Some(std::mem::take(&mut self.pending)))
            }
        }
    }
}

fn wire_row_size(predictor: Predictor, layout: &SampleLayout) -> usize {
    match predictor {
        Predictor::Png(_) => layout.row_bytes() + 1,
        _ => layout.row_bytes(),
    }
}

/// Undo predictor on decoded LZW or Flate data.
#[derive(Debug)]
pub struct PredictorDecoder {
    predictor: Predictor,
    layout: SampleLayout,
    strictness: Strictness,
    rows: RowBuffer,
    upper: Vec<u8>,
}

impl PredictorDecoder {
    pub fn new(predictor: Predictor, layout: SampleLayout, strictness: Strictness) -> Self {
        Self {
            predictor,
            layout,
            strictness,
            rows: RowBuffer::new(wire_row_size(predictor, &layout)),
            upper: vec![0; layout.row_bytes()],
        }
    }

    fn decode_row(&mut self, row: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match self.predictor {
            Predictor::None => out.extend_from_slice(row),
            Predictor::Tiff => {
                let start = out.len();
                out.extend_from_slice(row);
                tiff_row(&mut out[start..], &self.layout, true)?;
            }
            Predictor::Png(_) => {
                png_decode_row(row, &mut self.upper, self.layout.pixel_bytes(), out)?
            }
        }
        Ok(())
    }
}

impl Codec for PredictorDecoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.predictor == Predictor::None {
            return Ok(input.to_vec());
        }

        let mut out = Vec::with_capacity(input.len() + self.layout.row_bytes());
        let mut rows = std::mem::replace(&mut self.rows, RowBuffer::new(0));
        let r = rows.feed(input, |row| self.decode_row(row, &mut out));
        self.rows = rows;
        r.map(|_| out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![];
        if let Some(row) = self.rows.take_partial(self.strictness)? {
            self.decode_row(&row, &mut out)?;
        }
        Ok(out)
    }
}

/// Apply predictor before LZW or Flate encoding.
#[derive(Debug)]
pub struct PredictorEncoder {
    predictor: Predictor,
    layout: SampleLayout,
    rows: RowBuffer,
    upper: Vec<u8>,
}

impl PredictorEncoder {
    pub fn new(predictor: Predictor, layout: SampleLayout) -> Self {
        Self {
            predictor,
            layout,
            rows: RowBuffer::new(layout.row_bytes()),
            upper: vec![0; layout.row_bytes()],
        }
    }

    fn encode_row(&mut self, row: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match self.predictor {
            Predictor::None => out.extend_from_slice(row),
            Predictor::Tiff => {
                let start = out.len();
                out.extend_from_slice(row);
                tiff_row(&mut out[start..], &self.layout, false)?;
            }
            Predictor::Png(filter) => png_encode_row(
                filter,
                row,
                &mut self.upper,
                self.layout.pixel_bytes(),
                out,
            ),
        }
        Ok(())
    }
}

impl Codec for PredictorEncoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.predictor == Predictor::None {
            return Ok(input.to_vec());
        }

        let mut out = Vec::with_capacity(input.len() + input.len() / self.rows.size + 1);
        let mut rows = std::mem::replace(&mut self.rows, RowBuffer::new(0));
        let r = rows.feed(input, |row| self.encode_row(row, &mut out));
        self.rows = rows;
        r.map(|_| out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        // data of any length is accepted, last row may be short
        let mut out = vec![];
        if let Some(row) = self.rows.take_pending() {
            self.encode_row(&row, &mut out)?;
        }
        Ok(out)
    }
}
