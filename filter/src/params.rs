//! Decode parameters of LZW and Flate filters, and runtime options.
use crate::error::{FilterError, Result};

pub const KEY_PREDICTOR: &str = "Predictor";
pub const KEY_COLORS: &str = "Colors";
pub const KEY_BITS_PER_COMPONENT: &str = "BitsPerComponent";
pub const KEY_COLUMNS: &str = "Columns";
pub const KEY_EARLY_CHANGE: &str = "EarlyChange";

/// Upper bound of one predictor row, larger `Columns * Colors` are rejected.
pub const MAX_ROW_BYTES: usize = 1 << 24;

/// Values of the `DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParameters {
    pub predictor: i32,
    pub colors: i32,
    pub bits_per_component: i32,
    pub columns: i32,
    pub early_change: i32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: 1,
        }
    }
}

impl FilterParameters {
    /// Build from dictionary entries, keys not known are ignored.
    pub fn from_entries<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, i32)>) -> Self {
        let mut r = Self::default();
        for (k, v) in entries {
            match k.as_ref() {
                KEY_PREDICTOR => r.predictor = v,
                KEY_COLORS => r.colors = v,
                KEY_BITS_PER_COMPONENT => r.bits_per_component = v,
                KEY_COLUMNS => r.columns = v,
                KEY_EARLY_CHANGE => r.early_change = v,
                _ => {}
            }
        }
        r
    }

    pub fn with_predictor(self, predictor: i32) -> Self {
        Self { predictor, ..self }
    }

    pub fn with_colors(self, colors: i32) -> Self {
        Self { colors, ..self }
    }

    pub fn with_bits_per_component(self, bits_per_component: i32) -> Self {
        Self {
            bits_per_component,
            ..self
        }
    }

    pub fn with_columns(self, columns: i32) -> Self {
        Self { columns, ..self }
    }

    pub fn with_early_change(self, early_change: i32) -> Self {
        Self {
            early_change,
            ..self
        }
    }

    pub fn predictor(&self) -> Result<Predictor> {
        Predictor::try_from(self.predictor)
    }

    /// Validated sample layout, used by predictors.
    pub fn layout(&self) -> Result<SampleLayout> {
        if self.colors < 1 {
            return Err(FilterError::InvalidParameter {
                name: KEY_COLORS,
                value: self.colors,
            });
        }
        if self.columns < 1 {
            return Err(FilterError::InvalidParameter {
                name: KEY_COLUMNS,
                value: self.columns,
            });
        }
        if !matches!(self.bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(FilterError::InvalidParameter {
                name: KEY_BITS_PER_COMPONENT,
                value: self.bits_per_component,
            });
        }
        let layout = SampleLayout {
            colors: self.colors as usize,
            bits_per_component: self.bits_per_component as usize,
            columns: self.columns as usize,
        };
        let row_bits = layout
            .columns
            .checked_mul(layout.colors)
            .and_then(|v| v.checked_mul(layout.bits_per_component));
        match row_bits {
            Some(bits) if bits.div_ceil(8) <= MAX_ROW_BYTES => Ok(layout),
            _ => Err(FilterError::InvalidParameter {
                name: KEY_COLUMNS,
                value: self.columns,
            }),
        }
    }

    /// LZW switches code width one code early unless `EarlyChange` is 0.
    pub fn is_early_change(&self) -> bool {
        self.early_change != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl SampleLayout {
    /// Bytes of one row, without png filter tag.
    pub fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    /// Bytes per complete pixel, at least 1.
    pub fn pixel_bytes(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8)
    }
}

/// Png row filter types, values are the row tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr, strum::Display)]
#[repr(u8)]
pub enum PngFilter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    None,
    Tiff,
    /// Filter type used when encoding, decoding reads it from each row.
    /// `Predictor` 15 (optimum) always encodes with Paeth.
    Png(PngFilter),
}

impl TryFrom<i32> for Predictor {
    type Error = FilterError;

    fn try_from(v: i32) -> Result<Self> {
        Ok(match v {
            ..=1 => Self::None,
            2 => Self::Tiff,
            10 => Self::Png(PngFilter::None),
            11 => Self::Png(PngFilter::Sub),
            12 => Self::Png(PngFilter::Up),
            13 => Self::Png(PngFilter::Average),
            14 | 15 => Self::Png(PngFilter::Paeth),
            _ => return Err(FilterError::UnsupportedPredictor(v)),
        })
    }
}

/// How to handle a final predictor row shorter than a full row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Process the short row as a truncated row.
    #[default]
    Lenient,
    Strict,
}

/// Runtime options not carried by the PDF dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Size of chunks produced when a pipeline reads from a byte slice,
    /// 0 processes the slice at once.
    pub chunk_size: usize,
    pub strictness: Strictness,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::chunk::DEFAULT_CHUNK_SIZE,
            strictness: Strictness::default(),
        }
    }
}
