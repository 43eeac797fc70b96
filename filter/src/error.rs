use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Input violates the wire format of the filter.
    #[error("format error: {0}")]
    Format(String),
    /// Input ended in the middle of a code, group or row.
    #[error("data truncated: {0}")]
    DataTruncated(String),
    #[error("unknown filter {0}")]
    UnknownFilter(String),
    #[error("unsupported predictor {0}")]
    UnsupportedPredictor(i32),
    #[error("invalid filter parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: i32 },
    /// Error reported by the wrapped deflate implementation.
    #[error("filter error: {0}")]
    Primitive(String),
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    pub fn format(msg: impl Display) -> Self {
        Self::Format(msg.to_string())
    }

    pub fn truncated(msg: impl Display) -> Self {
        Self::DataTruncated(msg.to_string())
    }

    /// Errors caused by bad input data, as opposed to bad parameters or
    /// failures of the deflate backend.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Format(_) | Self::DataTruncated(_))
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
