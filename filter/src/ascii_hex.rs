//! ASCIIHexDecode filter.
use crate::{
    ascii85::is_white_space,
    chunk::Codec,
    error::{FilterError, Result},
};

const TERMINATOR: u8 = b'>';

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct AsciiHexDecoder {
    // high nibble waiting for its pair, may come from previous chunk
    high: Option<u8>,
    done: bool,
}

impl AsciiHexDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for AsciiHexDecoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.done {
            return Ok(vec![]);
        }

        let mut out = Vec::with_capacity(input.len() / 2 + 1);
        for &b in input {
            if b == TERMINATOR {
                if let Some(high) = self.high.take() {
                    out.push(high << 4);
                }
                self.done = true;
                break;
            }
            if is_white_space(b) {
                continue;
            }

            let v = hex_value(b)
                .ok_or_else(|| FilterError::format(format!("invalid hex char {:#04x}", b)))?;
            match self.high.take() {
                Some(high) => out.push(high << 4 | v),
                None => self.high = Some(v),
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        if self.done {
            Ok(vec![])
        } else if self.high.is_some() {
            Err(FilterError::truncated("dangling hex digit at end of data"))
        } else {
            Err(FilterError::format("missing hex terminator '>'"))
        }
    }

    fn is_finished(&self) -> bool {
        self.done
    }
}

#[derive(Debug, Default)]
pub struct AsciiHexEncoder;

impl Codec for AsciiHexEncoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(hex::encode(input).into_bytes())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        Ok(vec![TERMINATOR])
    }
}

#[cfg(test)]
mod tests;
