//! RunLengthDecode filter.
use crate::{
    chunk::Codec,
    error::{FilterError, Result},
};

const EOD: u8 = 128;
const MAX_RUN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Length,
    // bytes left to copy literally
    Literal(usize),
    // times to repeat the next byte
    Repeat(usize),
    Done,
}

#[derive(Debug)]
pub struct RunLengthDecoder {
    state: State,
}

impl RunLengthDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Length,
        }
    }
}

impl Default for RunLengthDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for RunLengthDecoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(input.len() * 2);
        for &b in input {
            self.state = match self.state {
                State::Length => match b {
                    // copy _following_ length + 1 bytes literally
                    0..=127 => State::Literal(b as usize + 1),
                    EOD => State::Done,
                    // copy next byte 2 - 128 times
                    _ => State::Repeat(257 - b as usize),
                },
                State::Literal(n) => {
                    buf.push(b);
                    if n == 1 {
                        State::Length
                    } else {
                        State::Literal(n - 1)
                    }
                }
                State::Repeat(n) => {
                    buf.extend(std::iter::repeat(b).take(n));
                    State::Length
                }
                State::Done => break,
            };
        }
        Ok(buf)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        match self.state {
            State::Length | State::Done => {
                self.state = State::Done;
                Ok(vec![])
            }
            State::Literal(n) => Err(FilterError::truncated(format!(
                "run length literal run misses {} bytes",
                n
            ))),
            State::Repeat(_) => Err(FilterError::truncated(
                "run length repeat run misses its byte",
            )),
        }
    }

    fn is_finished(&self) -> bool {
        self.state == State::Done
    }
}

#[derive(Debug, Default)]
pub struct RunLengthEncoder {
    literal: Vec<u8>,
    run_byte: u8,
    run_len: usize,
}

impl RunLengthEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush_literal(&mut self, out: &mut Vec<u8>) {
        if !self.literal.is_empty() {
            out.push((self.literal.len() - 1) as u8);
            out.append(&mut self.literal);
        }
    }

    fn flush_run(&mut self, out: &mut Vec<u8>) {
        if self.run_len > 0 {
            out.push((257 - self.run_len) as u8);
            out.push(self.run_byte);
            self.run_len = 0;
        }
    }
}

impl Codec for RunLengthEncoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() + input.len() / MAX_RUN + 2);
        for &b in input {
            if self.run_len > 0 {
                if b == self.run_byte && self.run_len < MAX_RUN {
                    self.run_len += 1;
                    continue;
                }
                self.flush_run(&mut out);
            }

            if self.literal.last() == Some(&b) {
                self.literal.pop();
                self.flush_literal(&mut out);
                self.run_byte = b;
                self.run_len = 2;
            } else {
                self.literal.push(b);
                if self.literal.len() == MAX_RUN {
                    self.flush_literal(&mut out);
                }
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.flush_run(&mut out);
        self.flush_literal(&mut out);
        out.push(EOD);
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
