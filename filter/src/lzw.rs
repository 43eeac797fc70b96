//! LZWDecode filter.
//!
//! Codes are packed msb first, start at 9 bits and grow up to 12 bits.
//! Code 256 clears the table, 257 marks end of data.
use crate::{
    chunk::Codec,
    error::{FilterError, Result},
};
use ahash::{HashMap, HashMapExt};
use log::{debug, warn};

const CLEAR_TABLE: u16 = 256;
const EOD: u16 = 257;
const FIRST_CODE: u16 = 258;
const MIN_CODE_WIDTH: u32 = 9;
const MAX_CODE_WIDTH: u32 = 12;
const MAX_TABLE_SIZE: u16 = 1 << MAX_CODE_WIDTH;
const NO_PREFIX: u16 = u16::MAX;

/// Code width needed while `max_code` is the largest code in the encoder
/// table.
///
/// With early change the width grows one code before the table needs it, so
/// the first 10 bits code follows the creation of entry 511.
fn code_width(max_code: u16, early_change: u16) -> u32 {
    let mut width = MIN_CODE_WIDTH;
    while width < MAX_CODE_WIDTH && max_code + early_change >= 1 << width {
        width += 1;
    }
    width
}

/// Msb first bit accumulator, holds less than one code plus one byte.
#[derive(Debug, Default)]
struct BitBuffer {
    acc: u32,
    bits: u32,
}

impl BitBuffer {
    fn push_byte(&mut self, b: u8) {
        self.acc = self.acc << 8 | u32::from(b);
        self.bits += 8;
    }

    fn take(&mut self, width: u32) -> Option<u16> {
        if self.bits < width {
            return None;
        }
        self.bits -= width;
        let code = (self.acc >> self.bits) as u16;
        self.acc &= (1 << self.bits) - 1;
        Some(code)
    }

    fn put(&mut self, code: u16, width: u32, out: &mut Vec<u8>) {
        self.acc = self.acc << width | u32::from(code);
        self.bits += width;
        while self.bits >= 8 {
            self.bits -= 8;
            out.push((self.acc >> self.bits) as u8);
        }
        self.acc &= (1 << self.bits) - 1;
    }

    /// Write out remaining bits, zero padded to a byte.
    fn flush(&mut self, out: &mut Vec<u8>) {
        if self.bits > 0 {
            out.push((self.acc << (8 - self.bits)) as u8);
        }
        self.acc = 0;
        self.bits = 0;
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: u16,
    byte: u8,
    first: u8,
    len: u16,
}

/// Decoder string table, each entry refers its prefix entry.
#[derive(Debug)]
struct Table(Vec<Entry>);

impl Table {
    fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_TABLE_SIZE as usize);
        entries.extend((0..=255u8).map(|b| Entry {
            prefix: NO_PREFIX,
            byte: b,
            first: b,
            len: 1,
        }));
        // placeholders of CLEAR_TABLE and EOD, never written out
        let reserved = Entry {
            prefix: NO_PREFIX,
            byte: 0,
            first: 0,
            len: 0,
        };
        entries.extend([reserved, reserved]);
        Self(entries)
    }

    fn reset(&mut self) {
        self.0.truncate(FIRST_CODE as usize);
    }

    fn next_code(&self) -> u16 {
        self.0.len() as u16
    }

    fn is_full(&self) -> bool {
        self.next_code() >= MAX_TABLE_SIZE
    }

    fn first_byte(&self, code: u16) -> u8 {
        self.0[code as usize].first
    }

    fn push(&mut self, prefix: u16, byte: u8) {
        let p = self.0[prefix as usize];
        self.0.push(Entry {
            prefix,
            byte,
            first: p.first,
            len: p.len + 1,
        });
    }

    fn write(&self, code: u16, out: &mut Vec<u8>) {
        let len = self.0[code as usize].len as usize;
        let start = out.len();
        out.resize(start + len, 0);
        let dest = &mut out[start..];
        let mut code = code;
        for d in dest.iter_mut().rev() {
            let entry = &self.0[code as usize];
            *d = entry.byte;
            code = entry.prefix;
        }
    }
}

pub struct LzwDecoder {
    table: Table,
    bits: BitBuffer,
    width: u32,
    prev: Option<u16>,
    early_change: u16,
    done: bool,
}

impl LzwDecoder {
    pub fn new(early_change: bool) -> Self {
        Self {
            table: Table::new(),
            bits: BitBuffer::default(),
            width: MIN_CODE_WIDTH,
            prev: None,
            early_change: u16::from(early_change),
            done: false,
        }
    }

    fn decode_code(&mut self, code: u16, out: &mut Vec<u8>) -> Result<()> {
        match code {
            CLEAR_TABLE => {
                debug!("LZW clear table at {} entries", self.table.next_code());
                self.table.reset();
                self.width = MIN_CODE_WIDTH;
                self.prev = None;
                return Ok(());
            }
            EOD => {
                self.done = true;
                return Ok(());
            }
            _ => {}
        }

        if self.table.is_full() {
            return Err(FilterError::format(format!(
                "LZW code table full, expect clear-table code, got {}",
                code
            )));
        }

        let next = self.table.next_code();
        match self.prev {
            None if code < CLEAR_TABLE => self.table.write(code, out),
            None => {
                return Err(FilterError::format(format!(
                    "LZW code {} not allowed right after clear-table",
                    code
                )))
            }
            Some(prev) if code < next => {
                self.table.write(code, out);
                self.table.push(prev, self.table.first_byte(code));
            }
            Some(prev) if code == next => {
                self.table.push(prev, self.table.first_byte(prev));
                self.table.write(code, out);
            }
            Some(_) => {
                return Err(FilterError::format(format!(
                    "LZW code {} above table size {}",
                    code, next
                )))
            }
        }
        self.prev = Some(code);
        // one entry behind the encoder, so the encoder's largest code is our next
        self.width = code_width(self.table.next_code(), self.early_change);
        Ok(())
    }
}

impl Codec for LzwDecoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() * 2);
        for &b in input {
            if self.done {
                break;
            }
            self.bits.push_byte(b);
            while let Some(code) = self.bits.take(self.width) {
                self.decode_code(code, &mut out)?;
                if self.done {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        if !self.done {
            if self.bits.bits >= 8 {
                return Err(FilterError::truncated(format!(
                    "LZW data ends inside a {} bits code",
                    self.width
                )));
            }
            warn!("LZW data ends without EOD code");
            self.done = true;
        }
        Ok(vec![])
    }

    fn is_finished(&self) -> bool {
        self.done
    }
}

pub struct LzwEncoder {
    table: HashMap<(u16, u8), u16>,
    next_code: u16,
    current: Option<u16>,
    bits: BitBuffer,
    early_change: u16,
    started: bool,
}

impl LzwEncoder {
    pub fn new(early_change: bool) -> Self {
        Self {
            table: HashMap::with_capacity(MAX_TABLE_SIZE as usize),
            next_code: FIRST_CODE,
            current: None,
            bits: BitBuffer::default(),
            early_change: u16::from(early_change),
            started: false,
        }
    }

    fn write_code(&mut self, code: u16, out: &mut Vec<u8>) {
        let width = code_width(self.next_code - 1, self.early_change);
        self.bits.put(code, width, out);
    }

    fn start(&mut self, out: &mut Vec<u8>) {
        if !self.started {
            self.started = true;
            self.write_code(CLEAR_TABLE, out);
        }
    }

    fn reset(&mut self, out: &mut Vec<u8>) {
        self.write_code(CLEAR_TABLE, out);
        debug!("LZW encoder table reset");
        self.table.clear();
        self.next_code = FIRST_CODE;
    }
}

impl Codec for LzwEncoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len());
        self.start(&mut out);
        for &b in input {
            let Some(cur) = self.current else {
                self.current = Some(u16::from(b));
                continue;
            };
            if let Some(&code) = self.table.get(&(cur, b)) {
                self.current = Some(code);
                continue;
            }

            self.write_code(cur, &mut out);
            self.next_code += 1;
            if self.next_code > MAX_TABLE_SIZE {
                // entry of the code just written does not fit, start over
                self.reset(&mut out);
            } else {
                self.table.insert((cur, b), self.next_code - 1);
            }
            self.current = Some(u16::from(b));
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(8);
        self.start(&mut out);
        if let Some(cur) = self.current.take() {
            self.write_code(cur, &mut out);
            // decoder adds an entry for the last code before reading EOD
            self.next_code = (self.next_code + 1).min(MAX_TABLE_SIZE);
        }
        self.write_code(EOD, &mut out);
        self.bits.flush(&mut out);
        Ok(out)
    }
}
