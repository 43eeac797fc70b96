//! ASCII85Decode filter.
use crate::{
    chunk::Codec,
    error::{FilterError, Result},
};

const TERMINATOR: &[u8] = b"~>";

pub(crate) fn is_white_space(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t' | b'\x0c' | b'\0')
}

fn sym_85(byte: u8) -> Option<u8> {
    match byte {
        b @ 0x21..=0x75 => Some(b - 0x21),
        _ => None,
    }
}

/// Returns None if the group value overflows u32.
fn word_85(digits: [u8; 5]) -> Option<[u8; 4]> {
    let q = digits
        .iter()
        .fold(0u64, |acc, &d| acc * 85 + u64::from(d));
    u32::try_from(q).ok().map(u32::to_be_bytes)
}

fn group_85(word: [u8; 4]) -> [u8; 5] {
    let mut v = u32::from_be_bytes(word);
    let mut r = [0u8; 5];
    for c in r.iter_mut().rev() {
        *c = (v % 85) as u8 + 0x21;
        v /= 85;
    }
    r
}

#[derive(Debug, Default)]
pub struct Ascii85Decoder {
    // digit values, not symbols
    group: [u8; 5],
    len: usize,
    tilde: bool,
    done: bool,
}

impl Ascii85Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush_group(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let word = word_85(self.group)
            .ok_or_else(|| FilterError::format("ascii85 group value exceeds 32 bits"))?;
        out.extend_from_slice(&word);
        self.len = 0;
        Ok(())
    }

    fn flush_tail(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let n = self.len;
        if n == 0 {
            return Ok(());
        }
        self.group[n..].fill(84);
        let word = word_85(self.group)
            .ok_or_else(|| FilterError::format("ascii85 tail value exceeds 32 bits"))?;
        out.extend_from_slice(&word[..n - 1]);
        self.len = 0;
        Ok(())
    }
}

impl Codec for Ascii85Decoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity((input.len() + 4) / 5 * 4);
        for &b in input {
            if self.done {
                break;
            }
            if is_white_space(b) {
                continue;
            }

            if self.tilde {
                if b != b'>' {
                    return Err(FilterError::format(format!(
                        "expect '>' after '~', got {:#04x}",
                        b
                    )));
                }
                self.flush_tail(&mut out)?;
                self.done = true;
                continue;
            }

            match b {
                b'z' if self.len == 0 => out.extend_from_slice(&[0; 4]),
                b'z' => return Err(FilterError::format("'z' inside ascii85 group")),
                b'~' => self.tilde = true,
                _ => {
                    let d = sym_85(b).ok_or_else(|| {
                        FilterError::format(format!("invalid ascii85 char {:#04x}", b))
                    })?;
                    self.group[self.len] = d;
                    self.len += 1;
                    if self.len == 5 {
                        self.flush_group(&mut out)?;
                    }
                }
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        if self.done {
            Ok(vec![])
        } else {
            Err(FilterError::format("missing ascii85 terminator '~>'"))
        }
    }

    fn is_finished(&self) -> bool {
        self.done
    }
}

#[derive(Debug, Default)]
pub struct Ascii85Encoder {
    word: [u8; 4],
    len: usize,
}

impl Ascii85Encoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for Ascii85Encoder {
    fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity((self.len + input.len()) / 4 * 5);
        for &b in input {
            self.word[self.len] = b;
            self.len += 1;
            if self.len == 4 {
                if self.word == [0; 4] {
                    out.push(b'z');
                } else {
                    out.extend_from_slice(&group_85(self.word));
                }
                self.len = 0;
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(7);
        if self.len > 0 {
            self.word[self.len..].fill(0);
            out.extend_from_slice(&group_85(self.word)[..self.len + 1]);
            self.len = 0;
        }
        out.extend_from_slice(TERMINATOR);
        Ok(out)
    }
}
