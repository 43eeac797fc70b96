use super::*;
use crate::chunk::{chunks_of, collect_chunks, CodecStream};
use hex_literal::hex;
use test_case::test_case;

fn decode(data: &[u8]) -> Result<Vec<u8>> {
    AsciiHexDecoder::new().run(data)
}

#[test_case(b"" => b">".to_vec(); "empty")]
#[test_case(&hex!("00ff1a") => b"00ff1a>".to_vec(); "bytes")]
fn test_encode(data: &[u8]) -> Vec<u8> {
    AsciiHexEncoder.run(data).unwrap()
}

#[test_case(b">" => Vec::<u8>::new(); "empty")]
#[test_case(b"00ff1A>" => hex!("00ff1a").to_vec(); "mixed case")]
#[test_case(b" 0 0\nf\tf\r\n>" => hex!("00ff").to_vec(); "white spaces")]
#[test_case(b"123>" => hex!("1230").to_vec(); "odd digits padded at terminator")]
#[test_case(b"12>zz" => hex!("12").to_vec(); "data after terminator ignored")]
fn test_decode(data: &[u8]) -> Vec<u8> {
    decode(data).unwrap()
}

#[test]
fn decode_invalid_char() {
    assert!(matches!(decode(b"12g4>"), Err(FilterError::Format(_))));
}

#[test]
fn decode_missing_terminator() {
    assert!(matches!(decode(b"1234"), Err(FilterError::Format(_))));
}

#[test]
fn decode_dangling_nibble() {
    assert!(matches!(decode(b"123"), Err(FilterError::DataTruncated(_))));
}

#[test]
fn odd_digits_carried_across_chunks() {
    let chunks = CodecStream::new(chunks_of(b"123456>", 3), AsciiHexDecoder::new())
        .map(|c| c.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(vec![vec![0x12], vec![0x34, 0x56]], chunks);
}

#[test]
fn round_trip() {
    let data: Vec<u8> = (0..=255u8).rev().collect();
    let encoded = AsciiHexEncoder.run(&data).unwrap();
    for size in [1, 3, 17, 0] {
        let r = collect_chunks(CodecStream::new(
            chunks_of(&encoded, size),
            AsciiHexDecoder::new(),
        ))
        .unwrap();
        assert_eq!(data, r);
    }
}
