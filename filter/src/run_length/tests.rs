use super::*;
use crate::chunk::{chunks_of, collect_chunks, CodecStream};
use test_case::test_case;

#[test_case(&[] => Vec::<u8>::new(); "empty")]
#[test_case(&[2, 1, 2, 3, 128] => vec![1, 2, 3]; "literal")]
#[test_case(&[254, 7, 128] => vec![7, 7, 7]; "repeat")]
#[test_case(&[0, 9, 255, 8, 128, 5, 5] => vec![9, 8, 8]; "data after eod ignored")]
#[test_case(&[1, 1, 2] => vec![1, 2]; "no eod")]
fn test_decode(data: &[u8]) -> Vec<u8> {
    RunLengthDecoder::new().run(data).unwrap()
}

#[test_case(&[2, 1, 2]; "literal")]
#[test_case(&[200]; "repeat")]
fn decode_truncated(data: &[u8]) {
    assert!(matches!(
        RunLengthDecoder::new().run(data),
        Err(FilterError::DataTruncated(_))
    ));
}

#[test_case(&[] => vec![128]; "empty")]
#[test_case(&[1, 2, 3] => vec![2, 1, 2, 3, 128]; "literal")]
#[test_case(&[7, 7, 7] => vec![254, 7, 128]; "repeat")]
#[test_case(&[1, 7, 7, 7, 2] => vec![0, 1, 254, 7, 0, 2, 128]; "mixed")]
fn test_encode(data: &[u8]) -> Vec<u8> {
    RunLengthEncoder::new().run(data).unwrap()
}

#[test]
fn encode_long_runs_split() {
    let data = vec![3u8; 300];
    let encoded = RunLengthEncoder::new().run(&data).unwrap();
    assert_eq!(vec![129, 3, 129, 3, 213, 3, 128], encoded);
}

#[test]
fn round_trip_chunked() {
    let data: Vec<u8> = (0..2000u32)
        .map(|i| if i % 300 < 150 { (i % 7) as u8 } else { 42 })
        .collect();
    for size in [1, 3, 17, 0] {
        let encoded =
            collect_chunks(CodecStream::new(chunks_of(&data, size), RunLengthEncoder::new()))
                .unwrap();
        let decoded = collect_chunks(CodecStream::new(
            chunks_of(&encoded, size),
            RunLengthDecoder::new(),
        ))
        .unwrap();
        assert_eq!(data, decoded, "chunk size {}", size);
    }
}
