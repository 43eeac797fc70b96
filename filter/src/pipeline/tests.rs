use super::*;
use test_case::test_case;

#[test_case("ASCIIHexDecode" => FilterName::AsciiHex)]
#[test_case("AHx" => FilterName::AsciiHex)]
#[test_case("ASCII85Decode" => FilterName::Ascii85)]
#[test_case("A85" => FilterName::Ascii85)]
#[test_case("LZWDecode" => FilterName::Lzw)]
#[test_case("LZW" => FilterName::Lzw)]
#[test_case("FlateDecode" => FilterName::Flate)]
#[test_case("Fl" => FilterName::Flate)]
#[test_case("RunLengthDecode" => FilterName::RunLength)]
#[test_case("RL" => FilterName::RunLength)]
fn parse_filter_name(name: &str) -> FilterName {
    FilterName::parse(name).unwrap()
}

#[test]
fn filter_name_display() {
    assert_eq!("ASCII85Decode", FilterName::Ascii85.to_string());
    assert_eq!("FlateDecode", FilterName::Flate.to_string());
}

#[test]
fn unknown_filter() {
    match FilterName::parse("DCTDecode") {
        Err(FilterError::UnknownFilter(name)) => assert_eq!("DCTDecode", name),
        r => panic!("unexpected {:?}", r),
    }
    assert!(Pipeline::from_names([("Foo", None)], FilterOptions::default()).is_err());
}

#[test]
fn empty_pipeline_passes_through() {
    let p = Pipeline::default();
    assert!(p.is_empty());
    assert_eq!(vec![1, 2, 3], p.decode_bytes(&[1, 2, 3]).unwrap());
    assert_eq!(vec![1, 2, 3], p.encode_bytes(&[1, 2, 3]).unwrap());
}

#[test]
fn decode_in_filter_order() {
    // hex text of the ascii85 text of "Man "
    let p = Pipeline::from_names(
        [("AHx", None), ("A85", None)],
        FilterOptions::default(),
    )
    .unwrap();
    assert_eq!(b"Man ".to_vec(), p.decode_bytes(b"396a716f5e7e3e>").unwrap());
    assert_eq!(b"396a716f5e7e3e>".to_vec(), p.encode_bytes(b"Man ").unwrap());
}

#[test]
fn predictor_is_innermost_decode_step() {
    let params = FilterParameters::default()
        .with_predictor(11)
        .with_columns(4);
    let p = Pipeline::new(FilterOptions::default()).push(FilterName::Flate, params);
    let encoded = p.encode_bytes(&[10, 20, 30, 40]).unwrap();

    // without parameters only inflated, predictor tags stay
    let plain = Pipeline::new(FilterOptions::default())
        .push(FilterName::Flate, FilterParameters::default());
    assert_eq!(vec![1, 10, 10, 10, 10], plain.decode_bytes(&encoded).unwrap());
    assert_eq!(vec![10, 20, 30, 40], p.decode_bytes(&encoded).unwrap());
}

#[test]
fn predictor_ignored_by_text_filters() {
    let params = FilterParameters::default().with_predictor(12);
    let p = Pipeline::new(FilterOptions::default()).push(FilterName::AsciiHex, params);
    assert_eq!(vec![1, 2], p.decode_bytes(b"0102>").unwrap());
}

#[test]
fn unsupported_predictor() {
    let params = FilterParameters::default().with_predictor(7);
    assert!(matches!(
        decoder(FilterName::Lzw, &params, &FilterOptions::default()),
        Err(FilterError::UnsupportedPredictor(7))
    ));
    assert!(matches!(
        encoder(FilterName::Flate, &params),
        Err(FilterError::UnsupportedPredictor(7))
    ));
}

#[test]
fn oversized_predictor_row() {
    let params = FilterParameters::default()
        .with_predictor(12)
        .with_columns(i32::MAX)
        .with_colors(i32::MAX)
        .with_bits_per_component(16);
    let p = Pipeline::default().push(FilterName::Flate, params);
    assert!(matches!(
        p.decode_bytes(&[]),
        Err(FilterError::InvalidParameter { .. })
    ));
}

#[test_log::test]
fn decode_error_reported_in_pull() {
    let p = Pipeline::new(FilterOptions {
        chunk_size: 2,
        ..Default::default()
    })
    .push(FilterName::AsciiHex, FilterParameters::default());
    let mut chunks = p.decode(chunks_of(b"0102zz>", 2)).unwrap();
    assert_eq!(vec![1], chunks.next().unwrap().unwrap());
    assert_eq!(vec![2], chunks.next().unwrap().unwrap());
    assert!(matches!(chunks.next(), Some(Err(FilterError::Format(_)))));
    assert!(chunks.next().is_none());
}
