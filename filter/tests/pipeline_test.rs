use hex_literal::hex;
use itertools::Itertools;
use pdf_filter::{
    chunks_of, collect_chunks, FilterError, FilterName, FilterOptions, FilterParameters,
    Pipeline, Strictness,
};
use test_case::test_case;

fn options(chunk_size: usize) -> FilterOptions {
    FilterOptions {
        chunk_size,
        ..Default::default()
    }
}

/// Mixed text and binary data, long enough to reset the LZW table. Length
/// is a multiple of the 60 byte rows of `image_params`.
fn sample() -> Vec<u8> {
    let mut seed = 7u32;
    let noise = (0..6000).map(|_| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        (seed >> 16) as u8
    });
    b"BT /F1 12 Tf 72 712 Td (Hello, world) Tj ET\n"
        .iter()
        .copied()
        .cycle()
        .take(3000)
        .chain(noise)
        .chain(std::iter::repeat(0).take(600))
        .collect()
}

fn image_params(predictor: i32) -> FilterParameters {
    FilterParameters::default()
        .with_predictor(predictor)
        .with_colors(3)
        .with_columns(20)
}

fn pipelines() -> Vec<Pipeline> {
    let names: [&[(FilterName, FilterParameters)]; 6] = [
        &[(FilterName::Ascii85, FilterParameters::default())],
        &[(FilterName::AsciiHex, FilterParameters::default())],
        &[(FilterName::Lzw, FilterParameters::default())],
        &[
            (FilterName::Ascii85, FilterParameters::default()),
            (FilterName::Flate, image_params(15)),
        ],
        &[
            (FilterName::AsciiHex, FilterParameters::default()),
            (FilterName::Lzw, image_params(2).with_early_change(0)),
        ],
        &[
            (FilterName::RunLength, FilterParameters::default()),
            (FilterName::Flate, image_params(12)),
            (FilterName::Lzw, FilterParameters::default()),
        ],
    ];
    names
        .iter()
        .map(|filters| {
            filters
                .iter()
                .fold(Pipeline::new(options(0)), |p, (n, params)| p.push(*n, *params))
        })
        .collect()
}

#[test]
fn round_trip_any_chunk_size() {
    let data = sample();
    for p in pipelines() {
        let encoded = p.encode_bytes(&data).unwrap();
        for size in [1, 3, 17, 0] {
            let decoded = collect_chunks(p.decode(chunks_of(&encoded, size)).unwrap()).unwrap();
            assert_eq!(data, decoded, "{:?} chunk size {}", p.filters(), size);

            let reencoded = collect_chunks(p.encode(chunks_of(&data, size)).unwrap()).unwrap();
            assert_eq!(data, p.decode_bytes(&reencoded).unwrap());
        }
    }
}

#[test_case(FilterName::Ascii85 => b"~>".to_vec())]
#[test_case(FilterName::AsciiHex => b">".to_vec())]
#[test_case(FilterName::Lzw => hex!("80 40 40").to_vec())]
#[test_case(FilterName::RunLength => vec![128])]
fn encode_empty(name: FilterName) -> Vec<u8> {
    Pipeline::default()
        .push(name, FilterParameters::default())
        .encode_bytes(b"")
        .unwrap()
}

#[test_case(FilterName::Ascii85, b"Man ", b"9jqo^~>")]
#[test_case(FilterName::Ascii85, &[0; 4], b"z~>")]
#[test_case(FilterName::AsciiHex, &[0x01, 0xab], b"01ab>")]
#[test_case(FilterName::Lzw, b"-----A---B", &hex!("80 0B 60 50 22 0C 0C 85 01"))]
fn known_vectors(name: FilterName, plain: &[u8], encoded: &[u8]) {
    let p = Pipeline::new(options(1)).push(name, FilterParameters::default());
    assert_eq!(encoded, &p.encode_bytes(plain).unwrap()[..]);
    assert_eq!(plain, &p.decode_bytes(encoded).unwrap()[..]);
}

#[test]
fn lzw_code_width_boundaries() {
    // distinct pairs grow the table past 511, 1023 and 2047 entries
    let data = (0..=255u8)
        .cartesian_product(0..=255u8)
        .take(5000)
        .flat_map(|(a, b)| [a, b])
        .collect_vec();
    for early_change in [0, 1] {
        let p = Pipeline::new(options(5)).push(
            FilterName::Lzw,
            FilterParameters::default().with_early_change(early_change),
        );
        let encoded = p.encode_bytes(&data).unwrap();
        assert_eq!(data, p.decode_bytes(&encoded).unwrap());

        let mut weezl = if early_change == 1 {
            weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
        } else {
            weezl::encode::Encoder::new(weezl::BitOrder::Msb, 8)
        };
        let theirs = weezl.encode(&data).unwrap();
        assert_eq!(data, p.decode_bytes(&theirs).unwrap());
        assert_eq!(theirs, encoded);
    }
}

#[test]
fn png_sub_row() {
    let params = FilterParameters::default()
        .with_predictor(11)
        .with_columns(4);
    let compress = Pipeline::default().push(FilterName::Flate, FilterParameters::default());
    let p = Pipeline::default().push(FilterName::Flate, params);

    let encoded = compress.encode_bytes(&[1, 10, 10, 10, 10]).unwrap();
    assert_eq!(vec![10, 20, 30, 40], p.decode_bytes(&encoded).unwrap());
    assert_eq!(encoded, p.encode_bytes(&[10, 20, 30, 40]).unwrap());
}

#[test_log::test]
fn truncated_predictor_row() {
    let params = FilterParameters::default()
        .with_predictor(11)
        .with_columns(4);
    let encoded = Pipeline::default()
        .push(FilterName::Flate, FilterParameters::default())
        .encode_bytes(&[1, 1, 1, 1, 1, 1, 2, 2, 2])
        .unwrap();

    let strict = FilterOptions {
        strictness: Strictness::Strict,
        ..Default::default()
    };
    let r = Pipeline::new(strict)
        .push(FilterName::Flate, params)
        .decode_bytes(&encoded);
    assert!(matches!(r, Err(FilterError::DataTruncated(_))));

    let r = Pipeline::default()
        .push(FilterName::Flate, params)
        .decode_bytes(&encoded)
        .unwrap();
    assert_eq!(vec![1, 2, 3, 4, 2, 4, 6], r);
}

#[test]
fn data_after_eod_ignored() {
    let p = Pipeline::from_names([("AHx", None), ("A85", None)], options(2)).unwrap();
    assert_eq!(b"Man ".to_vec(), p.decode_bytes(b"39 6a 71 6f 5e 7e 3e > trailing").unwrap());
}

#[test_log::test]
fn corrupted_stream() {
    let p = Pipeline::default().push(FilterName::Ascii85, FilterParameters::default());
    assert!(matches!(
        p.decode_bytes(b"9jqo^v~>"),
        Err(e) if e.is_data_error()
    ));
}
