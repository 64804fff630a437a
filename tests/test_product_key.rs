use pkey_rust::pkey_common_rs::key::core::base24::marker_position;
use pkey_rust::pkey_common_rs::key::core::exceptions::{ChecksumError, FormatError, PKeyError};
use pkey_rust::pkey_common_rs::key::types::{
    ChecksumSpec, KeyCodec, KeyFields, PackedKey, PresentationKey, EXTRA_KEY_CEILING,
};

const MAX_GROUP: u32 = 0xFFFFF;
const MAX_SERIAL: u32 = 0x3FFFFFFF;
const MAX_SECURITY: u64 = 0x1FFFFFFFFFFFFF;

fn encode(group: u32, serial: u32, security: u64, upgrade: u8, extra: u8) -> String {
    KeyCodec::encode(group, serial, security, upgrade, extra, ChecksumSpec::Auto)
        .unwrap()
        .key5x5
        .to_string()
}

#[test]
fn test_encode_known_keys() {
    let cases = [
        ((0, 0, 0, 0, 0), "M3NC8-DKFTQ-XB2YK-VYY46-GMKDY"),
        ((1, 0, 0, 0, 0), "94KN8-4BDRG-7TMVD-YDMGR-Q9DYC"),
        ((MAX_GROUP, MAX_SERIAL, MAX_SECURITY, 0, 0), "X9BND-78JPD-MK3YM-BY3YD-DVXDX"),
        ((0x12345, 0x6789A, 0xBCDEF0123, 0, 0), "YP7GN-B7DPP-P7MR2-6G2YY-63QMH"),
        ((2085, 62_000_000, 0, 0, 0), "PX6BN-KTQ83-Y67R7-TWQ4M-CWC6H"),
        ((703710, 12345678, 320255973460668, 1, 0), "4CB7P-RWWPB-JNXB2-3T4J8-BMH2J"),
        ((1, 2, 3, 0, 1), "6D2QD-MYTHF-VX8JT-H9NXC-MPRVP"),
        ((MAX_GROUP, MAX_SERIAL, MAX_SECURITY, 1, 0), "QXFCH-MXBYW-X6KPH-NXHRQ-GFVK9"),
        ((MAX_GROUP, MAX_SERIAL, MAX_SECURITY, 0, 1), "FCKF3-HHF9W-8C7J8-4NCPQ-3M7K9"),
        ((0, 0, MAX_SECURITY, 1, 0), "7H2QV-HHNVP-V8HCM-GK8YP-RVMBB"),
    ];

    for ((g, s, sec, u, e), expected) in cases {
        assert_eq!(encode(g, s, sec, u, e), expected, "{:?}", (g, s, sec, u, e));
    }
}

#[test]
fn test_both_flags_with_zero_checksum() {
    // 自動チェックサム (0x291) では上限を超えるが、0 を指定すれば収まる
    let key = KeyCodec::encode(0, 0, 0, 1, 1, ChecksumSpec::Fixed(0)).unwrap();
    assert_eq!(key.key5x5.as_str(), "MWM8V-J3VGD-RFH4W-TK6V4-6QYNB");
    assert_eq!(key.packed.value(), 0x60000000000000000000000000000);

    let decoded = KeyCodec::decode("MWM8V-J3VGD-RFH4W-TK6V4-6QYNB").unwrap();
    assert_eq!(decoded.fields, KeyFields::new(0, 0, 0, 0, 1, 1));
}

#[test]
fn test_encode_reports_packed_and_checksum() {
    let key = KeyCodec::encode(0x12345, 0x6789A, 0xBCDEF0123, 0, 0, ChecksumSpec::Auto).unwrap();
    assert_eq!(key.packed.value(), 0x13400002f37bc048c006789a12345);
    assert_eq!(key.fields.checksum, 0x268);
    assert!(key.checksum_is_valid());
}

#[test]
fn test_decode_recovers_fields() {
    let key = KeyCodec::decode("4CB7P-RWWPB-JNXB2-3T4J8-BMH2J").unwrap();
    assert_eq!(
        key.fields,
        KeyFields::new(703710, 12345678, 320255973460668, 0x20F, 1, 0)
    );
    assert_eq!(key.packed.value(), 0x307848d159e242af00bc614eabcde);
    assert!(key.verify_checksum().is_ok());
}

#[test]
fn test_round_trip_grid() {
    let groups = [0, 1, 2085, 0x80000, MAX_GROUP];
    let serials = [0, 1, 62_000_000, 0x20000000, MAX_SERIAL];
    let securities = [0, 3, 0xBCDEF0123, 1 << 52, MAX_SECURITY];

    for &g in &groups {
        for &s in &serials {
            for &sec in &securities {
                for (u, e) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let encoded = match KeyCodec::encode(g, s, sec, u, e, ChecksumSpec::Auto) {
                        Ok(k) => k,
                        Err(PKeyError::Unencodable(err)) => {
                            assert_eq!(e, 1);
                            assert!(err.key >= EXTRA_KEY_CEILING);
                            continue;
                        }
                        Err(err) => panic!("unexpected error: {}", err),
                    };
                    let decoded = KeyCodec::decode_verified(encoded.key5x5.as_str()).unwrap();
                    assert_eq!(decoded, encoded);
                }
            }
        }
    }
}

#[test]
fn test_random_keys_keep_marker_inside_body() {
    let mut rng = fastrand::Rng::with_seed(20240401);
    for _ in 0..2000 {
        let fields = KeyFields::new(
            rng.u32(..=MAX_GROUP),
            rng.u32(..=MAX_SERIAL),
            rng.u64(..=MAX_SECURITY),
            0,
            rng.u8(..=1),
            rng.u8(..=1),
        );
        let key = match KeyCodec::encode_fields(&fields, ChecksumSpec::Auto) {
            Ok(k) => k,
            Err(PKeyError::Unencodable(_)) => continue,
            Err(err) => panic!("unexpected error: {}", err),
        };

        let text = key.key5x5.as_str();
        assert_eq!(text.matches('N').count(), 1, "{}", text);
        let pos = marker_position(text).unwrap();
        assert!(pos <= 23, "{}", text);
        if fields.extra == 0 {
            assert!(pos <= 15, "{}", text);
        }
        assert_eq!(KeyCodec::decode(text).unwrap().fields, key.fields);
    }
}

#[test]
fn test_fixed_checksum_is_embedded_verbatim() {
    let key = KeyCodec::encode(1, 2, 3, 0, 0, ChecksumSpec::Fixed(0x123)).unwrap();
    assert_eq!(key.key5x5.as_str(), "HDNRY-G3V2C-CXMT3-YQT6F-4XY7P");
    assert_eq!(key.fields.checksum, 0x123);
    assert!(!key.checksum_is_valid());

    // 検証なしのデコードは成功する
    let decoded = KeyCodec::decode("HDNRY-G3V2C-CXMT3-YQT6F-4XY7P").unwrap();
    assert_eq!(decoded.fields.checksum, 0x123);

    let err = KeyCodec::decode_verified("HDNRY-G3V2C-CXMT3-YQT6F-4XY7P").unwrap_err();
    assert!(matches!(
        err,
        PKeyError::Checksum(ChecksumError::Mismatch { expected: 0x083, actual: 0x123 })
    ));
}

#[test]
fn test_checksum_spec_from_raw() {
    assert_eq!(ChecksumSpec::from_raw(0x400).unwrap(), ChecksumSpec::Auto);
    assert_eq!(ChecksumSpec::from_raw(0).unwrap(), ChecksumSpec::Fixed(0));
    assert_eq!(ChecksumSpec::from_raw(0x3FF).unwrap(), ChecksumSpec::Fixed(0x3FF));
    assert!(ChecksumSpec::from_raw(0x401).is_err());
}

#[test]
fn test_extra_keys_above_ceiling_are_unencodable() {
    let cases = [
        (0, 0, MAX_SECURITY, 1, 1, ChecksumSpec::Auto),
        (MAX_GROUP, MAX_SERIAL, MAX_SECURITY, 1, 1, ChecksumSpec::Auto),
        (0, 0, 0, 1, 1, ChecksumSpec::Fixed(0x3FF)),
        (0, 0, 0, 1, 1, ChecksumSpec::Auto),
    ];
    for (g, s, sec, u, e, checksum) in cases {
        let err = KeyCodec::encode(g, s, sec, u, e, checksum).unwrap_err();
        assert!(matches!(err, PKeyError::Unencodable(_)), "{:?}", err);
    }
}

#[test]
fn test_extra_ceiling_boundary() {
    // 上限値そのものは25桁の24進数に収まらない
    let at = PackedKey::from_raw(EXTRA_KEY_CEILING).unwrap().unpack();
    assert_eq!(at, KeyFields::new(0, 0, 0xCAC5546000000, 0x54, 1, 1));
    let err = KeyCodec::encode_fields(&at, ChecksumSpec::Fixed(at.checksum)).unwrap_err();
    match err {
        PKeyError::Unencodable(e) => assert_eq!(e.key, EXTRA_KEY_CEILING),
        other => panic!("expected unencodable, got {:?}", other),
    }

    let below = PackedKey::from_raw(EXTRA_KEY_CEILING - 1).unwrap().unpack();
    assert_eq!(below, KeyFields::new(MAX_GROUP, MAX_SERIAL, 0xCAC5545FFFFFF, 0x54, 1, 1));
    let key = KeyCodec::encode_fields(&below, ChecksumSpec::Fixed(below.checksum)).unwrap();
    assert_eq!(key.packed.value(), EXTRA_KEY_CEILING - 1);
    assert_eq!(key.key5x5.as_str(), "99999-99999-99999-99999-999N9");
    assert_eq!(KeyCodec::decode(key.key5x5.as_str()).unwrap().packed, key.packed);
}

#[test]
fn test_concurrent_encode_decode() {
    let cases: Vec<(u32, u32, u64)> = (0..8u32)
        .map(|i| (i * 0x1111, i * 0x0BAD_F00D % MAX_SERIAL, (i as u64) << 40))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = cases
            .iter()
            .map(|&(g, s, sec)| {
                scope.spawn(move || {
                    (0..200)
                        .map(|n| {
                            let key = KeyCodec::encode(g, s, sec + n, 0, 0, ChecksumSpec::Auto).unwrap();
                            let decoded = KeyCodec::decode_verified(key.key5x5.as_str()).unwrap();
                            assert_eq!(decoded, key);
                            key.key5x5.to_string()
                        })
                        .last()
                })
            })
            .collect();

        for (handle, &(g, s, sec)) in handles.into_iter().zip(&cases) {
            let last = handle.join().unwrap().unwrap();
            assert_eq!(last, encode(g, s, sec + 199, 0, 0));
        }
    });
}

#[test]
fn test_ceiling_keys_without_extra_are_encodable() {
    // extra が0なら上限チェックは行われない
    assert!(KeyCodec::encode(0, 0, MAX_SECURITY, 1, 0, ChecksumSpec::Auto).is_ok());
}

#[test]
fn test_out_of_range_fields() {
    let cases = [
        (KeyFields::new(MAX_GROUP + 1, 0, 0, 0, 0, 0), "group"),
        (KeyFields::new(0, MAX_SERIAL + 1, 0, 0, 0, 0), "serial"),
        (KeyFields::new(0, 0, MAX_SECURITY + 1, 0, 0, 0), "security"),
        (KeyFields::new(0, 0, 0, 0, 2, 0), "upgrade"),
        (KeyFields::new(0, 0, 0, 0, 0, 2), "extra"),
    ];
    for (fields, name) in cases {
        match KeyCodec::encode_fields(&fields, ChecksumSpec::Auto) {
            Err(PKeyError::Range(err)) => assert_eq!(err.field, name),
            other => panic!("{}: expected range error, got {:?}", name, other),
        }
    }
    assert!(KeyFields::new(0, 0, 0, 0x400, 0, 0).pack().is_err());
}

#[test]
fn test_decode_format_errors_surface() {
    let err = KeyCodec::decode("BBBBB-BBBBB-BBBBB-BBBBB-BBBBB").unwrap_err();
    assert!(matches!(err, PKeyError::Format(FormatError::MissingMarker)));

    let err = KeyCodec::decode("NBBBB-BBBBB").unwrap_err();
    assert!(matches!(err, PKeyError::Format(FormatError::InvalidLength { .. })));
}

#[test]
fn test_decode_marker_last_sets_extra() {
    let key = KeyCodec::decode("BBBBB-BBBBB-BBBBB-BBBBB-BBBBN").unwrap();
    assert_eq!(key.packed.value(), EXTRA_KEY_CEILING);
    assert_eq!(key.fields.extra, 1);
    assert_eq!(key.fields.upgrade, 1);
    assert_eq!(key.fields.checksum, 0x54);
    assert!(!key.checksum_is_valid());
}

#[test]
fn test_presentation_key_normalizes_grouping() {
    let key: PresentationKey = "M3NC8DKFTQXB2YKVYY46GMKDY".parse().unwrap();
    assert_eq!(key.as_str(), "M3NC8-DKFTQ-XB2YK-VYY46-GMKDY");
    assert_eq!(key.to_packed().value(), 0x9b80000000000000000000000000);
}

#[test]
fn test_packed_key_bounds() {
    assert!(PackedKey::from_raw((1u128 << 115) - 1).is_ok());
    assert!(PackedKey::from_raw(1u128 << 115).is_err());
    let packed = PackedKey::from_raw(0x9b80000000000000000000000000).unwrap();
    assert_eq!(packed.to_string(), "00009b80000000000000000000000000");
    assert_eq!(packed.unpack().checksum, 0x137);
}
