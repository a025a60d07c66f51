use crate::Decimal128;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Builds a value from its high and low 64-bit words.
fn dec(high: u64, low: u64) -> Decimal128 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&low.to_le_bytes());
    bytes[8..].copy_from_slice(&high.to_le_bytes());
    Decimal128::from_bytes(bytes)
}

fn parse(text: &str) -> Decimal128 {
    Decimal128::parse_str(text).unwrap_or_else(|e| panic!("{text:?} failed to parse: {e}"))
}

#[test]
fn rejects_non_numeric_text() {
    let invalid = [
        "E02",
        "E+02",
        "e+02",
        ".",
        ".e",
        "",
        "invalid",
        "in",
        "i",
        "..1",
        "1abcede",
        "1.24abc",
        "1.24abcE+02",
        "1.24E+02abc2d",
        "1.2.3",
        "1..2",
        "-1.2.",
        "1.5x",
    ];
    for text in invalid {
        let err = Decimal128::parse_str(text).expect_err(text);
        assert!(err.is_decimal128_unparseable(), "{text:?}: {err}");
    }
}

#[test]
fn nan_and_infinity() {
    for text in [
        "NaN", "+NaN", "-NaN", "-nan", "1e", "+nan", "nan", "Nan", "+Nan", "-Nan",
    ] {
        assert_eq!(parse(text), Decimal128::NAN, "{text:?}");
    }
    for text in ["Infinity", "+Infinity", "+Inf"] {
        assert_eq!(parse(text), Decimal128::INFINITY, "{text:?}");
    }
    for text in ["-Inf", "-Infinity"] {
        assert_eq!(parse(text), Decimal128::NEG_INFINITY, "{text:?}");
    }

    assert!(Decimal128::NAN.is_nan());
    assert!(!Decimal128::NAN.is_infinite());
    assert!(Decimal128::NEG_INFINITY.is_infinite());
    assert!(!parse("1").is_nan());
}

#[test]
fn simple_values() {
    let cases = [
        ("1", 0x3040_0000_0000_0000, 0x1),
        ("0", 0x3040_0000_0000_0000, 0x0),
        ("-0", 0xb040_0000_0000_0000, 0x0),
        ("-1", 0xb040_0000_0000_0000, 0x1),
        ("12345678901234567", 0x3040_0000_0000_0000, 0x002b_dc54_5d6b_4b87),
        ("989898983458", 0x3040_0000_0000_0000, 0x0000_00e6_7a93_c822),
        ("0.12345", 0x3036_0000_0000_0000, 0x3039),
        ("0.0012345", 0x3032_0000_0000_0000, 0x3039),
        ("00012345678901234567", 0x3040_0000_0000_0000, 0x002b_dc54_5d6b_4b87),
    ];
    for (text, high, low) in cases {
        assert_eq!(parse(text), dec(high, low), "{text:?}");
    }
}

#[test]
fn scientific_notation() {
    let cases = [
        ("10e0", 0x3040_0000_0000_0000, 0x0a),
        ("1e1", 0x3042_0000_0000_0000, 0x01),
        ("10e-1", 0x303e_0000_0000_0000, 0x0a),
        ("12345678901234567e6111", 0x5ffe_0000_0000_0000, 0x002b_dc54_5d6b_4b87),
        ("1e-6176", 0x0, 0x1),
        ("-100E-10", 0xb02c_0000_0000_0000, 0x64),
        ("10.50E8", 0x304c_0000_0000_0000, 0x041a),
    ];
    for (text, high, low) in cases {
        assert_eq!(parse(text), dec(high, low), "{text:?}");
    }
}

#[test]
fn large_significands() {
    assert_eq!(
        parse("1234567890123456789012345678901234"),
        dec(0x3040_3cde_6fff_9732, 0xde82_5cd0_7e96_aff2)
    );
    assert_eq!(
        parse("9.999999999999999999999999999999999E+6144"),
        dec(0x5fff_ed09_bead_87c0, 0x378d_8e63_ffff_ffff)
    );
    assert_eq!(
        parse("5.192296858534827628530496329220095E+33"),
        dec(0x3040_ffff_ffff_ffff, 0xffff_ffff_ffff_ffff)
    );
}

#[test]
fn clamps_and_zeros() {
    assert_eq!(
        parse("10000000000000000000000000000000000"),
        dec(0x3042_314d_c644_8d93, 0x38c1_5b0a_0000_0000)
    );
    assert_eq!(parse("1E-6177"), dec(0, 0));
    assert_eq!(parse("0e-611"), dec(0x2b7a_0000_0000_0000, 0));
    assert_eq!(parse("0e+6000"), dec(0x5f20_0000_0000_0000, 0));
    assert_eq!(parse("-0e-1"), dec(0xb03e_0000_0000_0000, 0));
}

#[test]
fn rounds_half_to_even() {
    assert_eq!(parse("15E-6177"), dec(0, 0x02));
    assert_eq!(parse("251E-6178"), dec(0, 0x03));
    assert_eq!(parse("250E-6178"), dec(0, 0x02));

    let high = 0x3042_314d_c644_8d93;
    assert_eq!(
        parse("10000000000000000000000000000000006"),
        dec(high, 0x38c1_5b0a_0000_0001)
    );
    assert_eq!(
        parse("10000000000000000000000000000000003"),
        dec(high, 0x38c1_5b0a_0000_0000)
    );
    assert_eq!(
        parse("10000000000000000000000000000000005"),
        dec(high, 0x38c1_5b0a_0000_0000)
    );
}

#[test]
fn overflow_becomes_infinity() {
    assert_eq!(
        parse("10000000000000000000000000000000006E6111"),
        Decimal128::INFINITY
    );
    assert_eq!(
        parse("99999999999999999999999999999999999E6144"),
        Decimal128::INFINITY
    );
}

#[test]
fn to_string() {
    let cases = [
        (0x7800_0000_0000_0000, 0x0, "Infinity"),
        (0xf800_0000_0000_0000, 0x0, "-Infinity"),
        (0x7c00_0000_0000_0000, 0x0, "NaN"),
        (0xfc00_0000_0000_0000, 0x0, "NaN"),
        (0x7e00_0000_0000_0000, 0x0, "NaN"),
        (0xfe00_0000_0000_0000, 0x0, "NaN"),
        (0x3040_0000_0000_0000, 0x1, "1"),
        (0xb040_0000_0000_0000, 0x0, "-0"),
        (0x303e_0000_0000_0000, 0x1, "0.1"),
        (0x3034_0000_0000_0000, 0x04d2, "0.001234"),
        (0x302a_0000_0000_0000, 0x075a_ef40, "0.00123400000"),
        (
            0x5ffe_314d_c644_8d93,
            0x38c1_5b0a_0000_0000,
            "1.000000000000000000000000000000000E+6144",
        ),
        (0x0, 0x1, "1E-6176"),
        (0x8000_0000_0000_0000, 0x1, "-1E-6176"),
        (0x304c_0000_0000_0000, 0x041a, "1.050E+9"),
        (0x3042_0000_0000_0000, 0x041a, "1.050E+4"),
        (0x3040_0000_0000_0000, 0x69, "105"),
        (0x3042_0000_0000_0000, 0x69, "1.05E+3"),
        (0x3046_0000_0000_0000, 0x1, "1E+3"),
        (0x3298_0000_0000_0000, 0x0, "0E+300"),
        (0x2b90_0000_0000_0000, 0x0, "0E-600"),
    ];
    for (high, low, expected) in cases {
        assert_eq!(dec(high, low).to_string(), expected);
    }
}

#[test]
fn keeps_trailing_zeros() {
    for text in ["1.0", "0.00123400000", "1.050E+9", "-0"] {
        assert_eq!(parse(text).to_string(), text);
    }
    assert_eq!(format!("{:?}", parse("1.5")), "Decimal128(1.5)");
}

#[test]
fn from_slice_checks_length() {
    let one = parse("1");
    assert_eq!(Decimal128::from_slice(&one.bytes()).unwrap(), one);
    assert!(Decimal128::from_slice(&[0u8; 15]).is_err());
}

#[test]
fn sign_does_not_shift_digits() {
    assert_eq!(parse("-0.0012E3"), dec(0xb03e_0000_0000_0000, 0x0c));
    assert_eq!(parse("-0.0012E3").to_string(), "-1.2");
    assert_eq!(parse("+1200E-3").to_string(), "1.200");
}

/// Decimal text with at most 34 digits and an exponent that needs no clamping.
fn exact_decimal_text() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        "[1-9][0-9]{0,33}",
        any::<prop::sample::Index>(),
        any::<bool>(),
        -6000i32..=6000,
    )
        .prop_map(|(negative, digits, radix, with_radix, exponent)| {
            let sign = if negative { "-" } else { "" };
            let mantissa = if with_radix {
                let (int, frac) = digits.split_at(radix.index(digits.len()) + 1);
                format!("{int}.{frac}")
            } else {
                digits
            };
            format!("{sign}{mantissa}E{exponent}")
        })
}

proptest! {
    #[test]
    fn text_reparses_to_the_same_bits(text in exact_decimal_text()) {
        let value = Decimal128::parse_str(&text).unwrap();
        prop_assert!(!value.is_nan() && !value.is_infinite(), "{}", text);

        let printed = value.to_string();
        let reparsed = Decimal128::parse_str(&printed).unwrap();
        prop_assert_eq!(reparsed.bytes(), value.bytes(), "{} printed as {}", text, printed);
    }
}
