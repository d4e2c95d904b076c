//! Numeric field conversions
//!
//! Both parsers accept the forms the tracker vendor's reference tooling
//! accepts: surrounding whitespace, an optional sign, and for hex an optional
//! `0x` prefix. Values are `i128`; anything else, including overflow, is
//! `None`.

/// ADC full-scale reference voltage of the external battery input.
pub const BATTERY_REFERENCE_VOLTS: f64 = 6.0;
/// ADC resolution of the external battery input.
pub const BATTERY_ADC_STEPS: f64 = 1024.0;
/// Factor applied to the odometer field to obtain kilometres.
pub const MILEAGE_FACTOR: f64 = 1.60934;

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn is_valid_digits(digits: &str, radix: u32) -> bool {
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))
}

/// Parse a base-16 integer such as `"FF"`, `"0x1a"` or `" -f "`.
pub fn parse_hex(text: &str) -> Option<i128> {
    let (negative, rest) = split_sign(text.trim());
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);
    if !is_valid_digits(digits, 16) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, 16).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a base-10 integer such as `"1000"` or `" +42 "`.
pub fn parse_decimal(text: &str) -> Option<i128> {
    let (negative, digits) = split_sign(text.trim());
    if !is_valid_digits(digits, 10) {
        return None;
    }
    let magnitude: i128 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Battery voltage for a raw analog reading.
pub fn battery_voltage(analog: i128) -> f64 {
    analog as f64 * BATTERY_REFERENCE_VOLTS / BATTERY_ADC_STEPS
}

/// Total mileage in km for a raw odometer reading.
pub fn total_mileage(odometer: i128) -> f64 {
    odometer as f64 * MILEAGE_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_accepts_reference_forms() {
        assert_eq!(parse_hex("FF"), Some(255));
        assert_eq!(parse_hex("ff"), Some(255));
        assert_eq!(parse_hex("0x1A"), Some(26));
        assert_eq!(parse_hex("0X1a"), Some(26));
        assert_eq!(parse_hex(" 10 "), Some(16));
        assert_eq!(parse_hex("-f"), Some(-15));
        assert_eq!(parse_hex("+f"), Some(15));
        assert_eq!(parse_hex("000"), Some(0));
    }

    #[test]
    fn hex_rejects_garbage() {
        for text in ["ZZ", "", " ", "0x", "--1", "+-1", "1 2", "0x0x1", "F\u{FFFD}"] {
            assert_eq!(parse_hex(text), None, "{text:?}");
        }
    }

    #[test]
    fn decimal_accepts_reference_forms() {
        assert_eq!(parse_decimal("1000"), Some(1000));
        assert_eq!(parse_decimal(" 42\t"), Some(42));
        assert_eq!(parse_decimal("-7"), Some(-7));
        assert_eq!(parse_decimal("+7"), Some(7));
    }

    #[test]
    fn decimal_rejects_garbage() {
        for text in ["", "1.5", "1e3", "0x10", "ten", "--1", "1_000"] {
            assert_eq!(parse_decimal(text), None, "{text:?}");
        }
    }

    #[test]
    fn wide_values_parse() {
        assert_eq!(parse_hex("FFFFFFFFFFFFFFFFF"), Some(0x1_FFFF_FFFF_FFFF_FFFF));
        assert_eq!(parse_decimal("99999999999999999999"), Some(99_999_999_999_999_999_999));
        assert_eq!(parse_decimal(&i128::MAX.to_string()), Some(i128::MAX));
        assert_eq!(parse_hex(&"F".repeat(40)), None);
    }

    #[test]
    fn battery_voltage_scales_reading() {
        assert_eq!(battery_voltage(255), 1.494140625);
        assert_eq!(battery_voltage(1024), 6.0);
        assert_eq!(battery_voltage(0), 0.0);
    }

    #[test]
    fn mileage_scales_odometer() {
        assert!((total_mileage(1000) - 1609.34).abs() < 1e-9);
        assert_eq!(total_mileage(0), 0.0);
        assert_eq!(total_mileage(99_999_999_999_999_999_999), 1.60934e20);
        assert_eq!(battery_voltage(0x1_FFFF_FFFF_FFFF_FFFF), 1.7293822569102705e18);
    }

    proptest! {
        #[test]
        fn hex_matches_formatted_value(value in 0i128..i128::MAX) {
            prop_assert_eq!(parse_hex(&format!("{value:X}")), Some(value));
            prop_assert_eq!(parse_hex(&format!("0x{value:x}")), Some(value));
        }

        #[test]
        fn decimal_matches_formatted_value(value in (i128::MIN + 1)..i128::MAX) {
            prop_assert_eq!(parse_decimal(&value.to_string()), Some(value));
        }

        #[test]
        fn parsers_never_panic(text in "\\PC{0,24}") {
            let _ = parse_hex(&text);
            let _ = parse_decimal(&text);
        }
    }
}
