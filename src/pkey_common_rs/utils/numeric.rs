use crate::pkey_common_rs::key::core::bit_utils::BitField;
use crate::pkey_common_rs::key::core::exceptions::{PKeyError, PKeyResult, RangeError};

/// 16進 (`0x`) ・8進 (`0o`) ・2進 (`0b`) の接頭辞付き、または10進の数値文字列を解釈する
///
/// 先頭0だけの10進表記は8進として扱わない。
pub fn parse_hex_or_dec(input: &str) -> PKeyResult<u64> {
    let s = input.trim().replace('_', "");
    let lower = s.to_ascii_lowercase();

    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    if digits.is_empty() {
        return Err(PKeyError::Config(format!("数値が空です: '{}'", input)));
    }

    u64::from_str_radix(digits, radix)
        .map_err(|e| PKeyError::Config(format!("数値を解釈できません: '{}' ({})", input, e)))
}

/// 数値文字列を解釈し、フィールドの整数型に変換する
///
/// 型に収まらない値は、そのフィールド名の RangeError になる。
/// 型に収まってもフィールド幅を超える値はパック時に検出される。
pub fn parse_field_value<T: TryFrom<u64>>(field: &BitField, input: &str) -> PKeyResult<T> {
    let value = parse_hex_or_dec(input)?;
    T::try_from(value).map_err(|_| {
        RangeError::field_out_of_range(&field.name, value as u128, field.max_value()).into()
    })
}
