//! 5x5 キー文字列と整数の相互変換
//!
//! キー整数を25桁の24進数として扱い、最上位桁はマーカー文字 `N` の挿入位置で、
//! 残り24桁はアルファベットの文字で表す。

use super::exceptions::FormatError;

/// 24進数の各桁を表す文字（紛らわしい字形を除いた24文字）
pub const ALPHABET: &str = "BCDFGHJKMPQRTVWXY2346789";

/// 最上位桁を位置で表すマーカー文字
pub const MARKER: char = 'N';

/// ハイフンを除いたキーの文字数
pub const KEY_CHARS: usize = 25;

/// 1ブロックの文字数
pub const BLOCK_CHARS: usize = 5;

/// ハイフン区切りのキー長
pub const GROUPED_KEY_CHARS: usize = KEY_CHARS + KEY_CHARS / BLOCK_CHARS - 1;

/// 25桁の24進数で表せる値の上限（この値自体は表せない）
pub const BASE24_CAPACITY: u128 = 24u128.pow(KEY_CHARS as u32);

const BASE: u128 = 24;

/// キー整数を25桁の24進数に分解する（最上位桁が先頭）
///
/// `BASE24_CAPACITY` 以上の値は 24^25 を法として切り捨てられる。
pub fn to_digits(value: u128) -> [u8; KEY_CHARS] {
    let mut digits = [0u8; KEY_CHARS];
    let mut rest = value;

    for digit in digits.iter_mut().rev() {
        *digit = (rest % BASE) as u8;
        rest /= BASE;
    }

    digits
}

/// 25桁の24進数をホーナー法で整数に畳み込む
///
/// 先頭桁のみ 24（マーカーが末尾にある場合）を取り得る。
pub fn from_digits(digits: &[u8; KEY_CHARS]) -> u128 {
    digits
        .iter()
        .fold(0u128, |acc, &digit| acc * BASE + digit as u128)
}

/// 25文字を5文字ずつハイフンで区切る
pub fn format_blocks(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(BLOCK_CHARS)
        .map(|block| block.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// キー整数を5x5形式の文字列に変換する
///
/// Args:
///     value: キー整数（`BASE24_CAPACITY` 未満）
///
/// Returns:
///     `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` 形式の文字列
pub fn encode_5x5(value: u128) -> String {
    if value >= BASE24_CAPACITY {
        log::warn!("キー整数 0x{:x} は25桁の24進数に収まりません", value);
    }

    let digits = to_digits(value);
    let alphabet = ALPHABET.as_bytes();

    let mut content: Vec<char> = digits[1..]
        .iter()
        .map(|&digit| alphabet[digit as usize] as char)
        .collect();

    let marker_pos = (digits[0] as usize).min(content.len());
    content.insert(marker_pos, MARKER);

    format_blocks(&content.into_iter().collect::<String>())
}

/// 5x5形式の文字列からハイフンを取り除き、25文字の内容と元の位置を返す
fn strip_grouping(key: &str) -> Result<Vec<(usize, char)>, FormatError> {
    let chars: Vec<char> = key.chars().collect();

    let content: Vec<(usize, char)> = chars
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, c)| c != '-')
        .map(|(i, c)| (i + 1, c))
        .collect();

    if content.len() != KEY_CHARS {
        return Err(FormatError::InvalidLength {
            expected: KEY_CHARS,
            actual: content.len(),
        });
    }

    // ハイフンを使う場合は4箇所のブロック境界すべてに必要
    if content.len() != chars.len() {
        let boundary = BLOCK_CHARS + 1;
        if let Some(pos) = chars
            .iter()
            .enumerate()
            .position(|(i, &c)| (c == '-') != (i % boundary == BLOCK_CHARS))
        {
            return Err(FormatError::InvalidGrouping(pos + 1));
        }
        if chars.len() != GROUPED_KEY_CHARS {
            return Err(FormatError::InvalidGrouping(chars.len()));
        }
    }

    Ok(content)
}

/// 5x5形式の文字列をキー整数に変換する
///
/// Args:
///     key: `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` 形式、またはハイフン無しの25文字
///
/// Returns:
///     キー整数。構造が不正な場合は FormatError
pub fn decode_5x5(key: &str) -> Result<u128, FormatError> {
    let content = strip_grouping(key)?;

    let markers: Vec<usize> = content
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.1 == MARKER)
        .map(|(index, _)| index)
        .collect();

    let marker_index = match markers.as_slice() {
        [] => return Err(FormatError::MissingMarker),
        [index] => *index,
        _ => return Err(FormatError::MultipleMarkers { count: markers.len() }),
    };

    let mut digits = [0u8; KEY_CHARS];
    digits[0] = marker_index as u8;

    for (digit, &(position, ch)) in digits[1..]
        .iter_mut()
        .zip(content.iter().filter(|&&(_, c)| c != MARKER))
    {
        *digit = ALPHABET
            .find(ch)
            .ok_or(FormatError::InvalidCharacter { ch, position })? as u8;
    }

    Ok(from_digits(&digits))
}

/// 5x5形式の文字列の最上位桁（マーカー位置）を返す
pub fn marker_position(key: &str) -> Option<usize> {
    key.chars().filter(|&c| c != '-').position(|c| c == MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_24_unique_symbols() {
        let mut chars: Vec<char> = ALPHABET.chars().collect();
        assert_eq!(chars.len(), 24);
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 24);
        assert!(!ALPHABET.contains(MARKER));
    }

    #[test]
    fn test_capacity_matches_extra_ceiling() {
        assert_eq!(BASE24_CAPACITY, 0x62A32B15518u128 << 72);
        assert_eq!(GROUPED_KEY_CHARS, 29);
    }

    #[test]
    fn test_to_digits_small_values() {
        let digits = to_digits(0);
        assert!(digits.iter().all(|&d| d == 0));

        let digits = to_digits(25);
        assert_eq!(digits[24], 1);
        assert_eq!(digits[23], 1);
        assert_eq!(from_digits(&digits), 25);
    }

    #[test]
    fn test_encode_5x5_zero_and_one() {
        assert_eq!(encode_5x5(0), "NBBBB-BBBBB-BBBBB-BBBBB-BBBBB");
        assert_eq!(encode_5x5(1), "NBBBB-BBBBB-BBBBB-BBBBB-BBBBC");
    }

    #[test]
    fn test_encode_5x5_marker_inside_block() {
        // 最上位桁 7 → マーカーは8文字目
        let key = encode_5x5(0x3FFu128 << 103);
        assert_eq!(key, "3YP64-3BNYW-7MQW6-QH8PV-FJHMB");
        assert_eq!(marker_position(&key), Some(7));
    }

    #[test]
    fn test_decode_5x5_known_value() {
        let value = decode_5x5("M3NC8-DKFTQ-XB2YK-VYY46-GMKDY").unwrap();
        assert_eq!(value, 0x9b80000000000000000000000000);
    }

    #[test]
    fn test_decode_5x5_without_hyphens() {
        let value = decode_5x5("M3NC8DKFTQXB2YKVYY46GMKDY").unwrap();
        assert_eq!(value, 0x9b80000000000000000000000000);
    }

    #[test]
    fn test_decode_5x5_marker_last() {
        assert_eq!(
            decode_5x5("BBBBB-BBBBB-BBBBB-BBBBB-BBBBN").unwrap(),
            BASE24_CAPACITY
        );
        assert_eq!(
            decode_5x5("99999-99999-99999-99999-9999N").unwrap(),
            0x66bf4ce0df8ffffffffffffffffff
        );
    }

    #[test]
    fn test_decode_5x5_errors() {
        assert_eq!(
            decode_5x5("NNBBB-BBBBB-BBBBB-BBBBB-BBBBB"),
            Err(FormatError::MultipleMarkers { count: 2 })
        );
        assert_eq!(
            decode_5x5("BBBBB-BBBBB-BBBBB-BBBBB-BBBBB"),
            Err(FormatError::MissingMarker)
        );
        assert_eq!(
            decode_5x5("NBBBB-BBBBB-BBBBB-BBBBB-BBBB"),
            Err(FormatError::InvalidLength { expected: 25, actual: 24 })
        );
        assert_eq!(
            decode_5x5("NBBBB-BBBBB-BBBBB-BBBBB-BBBBA"),
            Err(FormatError::InvalidCharacter { ch: 'A', position: 29 })
        );
        assert_eq!(
            decode_5x5("NBBBBB-BBBB-BBBBB-BBBBB-BBBBB"),
            Err(FormatError::InvalidGrouping(6))
        );
    }
}
