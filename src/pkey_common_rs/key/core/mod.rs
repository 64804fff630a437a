//! キーコア機能
//! ビット操作、チェックサム計算、24進変換、エラー処理等のコア機能

pub mod base24;
pub mod bit_utils;
pub mod checksum;
pub mod exceptions;
pub mod format_base;

// 便利な再エクスポート
pub use base24::{decode_5x5, encode_5x5, ALPHABET, BASE24_CAPACITY, MARKER};
pub use bit_utils::{extract_bits, set_bits, BitField, KeyFieldSet};
pub use checksum::{calc_checksum10, calc_crc32, verify_checksum10};
pub use exceptions::{ChecksumError, FormatError, PKeyError, PKeyResult, RangeError, UnencodableError};
pub use format_base::{key_layout, JsonKeySpecLoader, KeyLayout, KeyValidator, KEY_BITS};
