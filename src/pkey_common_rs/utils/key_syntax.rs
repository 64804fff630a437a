use crate::pkey_common_rs::key::core::base24::{ALPHABET, MARKER};
use once_cell::sync::Lazy;
use regex::Regex;

// 5文字×5ブロックの大まかな形だけを見る。マーカーの個数などは検査しない
static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"^(?:[{a}{m}]{{5}}-){{4}}[{a}{m}]{{4}}[{a}]$",
        a = ALPHABET,
        m = MARKER
    );
    Regex::new(&pattern).expect("key pattern")
});

/// デコード前の簡易構文チェック
///
/// ここを通ってもデコードで FormatError になり得る。
pub fn precheck(key: &str) -> bool {
    KEY_PATTERN.is_match(key.trim())
}
