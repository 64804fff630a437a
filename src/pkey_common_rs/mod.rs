//! 5x5 プロダクトキー共通ライブラリ

pub mod key;
pub mod utils;
