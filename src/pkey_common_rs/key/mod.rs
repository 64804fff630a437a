//! キー処理
//! コア機能（ビット操作・チェックサム・24進変換）とキー型定義

pub mod core;
pub mod types;
