/// キー型定義
pub mod product_key;

// 再エクスポート
pub use product_key::{
    ChecksumSpec, KeyCodec, KeyFields, PackedKey, PresentationKey, ProductKey, CHECKSUM_AUTO,
    EXTRA_KEY_CEILING,
};
