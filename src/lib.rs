/// PKey Rust Implementation
/// 5x5 product key codec (bit packing, CRC checksum, base-24 presentation) in Rust

pub mod pkey_common_rs;

// 便利な再エクスポート
pub mod prelude {
    pub use crate::pkey_common_rs::key::core::exceptions::{PKeyError, PKeyResult};
    pub use crate::pkey_common_rs::key::types::{
        ChecksumSpec, KeyCodec, KeyFields, PackedKey, PresentationKey, ProductKey,
    };
}
