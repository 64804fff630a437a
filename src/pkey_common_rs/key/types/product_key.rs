use crate::pkey_common_rs::key::core::base24::{decode_5x5, encode_5x5, format_blocks, BASE24_CAPACITY};
use crate::pkey_common_rs::key::core::checksum::{calc_checksum10, split_checksum10};
use crate::pkey_common_rs::key::core::exceptions::{
    ChecksumError, FormatError, PKeyResult, RangeError, UnencodableError,
};
use crate::pkey_common_rs::key::core::format_base::{key_layout, KeyValidator, KEY_BITS};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 自動計算を要求するチェックサム値（範囲外の番兵）
pub const CHECKSUM_AUTO: u16 = 0x400;

/// extra フラグ付きキーの上限（この値以上はエンコード不能）
pub const EXTRA_KEY_CEILING: u128 = 0x62A32B15518u128 << 72;

/// キーを構成する6フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeyFields {
    pub group: u32,
    pub serial: u32,
    pub security: u64,
    pub checksum: u16,
    pub upgrade: u8,
    pub extra: u8,
}

impl KeyFields {
    pub fn new(group: u32, serial: u32, security: u64, checksum: u16, upgrade: u8, extra: u8) -> Self {
        Self {
            group,
            serial,
            security,
            checksum,
            upgrade,
            extra,
        }
    }

    /// チェックサムを差し替えたコピー
    pub fn with_checksum(self, checksum: u16) -> Self {
        Self { checksum, ..self }
    }

    /// 各フィールドを幅検証してから1つの整数に詰める
    ///
    /// どれか1つでも幅を超えれば RangeError。切り捨ては行わない。
    pub fn pack(&self) -> Result<PackedKey, RangeError> {
        let layout = key_layout();
        let values = [
            (&layout.group, self.group as u128),
            (&layout.serial, self.serial as u128),
            (&layout.security, self.security as u128),
            (&layout.checksum, self.checksum as u128),
            (&layout.upgrade, self.upgrade as u128),
            (&layout.extra, self.extra as u128),
        ];

        let mut key = 0u128;
        for (field, value) in values {
            KeyValidator::validate_field(field, value)?;
            field.set(&mut key, value);
        }

        Ok(PackedKey(key))
    }

    /// チェックサムを0にして計算した正しいチェックサム値
    pub fn expected_checksum(&self) -> Result<u16, RangeError> {
        let pre = self.with_checksum(0).pack()?;
        Ok(calc_checksum10(pre.value()))
    }
}

/// 115ビットのパック済みキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackedKey(u128);

impl PackedKey {
    /// 生の整数から作成する（115ビットを超える値は RangeError）
    pub fn from_raw(value: u128) -> Result<Self, RangeError> {
        let max = (1u128 << KEY_BITS) - 1;
        if value > max {
            return Err(RangeError::field_out_of_range("key", value, max));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// 各フィールドへ分解する
    pub fn unpack(&self) -> KeyFields {
        let layout = key_layout();
        KeyFields {
            group: layout.group.extract(self.0) as u32,
            serial: layout.serial.extract(self.0) as u32,
            security: layout.security.extract(self.0) as u64,
            checksum: layout.checksum.extract(self.0) as u16,
            upgrade: layout.upgrade.extract(self.0) as u8,
            extra: layout.extra.extract(self.0) as u8,
        }
    }

    /// 埋め込まれたチェックサムと、チェックサム部を0にして再計算した値
    pub fn checksum_pair(&self) -> (u16, u16) {
        let field = &key_layout().checksum;
        // レイアウトは10ビット幅で固定なので None にはならない
        split_checksum10(self.0, field.start, field.length).unwrap_or((0, 0))
    }

    /// 埋め込まれたチェックサムが正しいか
    pub fn checksum_is_valid(&self) -> bool {
        let (stored, calculated) = self.checksum_pair();
        stored == calculated
    }

    /// 5x5 形式に変換する
    pub fn to_presentation(&self) -> PresentationKey {
        PresentationKey(encode_5x5(self.0))
    }
}

impl fmt::Display for PackedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::LowerHex for PackedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` 形式のキー文字列
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PresentationKey(String);

impl PresentationKey {
    /// 文字列を検証して作成する（ハイフン無しの25文字も受け付け、区切り形式に揃える）
    pub fn parse(key: &str) -> Result<Self, FormatError> {
        Self::parse_with_value(key).map(|(parsed, _)| parsed)
    }

    /// 検証済みのキー文字列とキー整数を同時に返す
    pub fn parse_with_value(key: &str) -> Result<(Self, u128), FormatError> {
        let value = decode_5x5(key)?;
        let content: String = key.chars().filter(|&c| c != '-').collect();
        Ok((Self(format_blocks(&content)), value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// キー整数へ戻す
    pub fn to_packed(&self) -> PackedKey {
        // parse 済みなので構造は保証されている
        PackedKey(decode_5x5(&self.0).unwrap_or_default())
    }
}

impl fmt::Display for PresentationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PresentationKey {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// エンコード時のチェックサム指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumSpec {
    /// キーから計算する
    Auto,
    /// 指定値をそのまま埋め込む（正しさは問わない）
    Fixed(u16),
}

impl ChecksumSpec {
    /// 数値指定から変換する（0x400 は自動計算、それを超える値は RangeError）
    pub fn from_raw(value: u64) -> Result<Self, RangeError> {
        match value {
            v if v == CHECKSUM_AUTO as u64 => Ok(ChecksumSpec::Auto),
            v if v < CHECKSUM_AUTO as u64 => Ok(ChecksumSpec::Fixed(v as u16)),
            v => Err(RangeError::field_out_of_range(
                "checksum",
                v as u128,
                CHECKSUM_AUTO as u128,
            )),
        }
    }

    pub fn raw(&self) -> u16 {
        match self {
            ChecksumSpec::Auto => CHECKSUM_AUTO,
            ChecksumSpec::Fixed(value) => *value,
        }
    }
}

impl Default for ChecksumSpec {
    fn default() -> Self {
        ChecksumSpec::Auto
    }
}

/// エンコード・デコード結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductKey {
    pub key5x5: PresentationKey,
    pub packed: PackedKey,
    pub fields: KeyFields,
}

impl ProductKey {
    /// 埋め込まれたチェックサムを検証する
    pub fn verify_checksum(&self) -> Result<(), ChecksumError> {
        let (stored, calculated) = self.packed.checksum_pair();
        if stored == calculated {
            Ok(())
        } else {
            Err(ChecksumError::mismatch(calculated, stored))
        }
    }

    pub fn checksum_is_valid(&self) -> bool {
        self.verify_checksum().is_ok()
    }
}

/// プロダクトキーのエンコーダ・デコーダ
pub struct KeyCodec;

impl KeyCodec {
    /// フィールドから5x5キーを生成する
    pub fn encode(
        group: u32,
        serial: u32,
        security: u64,
        upgrade: u8,
        extra: u8,
        checksum: ChecksumSpec,
    ) -> PKeyResult<ProductKey> {
        Self::encode_fields(&KeyFields::new(group, serial, security, 0, upgrade, extra), checksum)
    }

    /// `fields.checksum` は無視され、`checksum` の指定に従って埋め込まれる
    pub fn encode_fields(fields: &KeyFields, checksum: ChecksumSpec) -> PKeyResult<ProductKey> {
        let base = fields.with_checksum(0);

        let checksum = match checksum {
            ChecksumSpec::Auto => base.expected_checksum()?,
            ChecksumSpec::Fixed(value) => value,
        };

        let fields = base.with_checksum(checksum);
        let packed = fields.pack()?;

        if fields.extra != 0 && packed.value() >= EXTRA_KEY_CEILING {
            return Err(UnencodableError {
                key: packed.value(),
                ceiling: EXTRA_KEY_CEILING,
            }
            .into());
        }
        debug_assert!(packed.value() < BASE24_CAPACITY);

        let key5x5 = packed.to_presentation();
        debug!("encoded {} -> {}", packed, key5x5);

        Ok(ProductKey {
            key5x5,
            packed,
            fields,
        })
    }

    /// 5x5キーをフィールドへ分解する（チェックサムは検証しない）
    pub fn decode(key: &str) -> PKeyResult<ProductKey> {
        let (key5x5, value) = PresentationKey::parse_with_value(key)?;
        let packed = PackedKey::from_raw(value)?;
        let fields = packed.unpack();
        debug!("decoded {} -> {}", key5x5, packed);

        Ok(ProductKey {
            key5x5,
            packed,
            fields,
        })
    }

    /// デコードしてチェックサムも検証する
    pub fn decode_verified(key: &str) -> PKeyResult<ProductKey> {
        let decoded = Self::decode(key)?;
        decoded.verify_checksum()?;
        Ok(decoded)
    }
}
