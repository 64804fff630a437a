//! キーフォーマットの基盤実装
//! JSON のフィールド仕様からビット配置を構築し、値の範囲を検証する

use super::bit_utils::{BitField, KeyFieldSet};
use super::exceptions::{PKeyError, PKeyResult, RangeError};
use once_cell::sync::Lazy;
use serde_json::Value;

/// パック済みキーのビット幅
pub const KEY_BITS: usize = 115;

/// 6フィールドの名前（宣言順）
pub const FIELD_NAMES: [&str; 6] = ["group", "serial", "security", "checksum", "upgrade", "extra"];

// JSON仕様からフィールド定義を構築（コンパイル時埋め込み）
static KEY_LAYOUT: Lazy<KeyLayout> = Lazy::new(|| {
    let json = include_str!("../format_spec/key_fields.json");
    let fields = JsonKeySpecLoader::load_from_json(json).expect("key spec parse");
    KeyLayout::from_fields(fields).expect("key layout")
});

/// 組み込みのキーレイアウトを参照する
pub fn key_layout() -> &'static KeyLayout {
    &KEY_LAYOUT
}

/// JSONからキーフィールド仕様を読み込む
pub struct JsonKeySpecLoader;

impl JsonKeySpecLoader {
    /// JSON文字列からフィールド定義を読み込み
    ///
    /// `fields` 配列の順にビット0から配置する。`key_bits` があれば合計幅と照合する。
    pub fn load_from_json(json_str: &str) -> PKeyResult<KeyFieldSet> {
        let json: Value = serde_json::from_str(json_str)
            .map_err(|e| PKeyError::Spec(format!("JSON解析エラー: {}", e)))?;

        let entries = json["fields"]
            .as_array()
            .ok_or_else(|| PKeyError::Spec("fields 配列が見つかりません".to_string()))?;

        let mut fields = KeyFieldSet::new();
        for entry in entries {
            let (name, length) = Self::parse_field_spec(entry)?;
            if fields.get_field(&name).is_some() {
                return Err(PKeyError::Spec(format!("フィールド '{}' が重複しています", name)));
            }
            fields.add_field(&name, length);
        }

        if let Some(key_bits) = json["key_bits"].as_u64() {
            if fields.total_bits() as u64 != key_bits {
                return Err(PKeyError::Spec(format!(
                    "フィールド幅の合計 {} が key_bits {} と一致しません",
                    fields.total_bits(),
                    key_bits
                )));
            }
        }

        Ok(fields)
    }

    /// フィールド仕様を解析
    fn parse_field_spec(field_def: &Value) -> PKeyResult<(String, usize)> {
        let name = field_def["name"]
            .as_str()
            .ok_or_else(|| PKeyError::Spec("name フィールドが見つかりません".to_string()))?;

        let length = field_def["length"]
            .as_u64()
            .ok_or_else(|| PKeyError::Spec(format!("'{}' の length が見つかりません", name)))?;

        if length == 0 || length > 64 {
            return Err(PKeyError::Spec(format!("'{}' の length が不正です: {}", name, length)));
        }

        Ok((name.to_string(), length as usize))
    }
}

/// 6フィールドのビット配置
#[derive(Debug, Clone)]
pub struct KeyLayout {
    pub group: BitField,
    pub serial: BitField,
    pub security: BitField,
    pub checksum: BitField,
    pub upgrade: BitField,
    pub extra: BitField,
    fields: KeyFieldSet,
}

impl KeyLayout {
    /// フィールド定義からレイアウトを構築する
    pub fn from_fields(fields: KeyFieldSet) -> PKeyResult<Self> {
        if fields.total_bits() != KEY_BITS {
            return Err(PKeyError::Spec(format!(
                "キー幅は{}ビットである必要があります: {}",
                KEY_BITS,
                fields.total_bits()
            )));
        }

        let lookup = |name: &str| -> PKeyResult<BitField> {
            fields
                .get_field(name)
                .cloned()
                .ok_or_else(|| PKeyError::Spec(format!("フィールド '{}' が定義されていません", name)))
        };

        Ok(Self {
            group: lookup("group")?,
            serial: lookup("serial")?,
            security: lookup("security")?,
            checksum: lookup("checksum")?,
            upgrade: lookup("upgrade")?,
            extra: lookup("extra")?,
            fields,
        })
    }

    /// 宣言順の全フィールド
    pub fn fields(&self) -> &[BitField] {
        self.fields.get_all_fields()
    }

    /// 名前でフィールドを検索
    pub fn field(&self, name: &str) -> Option<&BitField> {
        self.fields.get_field(name)
    }

    pub fn total_bits(&self) -> usize {
        self.fields.total_bits()
    }
}

/// フィールド値の範囲検証器
pub struct KeyValidator;

impl KeyValidator {
    /// 値がフィールド幅に収まるか検証する
    pub fn validate_field(field: &BitField, value: u128) -> Result<(), RangeError> {
        if field.fits(value) {
            Ok(())
        } else {
            Err(RangeError::field_out_of_range(&field.name, value, field.max_value()))
        }
    }
}
