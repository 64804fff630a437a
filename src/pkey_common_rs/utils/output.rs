use crate::pkey_common_rs::key::core::format_base::key_layout;
use crate::pkey_common_rs::key::types::ProductKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// デコード結果の出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// フィールドごとに最大値と並べて表示
    Parametric,
    /// 1行1値の10進
    Raw,
    /// 1行1値の16進
    RawHex,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Parametric => "parametric",
            OutputFormat::Raw => "raw",
            OutputFormat::RawHex => "rawhex",
            OutputFormat::Json => "json",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Parametric
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parametric" => Ok(OutputFormat::Parametric),
            "raw" => Ok(OutputFormat::Raw),
            "rawhex" => Ok(OutputFormat::RawHex),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

/// デコード結果を指定形式の文字列にする
pub fn format_decoded(key: &ProductKey, format: OutputFormat) -> String {
    match format {
        OutputFormat::Parametric => format_parametric(key),
        OutputFormat::Raw => format_raw(key, false),
        OutputFormat::RawHex => format_raw(key, true),
        OutputFormat::Json => format_json(key),
    }
}

fn format_parametric(key: &ProductKey) -> String {
    let layout = key_layout();
    let f = &key.fields;

    // (ラベル, 最大値, 値, 表示桁数)
    let rows = [
        ("Group", layout.group.max_value(), f.group as u128, 5),
        ("Serial", layout.serial.max_value(), f.serial as u128, 8),
        ("Security", layout.security.max_value(), f.security as u128, 14),
        ("Checksum", layout.checksum.max_value(), f.checksum as u128, 3),
        ("Upgrade", layout.upgrade.max_value(), f.upgrade as u128, 1),
        ("Extra", layout.extra.max_value(), f.extra as u128, 1),
    ];

    let mut lines = vec![
        String::new(),
        format!("PKey     : [{}]", key.key5x5),
        format!("        -> [{}]", key.packed),
        String::new(),
    ];

    for (label, max, value, width) in rows {
        lines.push(format!("            0x{:X}", max));
        lines.push(format!("{:<9}: [0x{:0width$x}]", label, value, width = width));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_raw(key: &ProductKey, hex: bool) -> String {
    let f = &key.fields;
    let values = [
        f.group as u128,
        f.serial as u128,
        f.security as u128,
        f.upgrade as u128,
        f.checksum as u128,
        f.extra as u128,
    ];

    let mut lines = vec![key.key5x5.to_string()];
    if hex {
        lines.push(format!("{:x}", key.packed));
        lines.extend(values.iter().map(|v| format!("0x{:x}", v)));
    } else {
        lines.push(key.packed.value().to_string());
        lines.extend(values.iter().map(|v| v.to_string()));
    }

    lines.join("\n")
}

fn format_json(key: &ProductKey) -> String {
    let value = serde_json::json!({
        "key": key.key5x5.as_str(),
        "packed": key.packed.to_string(),
        "group": key.fields.group,
        "serial": key.fields.serial,
        "security": key.fields.security,
        "checksum": key.fields.checksum,
        "upgrade": key.fields.upgrade,
        "extra": key.fields.extra,
        "checksum_valid": key.checksum_is_valid(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
