//! プロダクトキー処理用エラー型定義

use std::error::Error;
use std::fmt;

/// フィールド値がビット幅を超えた
#[derive(Debug, Clone, PartialEq)]
pub struct RangeError {
    pub field: String,
    pub value: u128,
    pub max: u128,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "フィールド '{}' の値が範囲外: 0x{:X} (最大: 0x{:X})",
            self.field, self.value, self.max
        )
    }
}

impl Error for RangeError {}

/// 5x5 キー文字列の構造エラー
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// ハイフンを除いた文字数が25ではない
    InvalidLength { expected: usize, actual: usize },
    /// ハイフンがブロック境界以外にある
    InvalidGrouping(usize),
    /// アルファベット外の文字
    InvalidCharacter { ch: char, position: usize },
    /// マーカー文字が無い
    MissingMarker,
    /// マーカー文字が複数ある
    MultipleMarkers { count: usize },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidLength { expected, actual } => {
                write!(f, "キー長が不正です: 必要 {}文字, 実際 {}文字", expected, actual)
            }
            FormatError::InvalidGrouping(position) => {
                write!(f, "ハイフンの位置が不正です: {}文字目", position)
            }
            FormatError::InvalidCharacter { ch, position } => {
                write!(f, "不正な文字 '{}' ({}文字目)", ch, position)
            }
            FormatError::MissingMarker => {
                write!(f, "マーカー文字 'N' が見つかりません")
            }
            FormatError::MultipleMarkers { count } => {
                write!(f, "マーカー文字 'N' が複数あります: {}個", count)
            }
        }
    }
}

impl Error for FormatError {}

/// extra フラグ付きキーが5x5表現の上限を超えた
#[derive(Debug, Clone, PartialEq)]
pub struct UnencodableError {
    pub key: u128,
    pub ceiling: u128,
}

impl fmt::Display for UnencodableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extra パラメータではエンコードできません: 0x{:032x} (上限: 0x{:032x})",
            self.key, self.ceiling
        )
    }
}

impl Error for UnencodableError {}

/// チェックサムエラー
#[derive(Debug, Clone, PartialEq)]
pub enum ChecksumError {
    /// チェックサム不一致
    Mismatch { expected: u16, actual: u16 },
}

impl fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumError::Mismatch { expected, actual } => {
                write!(
                    f,
                    "チェックサム検証に失敗しました。期待値: 0x{:03X}, 実際: 0x{:03X}",
                    expected, actual
                )
            }
        }
    }
}

impl Error for ChecksumError {}

/// プロダクトキー処理の統合エラー型
#[derive(Debug, Clone, PartialEq)]
pub enum PKeyError {
    Range(RangeError),
    Format(FormatError),
    Unencodable(UnencodableError),
    Checksum(ChecksumError),
    /// フィールド仕様(JSON)の読み込みエラー
    Spec(String),
    /// 設定・引数の解釈エラー
    Config(String),
    /// I/O エラー
    Io(String),
}

impl fmt::Display for PKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PKeyError::Range(err) => write!(f, "範囲エラー: {}", err),
            PKeyError::Format(err) => write!(f, "形式エラー: {}", err),
            PKeyError::Unencodable(err) => write!(f, "エンコード不能: {}", err),
            PKeyError::Checksum(err) => write!(f, "チェックサムエラー: {}", err),
            PKeyError::Spec(msg) => write!(f, "フィールド仕様エラー: {}", msg),
            PKeyError::Config(msg) => write!(f, "設定エラー: {}", msg),
            PKeyError::Io(msg) => write!(f, "I/Oエラー: {}", msg),
        }
    }
}

impl Error for PKeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PKeyError::Range(err) => Some(err),
            PKeyError::Format(err) => Some(err),
            PKeyError::Unencodable(err) => Some(err),
            PKeyError::Checksum(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RangeError> for PKeyError {
    fn from(err: RangeError) -> Self {
        PKeyError::Range(err)
    }
}

impl From<FormatError> for PKeyError {
    fn from(err: FormatError) -> Self {
        PKeyError::Format(err)
    }
}

impl From<UnencodableError> for PKeyError {
    fn from(err: UnencodableError) -> Self {
        PKeyError::Unencodable(err)
    }
}

impl From<ChecksumError> for PKeyError {
    fn from(err: ChecksumError) -> Self {
        PKeyError::Checksum(err)
    }
}

impl From<std::io::Error> for PKeyError {
    fn from(err: std::io::Error) -> Self {
        PKeyError::Io(err.to_string())
    }
}

/// Result型のエイリアス
pub type PKeyResult<T> = Result<T, PKeyError>;

impl RangeError {
    /// フィールド範囲外エラーを作成
    pub fn field_out_of_range(field: &str, value: u128, max: u128) -> Self {
        RangeError {
            field: field.to_string(),
            value,
            max,
        }
    }
}

impl ChecksumError {
    /// チェックサム不一致エラーを作成
    pub fn mismatch(expected: u16, actual: u16) -> Self {
        ChecksumError::Mismatch { expected, actual }
    }
}
