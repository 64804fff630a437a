//! ビット操作ユーティリティ
//! 115ビットのキー整数に対するフィールド抽出・設定と、フィールド配置の管理

/// 指定されたビット範囲から値を抽出する
///
/// Args:
///     data: 元データ（整数値）
///     start_bit: 開始ビット位置（LSB基準）
///     length: 抽出するビット長
///
/// Returns:
///     抽出された値
pub fn extract_bits(data: u128, start_bit: usize, length: usize) -> u128 {
    if length == 0 || length > 128 {
        return 0;
    }

    // 範囲チェック: start_bit + length が128を超えてはいけない
    if start_bit >= 128 || start_bit + length > 128 {
        return 0;
    }

    (data >> start_bit) & mask_for(length)
}

/// 指定されたビット範囲に値を設定する
///
/// 範囲外のビットは `value` から切り捨てられる。切り捨てを許さない場合は
/// 呼び出し側で `BitField::fits` を使って事前に検証すること。
pub fn set_bits(data: &mut u128, start_bit: usize, length: usize, value: u128) {
    if length == 0 || length > 128 {
        return;
    }

    if start_bit >= 128 || start_bit + length > 128 {
        return;
    }

    let mask = mask_for(length);

    // 既存ビットをクリア
    *data &= !(mask << start_bit);

    // 新しい値を設定
    *data |= (value & mask) << start_bit;
}

/// 下位 `length` ビットがすべて1のマスク
fn mask_for(length: usize) -> u128 {
    if length >= 128 {
        u128::MAX
    } else {
        (1u128 << length) - 1
    }
}

/// ビットフィールドの定義構造体
#[derive(Debug, Clone, PartialEq)]
pub struct BitField {
    pub start: usize,
    pub length: usize,
    pub name: String,
}

impl BitField {
    /// 新しいビットフィールドを作成
    pub fn new(name: &str, start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            name: name.to_string(),
        }
    }

    /// このフィールドから値を抽出
    pub fn extract(&self, data: u128) -> u128 {
        extract_bits(data, self.start, self.length)
    }

    /// このフィールドに値を設定
    pub fn set(&self, data: &mut u128, value: u128) {
        set_bits(data, self.start, self.length, value);
    }

    /// このフィールドが保持できる最大値
    pub fn max_value(&self) -> u128 {
        mask_for(self.length)
    }

    /// 値がフィールド幅に収まるか
    pub fn fits(&self, value: u128) -> bool {
        value <= self.max_value()
    }

    /// このフィールドの終了位置を計算
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// キーフィールドマネージャー
///
/// フィールドは追加順にビット0から詰めて配置される。
#[derive(Debug, Clone)]
pub struct KeyFieldSet {
    fields: Vec<BitField>,
    total_bits: usize,
}

impl KeyFieldSet {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            total_bits: 0,
        }
    }

    /// フィールドを追加
    pub fn add_field(&mut self, name: &str, length: usize) {
        let field = BitField::new(name, self.total_bits, length);
        self.total_bits = field.end();
        self.fields.push(field);
    }

    /// フィールドを名前で検索
    pub fn get_field(&self, name: &str) -> Option<&BitField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 全フィールドを取得
    pub fn get_all_fields(&self) -> &[BitField] {
        &self.fields
    }

    /// 合計ビット数を取得
    pub fn total_bits(&self) -> usize {
        self.total_bits
    }
}

impl Default for KeyFieldSet {
    fn default() -> Self {
        Self::new()
    }
}
