use crate::pkey_common_rs::key::core::exceptions::{PKeyError, PKeyResult, RangeError};
use crate::pkey_common_rs::key::core::format_base::key_layout;
use crate::pkey_common_rs::key::types::{ChecksumSpec, KeyCodec, KeyFields, ProductKey};
use log::{debug, info};

/// 1回のバッチで生成できる件数の既定上限
pub const DEFAULT_MAX_COUNT: usize = 500;

/// シリアル・セキュリティ値の決め方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// serial = base_serial + i、security は固定
    Sequential { base_serial: u32, security: u64 },
    /// serial と security を乱数で決める
    Random,
}

/// バッチ生成された1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub index: usize,
    pub key: ProductKey,
}

impl BatchEntry {
    /// `KEY - (group, SERIAL, SECURITY)` 形式の1行
    pub fn display_line(&self) -> String {
        let f = &self.key.fields;
        format!(
            "{} - ({}, {:X}, {:X})",
            self.key.key5x5, f.group, f.serial, f.security
        )
    }
}

/// 1つのグループIDに対してキーをまとめて生成する
pub struct KeyBatchGenerator {
    group: u32,
    mode: BatchMode,
    upgrade: u8,
    extra: u8,
    max_count: usize,
    rng: fastrand::Rng,
}

impl KeyBatchGenerator {
    pub fn new(group: u32, mode: BatchMode) -> Self {
        Self {
            group,
            mode,
            upgrade: 0,
            extra: 0,
            max_count: DEFAULT_MAX_COUNT,
            rng: fastrand::Rng::new(),
        }
    }

    /// 乱数のシードを固定する
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn with_flags(mut self, upgrade: u8, extra: u8) -> Self {
        self.upgrade = upgrade;
        self.extra = extra;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count.max(1);
        self
    }

    /// 件数を 1..=max_count に丸める
    pub fn clamp_count(&self, count: usize) -> usize {
        count.clamp(1, self.max_count)
    }

    /// `count` 件のキーを生成する
    ///
    /// 途中でフィールドが範囲外になった場合（連番のシリアル溢れ等）はそこで止まりエラーを返す。
    pub fn generate(&mut self, count: usize) -> PKeyResult<Vec<BatchEntry>> {
        let count = self.clamp_count(count);
        let mut entries = Vec::with_capacity(count);

        for index in 0..count {
            let key = loop {
                let (serial, security) = self.next_values(index)?;
                let fields = KeyFields::new(self.group, serial, security, 0, self.upgrade, self.extra);
                match KeyCodec::encode_fields(&fields, ChecksumSpec::Auto) {
                    // 乱数モードでは上限超えを引き直す
                    Err(PKeyError::Unencodable(e)) if self.mode == BatchMode::Random => {
                        debug!("batch[{}] 再抽選: {}", index, e);
                    }
                    result => break result?,
                }
            };
            debug!("batch[{}] {}", index, key.key5x5);
            entries.push(BatchEntry { index, key });
        }

        info!("グループ {} のキーを {} 件生成しました", self.group, entries.len());
        Ok(entries)
    }

    fn next_values(&mut self, index: usize) -> PKeyResult<(u32, u64)> {
        let layout = key_layout();
        match self.mode {
            BatchMode::Sequential { base_serial, security } => {
                let serial = base_serial as u64 + index as u64;
                let serial = u32::try_from(serial).map_err(|_| {
                    RangeError::field_out_of_range("serial", serial as u128, layout.serial.max_value())
                })?;
                Ok((serial, security))
            }
            BatchMode::Random => {
                let serial = self.rng.u32(0..layout.serial.max_value() as u32);
                let security = self.rng.u64(..) & layout.security.max_value() as u64;
                Ok((serial, security))
            }
        }
    }
}
