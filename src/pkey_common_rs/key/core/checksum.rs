//! プロダクトキーのチェックサム計算・検証機能
//! 多項式 0x04C11DB7 の MSB ファースト CRC32 から10ビットを切り出す

use once_cell::sync::Lazy;

/// CRC32 生成多項式
pub const CRC32_POLY: u32 = 0x04C1_1DB7;

/// チェックサムのビット幅
pub const CHECKSUM_BITS: usize = 10;

/// MSB ファーストの CRC32 テーブル（初回参照時に一度だけ構築）
static CRC32_TABLE: Lazy<[u32; 256]> = Lazy::new(build_crc32_table);

fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut k = (i as u32) << 24;
        for _ in 0..8 {
            k = if k & 0x8000_0000 != 0 {
                (k << 1) ^ CRC32_POLY
            } else {
                k << 1
            };
        }
        *entry = k;
    }
    table
}

/// CRC32 テーブルを参照する
pub fn crc32_table() -> &'static [u32; 256] {
    &CRC32_TABLE
}

/// バイト列の CRC32 を計算する（初期値 0xFFFFFFFF、反転なし、最終値を補数化）
///
/// Args:
///     data: 計算対象のバイト列
///
/// Returns:
///     32ビット CRC 値
pub fn calc_crc32(data: &[u8]) -> u32 {
    let table = crc32_table();
    let mut crc = 0xFFFF_FFFFu32;

    for &byte in data {
        let index = ((crc >> 24) ^ byte as u32) & 0xFF;
        crc = (crc << 8) ^ table[index as usize];
    }

    !crc
}

/// キー整数から10ビットチェックサムを計算する
///
/// キー整数を16バイトに揃え、リトルエンディアン順（ビッグエンディアン表現の
/// 逆順）で CRC32 に通す。チェックサムフィールドが0のキーに対して呼ぶこと。
///
/// Args:
///     key: チェックサムフィールドが0のキー整数
///
/// Returns:
///     10ビットチェックサム値 (0..=0x3FF)
pub fn calc_checksum10(key: u128) -> u16 {
    (calc_crc32(&key.to_le_bytes()) & 0x3FF) as u16
}

/// キー整数に埋め込まれた10ビットチェックサムを検証する
///
/// Args:
///     key: チェックサムを含むキー整数
///     checksum_start_bit: チェックサムの開始ビット位置
///     checksum_length: チェックサムの長さ（ビット）
///
/// Returns:
///     (格納値, 再計算値)
pub fn split_checksum10(key: u128, checksum_start_bit: usize, checksum_length: usize) -> Option<(u16, u16)> {
    use bitvec::prelude::*;

    if checksum_length != CHECKSUM_BITS || checksum_start_bit + checksum_length > 128 {
        return None;
    }

    let mut bytes = key.to_le_bytes();
    let bits = BitSlice::<u8, Lsb0>::from_slice_mut(&mut bytes);
    let range = checksum_start_bit..checksum_start_bit + checksum_length;

    let stored = bits[range.clone()].load_le::<u16>();

    // チェックサム部分を0にしてから再計算
    bits[range].store_le(0u16);
    let calculated = calc_checksum10(u128::from_le_bytes(bytes));

    Some((stored, calculated))
}

/// 埋め込まれたチェックサムが正しければtrue
pub fn verify_checksum10(key: u128, checksum_start_bit: usize, checksum_length: usize) -> bool {
    match split_checksum10(key, checksum_start_bit, checksum_length) {
        Some((stored, calculated)) => stored == calculated,
        None => false,
    }
}
