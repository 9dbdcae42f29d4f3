//! 照合で扱うデータ型と列名定義

use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};

/// 参照ファイルの品目ID列
pub const REFERENCE_COLUMN: &str = "VENDITEMID";

/// ベンダーファイルの必須列（出力列も同じ順序）
pub const VENDOR_COLUMNS: [&str; 4] = ["ItemCode", "ItemName", "InvQty", "ConvFact"];

/// 既定のチャンク行数
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// 出力シート名
pub const OUTPUT_SHEET_NAME: &str = "Unmatched Data";

/// 出力ファイル名（拡張子なし）
pub const OUTPUT_FILE_STEM: &str = "all_unmatched_data";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// ベンダー在庫の1行
///
/// `item_code` は正規化済みの値を保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorRecord {
    pub item_code: String,
    pub item_name: String,
    pub inv_qty: String,
    pub conv_fact: String,
}

impl VendorRecord {
    /// 出力列順の値
    pub fn values(&self) -> [&str; 4] {
        [&self.item_code, &self.item_name, &self.inv_qty, &self.conv_fact]
    }
}

/// ISO-8859-1 のバイト列を文字列に変換
///
/// ISO-8859-1 は各バイトがそのまま同じ値のコードポイントに対応するため、失敗しない。
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// ヘッダーより列の多い行を拒否する
///
/// 列が足りない行は末尾を空欄として扱うため、ここでは検査しない。
pub(crate) fn check_field_count(
    file: &str,
    record: &csv::ByteRecord,
    header_len: usize,
) -> Result<()> {
    if record.len() <= header_len {
        return Ok(());
    }
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    Err(ReconcileError::read(
        file,
        format!(
            "{}行目の列数 {} がヘッダーの列数 {} を超えています",
            line,
            record.len(),
            header_len
        ),
    ))
}
