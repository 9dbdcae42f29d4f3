//! 未一致行の蓄積・重複除去モジュール
//!
//! 全ファイル・全チャンクの未一致行を1つの表にまとめる。
//! 同じキーが後のチャンクや別ファイルで再び現れた場合は、先に見た行を残す。

use crate::matcher::UnmatchedBatch;
use crate::types::VendorRecord;
use std::collections::HashSet;

/// 正規化キーで重複除去された未一致行の表
#[derive(Debug, Clone, Default)]
pub struct UnmatchedTable {
    rows: Vec<VendorRecord>,
    /// 既出キーの索引
    seen: HashSet<String>,
}

impl UnmatchedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1行追加する。既出キーなら追加せず `false` を返す
    pub fn push(&mut self, record: VendorRecord) -> bool {
        if self.seen.contains(&record.item_code) {
            return false;
        }
        self.seen.insert(record.item_code.clone());
        self.rows.push(record);
        true
    }

    /// チャンクの結果を追加し、実際に追加した行数を返す
    pub fn append(&mut self, batch: UnmatchedBatch) -> usize {
        self.extend_records(batch.records)
    }

    /// 別の表を順序を保って取り込む
    pub fn merge(&mut self, other: UnmatchedTable) -> usize {
        self.extend_records(other.rows)
    }

    fn extend_records(&mut self, records: Vec<VendorRecord>) -> usize {
        records
            .into_iter()
            .map(|record| self.push(record))
            .filter(|added| *added)
            .count()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn rows(&self) -> &[VendorRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<VendorRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<VendorRecord> for UnmatchedTable {
    fn from_iter<I: IntoIterator<Item = VendorRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.push(record);
        }
        table
    }
}
