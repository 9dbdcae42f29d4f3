//! 参照（品目マスタ）読み込みモジュール
//!
//! 参照ファイルから `VENDITEMID` 列だけを文字列として読み込み、
//! 正規化済みキーの集合を作る。他の列は読まない。

use crate::error::{ReconcileError, Result};
use crate::format::FileFormat;
use crate::normalizer::normalize_key;
use crate::types::{check_field_count, decode_latin1, REFERENCE_COLUMN};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashSet;
use std::io::{Cursor, Read};
use tracing::{debug, info};

/// 正規化済み参照キーの集合
///
/// 読み込み後は変更しない。
#[derive(Debug, Clone, Default)]
pub struct ReferenceKeySet {
    keys: HashSet<String>,
    /// 読み込んだデータ行数（重複・空を含む）
    source_rows: usize,
}

impl ReferenceKeySet {
    /// 生のコード列から作成（各値を正規化する）
    pub fn from_raw_keys<I, S>(raw_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in raw_keys {
            set.insert_raw(raw.as_ref());
        }
        set
    }

    fn insert_raw(&mut self, raw: &str) {
        self.keys.insert(normalize_key(raw));
        self.source_rows += 1;
    }

    /// 正規化済みキーが含まれるか
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// 異なるキーの数
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn source_rows(&self) -> usize {
        self.source_rows
    }
}

/// 参照ファイルを読み込む
///
/// 形式は `declared_name` の拡張子で判定する。
pub fn load_reference<R: Read>(reader: R, declared_name: &str) -> Result<ReferenceKeySet> {
    let format = FileFormat::from_name(declared_name);
    debug!(file = declared_name, %format, "参照ファイル形式を判定");

    let keys = match format {
        FileFormat::DelimitedText => load_delimited(reader, declared_name)?,
        FileFormat::Workbook => load_workbook(reader, declared_name)?,
        unsupported @ FileFormat::Unsupported(_) => {
            return Err(ReconcileError::UnsupportedFormat(format!(
                "{}（参照ファイルは csv または xlsx を指定してください）",
                unsupported
            )))
        }
    };

    info!(
        file = declared_name,
        rows = keys.source_rows(),
        keys = keys.len(),
        "参照キーを読み込みました"
    );
    Ok(keys)
}

fn load_delimited<R: Read>(reader: R, name: &str) -> Result<ReferenceKeySet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let (column, header_len) = {
        let headers = csv_reader
            .byte_headers()
            .map_err(|e| ReconcileError::read(name, e))?;
        let column = headers
            .iter()
            .position(|h| decode_latin1(h).trim() == REFERENCE_COLUMN)
            .ok_or_else(|| ReconcileError::schema(name, REFERENCE_COLUMN))?;
        (column, headers.len())
    };

    let mut keys = ReferenceKeySet::default();
    let mut record = csv::ByteRecord::new();
    while csv_reader
        .read_byte_record(&mut record)
        .map_err(|e| ReconcileError::read(name, e))?
    {
        check_field_count(name, &record, header_len)?;
        let raw = record.get(column).map(decode_latin1).unwrap_or_default();
        keys.insert_raw(&raw);
    }

    Ok(keys)
}

fn load_workbook<R: Read>(mut reader: R, name: &str) -> Result<ReferenceKeySet> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ReconcileError::read(name, e))?;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ReconcileError::read(name, e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReconcileError::read(name, "ワークシートがありません"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReconcileError::read(name, e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ReconcileError::schema(name, REFERENCE_COLUMN))?;
    let column = header
        .iter()
        .position(|cell| cell_to_text(cell).trim() == REFERENCE_COLUMN)
        .ok_or_else(|| ReconcileError::schema(name, REFERENCE_COLUMN))?;

    let mut keys = ReferenceKeySet::default();
    for row in rows {
        let raw = row.get(column).map(cell_to_text).unwrap_or_default();
        keys.insert_raw(&raw);
    }

    Ok(keys)
}

/// セル値を文字列化（数値として解釈しない）
fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
