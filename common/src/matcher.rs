//! チャンク単位の照合モジュール
//!
//! ベンダーファイルを固定行数のブロックごとに読み、参照キー集合に存在しない行だけを返す。
//! CSVリーダーは全ブロックで1つを共有し、ファイル全体をメモリに載せない。

use crate::error::{ReconcileError, Result};
use crate::normalizer::normalize_key;
use crate::reference::ReferenceKeySet;
use crate::types::{check_field_count, decode_latin1, VendorRecord, VENDOR_COLUMNS};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// 1チャンク分の未一致行
#[derive(Debug, Clone, Default)]
pub struct UnmatchedBatch {
    /// 0始まりのチャンク番号
    pub index: usize,
    /// このチャンクで読んだ行数
    pub rows_read: usize,
    /// チャンク内で重複除去済みの未一致行
    pub records: Vec<VendorRecord>,
}

/// チャンクサイズを検証する（0は不可）
pub fn validate_chunk_size(chunk_size: usize) -> Result<usize> {
    if chunk_size == 0 {
        return Err(ReconcileError::Config(
            "チャンクサイズは1以上を指定してください".into(),
        ));
    }
    Ok(chunk_size)
}

/// ベンダーファイルの逐次照合
///
/// `Iterator` として未一致行のバッチを順に返す。
/// 読み込みエラーは一度だけ `Err` で返し、その後は `None` になる。
pub struct ChunkedMatcher<'a, R: Read> {
    reader: csv::Reader<R>,
    reference: &'a ReferenceKeySet,
    chunk_size: usize,
    /// ItemCode, ItemName, InvQty, ConvFact の列位置
    columns: [usize; 4],
    header_len: usize,
    file_name: String,
    record: csv::ByteRecord,
    next_index: usize,
    finished: bool,
}

impl<'a, R: Read> ChunkedMatcher<'a, R> {
    /// ヘッダー行を読み、必須列の位置を確定する
    pub fn new(
        reader: R,
        file_name: &str,
        reference: &'a ReferenceKeySet,
        chunk_size: usize,
    ) -> Result<Self> {
        let chunk_size = validate_chunk_size(chunk_size)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|e| ReconcileError::read(file_name, e))?
            .iter()
            .map(|h| decode_latin1(h).trim().to_string())
            .collect();

        let mut columns = [0usize; 4];
        for (slot, name) in columns.iter_mut().zip(VENDOR_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReconcileError::schema(file_name, name))?;
        }

        Ok(Self {
            reader,
            reference,
            chunk_size,
            columns,
            header_len: headers.len(),
            file_name: file_name.to_string(),
            record: csv::ByteRecord::new(),
            next_index: 0,
            finished: false,
        })
    }

    fn field(&self, slot: usize) -> String {
        self.record
            .get(self.columns[slot])
            .map(decode_latin1)
            .unwrap_or_default()
    }

    fn read_chunk(&mut self) -> Result<Option<UnmatchedBatch>> {
        let mut batch = UnmatchedBatch {
            index: self.next_index,
            ..Default::default()
        };
        let mut seen: HashSet<String> = HashSet::new();

        while batch.rows_read < self.chunk_size {
            let has_row = self
                .reader
                .read_byte_record(&mut self.record)
                .map_err(|e| ReconcileError::read(&self.file_name, e))?;
            if !has_row {
                self.finished = true;
                break;
            }
            check_field_count(&self.file_name, &self.record, self.header_len)?;
            batch.rows_read += 1;

            let key = normalize_key(&self.field(0));
            if self.reference.contains(&key) || seen.contains(&key) {
                continue;
            }

            seen.insert(key.clone());
            batch.records.push(VendorRecord {
                item_code: key,
                item_name: self.field(1),
                inv_qty: self.field(2),
                conv_fact: self.field(3),
            });
        }

        if batch.rows_read == 0 {
            return Ok(None);
        }

        debug!(
            file = %self.file_name,
            chunk = batch.index,
            rows = batch.rows_read,
            unmatched = batch.records.len(),
            "チャンクを照合"
        );
        self.next_index += 1;
        Ok(Some(batch))
    }
}

impl<R: Read> Iterator for ChunkedMatcher<'_, R> {
    type Item = Result<UnmatchedBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_chunk() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for ChunkedMatcher<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;

    const VENDOR: &str = "ItemCode,ItemName,InvQty,ConvFact\n\
        07,Widget,10,1\n\
        XYZ,Gadget,5,2\n\
        xyz,Gadget again,6,2\n\
        Q1,Thing,1,1\n\
        ABC,Known,3,1\n";

    fn reference() -> ReferenceKeySet {
        ReferenceKeySet::from_raw_keys(["007", "ABC"])
    }

    fn collect(matcher: ChunkedMatcher<'_, &[u8]>) -> Vec<UnmatchedBatch> {
        matcher.map(|b| b.unwrap()).collect()
    }

    #[test]
    fn test_single_chunk() {
        let reference = reference();
        let matcher = ChunkedMatcher::new(VENDOR.as_bytes(), "v.csv", &reference, 100).unwrap();
        let batches = collect(matcher);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].rows_read, 5);
        let codes: Vec<_> = batches[0].records.iter().map(|r| r.item_code.as_str()).collect();
        assert_eq!(codes, vec!["XYZ", "Q1"]);
        // チャンク内では最初の出現を残す
        assert_eq!(batches[0].records[0].item_name, "Gadget");
    }

    #[test]
    fn test_chunk_size_one_keeps_per_block_duplicates() {
        let reference = reference();
        let matcher = ChunkedMatcher::new(VENDOR.as_bytes(), "v.csv", &reference, 1).unwrap();
        let batches = collect(matcher);

        assert_eq!(batches.len(), 5);
        assert_eq!(
            batches.iter().map(|b| b.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        let total: usize = batches.iter().map(|b| b.records.len()).sum();
        // ブロックをまたぐ重複は蓄積側で除去する
        assert_eq!(total, 3);
    }

    #[test]
    fn test_exact_multiple_of_chunk_size() {
        let reference = ReferenceKeySet::default();
        let csv = "ItemCode,ItemName,InvQty,ConvFact\nA,a,1,1\nB,b,1,1\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 2).unwrap();
        let batches = collect(matcher);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].records.len(), 2);
    }

    #[test]
    fn test_header_only_file_yields_nothing() {
        let reference = reference();
        let csv = "ItemCode,ItemName,InvQty,ConvFact\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10).unwrap();
        assert_eq!(collect(matcher).len(), 0);
    }

    #[test]
    fn test_extra_columns_and_order_are_ignored() {
        let reference = ReferenceKeySet::default();
        let csv = "ConvFact,Extra,InvQty,ItemName,ItemCode\n2,x,5,Gadget,0xyz\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10).unwrap();
        let batches = collect(matcher);
        assert_eq!(
            batches[0].records[0],
            VendorRecord {
                item_code: "XYZ".into(),
                item_name: "Gadget".into(),
                inv_qty: "5".into(),
                conv_fact: "2".into(),
            }
        );
    }

    #[test]
    fn test_missing_vendor_column() {
        let reference = reference();
        let csv = "ItemCode,ItemName,InvQty\nA,a,1\n";
        let result = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10);
        assert!(matches!(
            result,
            Err(ReconcileError::Schema { ref column, .. }) if column == "ConvFact"
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let reference = reference();
        let result = ChunkedMatcher::new(VENDOR.as_bytes(), "v.csv", &reference, 0);
        assert!(matches!(result, Err(ReconcileError::Config(_))));
    }

    #[test]
    fn test_malformed_block_fails_once_then_stops() {
        let reference = ReferenceKeySet::default();
        let csv = "ItemCode,ItemName,InvQty,ConvFact\nA,a,1,1\nB,b,1,1,extra\nC,c,1,1\n";
        let mut matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 1).unwrap();

        assert!(matcher.next().unwrap().is_ok());
        assert!(matches!(matcher.next(), Some(Err(ReconcileError::Read { .. }))));
        assert!(matcher.next().is_none());
        assert!(matcher.next().is_none());
    }

    #[test]
    fn test_short_row_is_padded_with_empty_fields() {
        let reference = ReferenceKeySet::default();
        let csv = "ItemCode,ItemName,InvQty,ConvFact\nX,x,1\nY\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10).unwrap();
        let batches = collect(matcher);

        assert_eq!(batches[0].rows_read, 2);
        assert_eq!(
            batches[0].records[0],
            VendorRecord {
                item_code: "X".into(),
                item_name: "x".into(),
                inv_qty: "1".into(),
                conv_fact: "".into(),
            }
        );
        assert_eq!(batches[0].records[1].item_name, "");
    }

    #[test]
    fn test_all_zero_code_is_unmatched_without_empty_reference_key() {
        let reference = reference();
        let csv = "ItemCode,ItemName,InvQty,ConvFact\n000,Zero,1,1\n,Blank,1,1\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10).unwrap();
        let batches = collect(matcher);

        // "000" と空欄はどちらも空キーになり、チャンク内で1行にまとまる
        assert_eq!(batches[0].records.len(), 1);
        assert_eq!(batches[0].records[0].item_code, "");
        assert_eq!(batches[0].records[0].item_name, "Zero");
    }

    #[test]
    fn test_all_zero_code_matches_empty_reference_key() {
        let reference = ReferenceKeySet::from_raw_keys(["0"]);
        let csv = "ItemCode,ItemName,InvQty,ConvFact\n000,Zero,1,1\n";
        let matcher = ChunkedMatcher::new(csv.as_bytes(), "v.csv", &reference, 10).unwrap();
        assert!(collect(matcher)[0].records.is_empty());
    }
}
