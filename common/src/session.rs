//! 照合セッション
//!
//! 状態遷移は所有権で表現する:
//! - `Idle → ReferenceLoaded`: 参照キー集合なしにセッションは作れない
//! - `Matching`: `process_vendor` / `record_vendor_result` をファイルごとに呼ぶ
//! - `Finalized`: `finalize` がセッションを消費して結果を返す
//!
//! ベンダーファイル単位の失敗はセッションを壊さない。そのファイルの寄与は空になる。

use crate::accumulator::UnmatchedTable;
use crate::error::{ReconcileError, Result};
use crate::format::FileFormat;
use crate::matcher::{validate_chunk_size, ChunkedMatcher};
use crate::reference::{load_reference, ReferenceKeySet};
use crate::types::DEFAULT_CHUNK_SIZE;
use std::io::Read;
use tracing::{info, warn};

/// 進捗・エラーの通知先（呼び出し側が実装する）
pub trait Reporter {
    fn report(&self, message: &str);
    fn report_error(&self, message: &str);
}

/// 何も出力しないReporter
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _message: &str) {}
    fn report_error(&self, _message: &str) {}
}

/// セッション設定
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub chunk_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// 1ファイル分の照合統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub rows_read: usize,
    pub chunks: usize,
    /// ファイル内で重複除去した未一致行数
    pub unmatched_rows: usize,
    /// 全体の表に新規追加された行数
    pub added_rows: usize,
}

/// ファイルごとの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Processed(FileSummary),
    Failed { name: String, message: String },
}

impl FileOutcome {
    pub fn name(&self) -> &str {
        match self {
            FileOutcome::Processed(summary) => &summary.name,
            FileOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// 確定した照合結果
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub table: UnmatchedTable,
    pub outcomes: Vec<FileOutcome>,
    pub reference_keys: usize,
}

impl ReconcileReport {
    pub fn failed_files(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn total_rows_read(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Processed(summary) => summary.rows_read,
                FileOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// 1ファイルを最後まで照合し、ファイル内で重複除去した表を返す
///
/// ベンダーファイルはCSVのみ受け付ける。
/// 途中でエラーになった場合は部分結果を捨てて `Err` を返す。
/// 参照キー集合は読み取り専用なので、複数ファイルを並列に処理してよい。
pub fn match_vendor_file<R: Read>(
    reader: R,
    name: &str,
    reference: &ReferenceKeySet,
    chunk_size: usize,
) -> Result<(UnmatchedTable, FileSummary)> {
    match FileFormat::from_name(name) {
        FileFormat::DelimitedText => {}
        FileFormat::Workbook => {
            return Err(ReconcileError::UnsupportedFormat(format!(
                "{}（ベンダーファイルはCSVのみ）",
                name
            )))
        }
        FileFormat::Unsupported(ext) => return Err(ReconcileError::UnsupportedFormat(ext)),
    }

    let matcher = ChunkedMatcher::new(reader, name, reference, chunk_size)?;
    let mut table = UnmatchedTable::new();
    let mut summary = FileSummary {
        name: name.to_string(),
        ..Default::default()
    };

    for batch in matcher {
        let batch = batch?;
        summary.rows_read += batch.rows_read;
        summary.chunks += 1;
        table.append(batch);
    }
    summary.unmatched_rows = table.len();

    Ok((table, summary))
}

/// 照合セッション（参照読み込み済み）
#[derive(Debug)]
pub struct ReconcileSession {
    reference: ReferenceKeySet,
    options: SessionOptions,
    table: UnmatchedTable,
    outcomes: Vec<FileOutcome>,
}

impl ReconcileSession {
    /// チャンクサイズが0なら `ReconcileError::Config` を返す
    pub fn new(reference: ReferenceKeySet, options: SessionOptions) -> Result<Self> {
        validate_chunk_size(options.chunk_size)?;
        Ok(Self {
            reference,
            options,
            table: UnmatchedTable::new(),
            outcomes: Vec::new(),
        })
    }

    /// 参照ファイルを読み込んでセッションを開始する
    ///
    /// 設定の検証は参照ファイルを読む前に行う。
    pub fn from_reference<R: Read>(
        reader: R,
        declared_name: &str,
        options: SessionOptions,
    ) -> Result<Self> {
        validate_chunk_size(options.chunk_size)?;
        let reference = load_reference(reader, declared_name)?;
        Self::new(reference, options)
    }

    pub fn reference(&self) -> &ReferenceKeySet {
        &self.reference
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// 現時点の蓄積結果
    pub fn table(&self) -> &UnmatchedTable {
        &self.table
    }

    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// ベンダーファイルを1つ照合して結果に取り込む
    ///
    /// エラー時はそのファイルの行を1行も取り込まない。
    pub fn process_vendor<R: Read>(&mut self, name: &str, reader: R) -> Result<FileSummary> {
        let result = match_vendor_file(reader, name, &self.reference, self.options.chunk_size);
        self.record_vendor_result(name, result)
    }

    /// 別の場所（並列処理など）で得た1ファイル分の結果を取り込む
    ///
    /// 呼び出し順がファイル間の「先勝ち」の順序になる。
    pub fn record_vendor_result(
        &mut self,
        name: &str,
        result: Result<(UnmatchedTable, FileSummary)>,
    ) -> Result<FileSummary> {
        match result {
            Ok((table, mut summary)) => {
                summary.added_rows = self.table.merge(table);
                info!(
                    file = name,
                    rows = summary.rows_read,
                    unmatched = summary.unmatched_rows,
                    added = summary.added_rows,
                    "ベンダーファイルを照合しました"
                );
                self.outcomes.push(FileOutcome::Processed(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                warn!(file = name, error = %e, "ベンダーファイルの照合に失敗");
                self.outcomes.push(FileOutcome::Failed {
                    name: name.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// 参照キーの読み込み件数を通知する
    pub fn report_reference(&self, reporter: &dyn Reporter) {
        reporter.report(&format!(
            "参照キー {}件 ({}行) を読み込みました",
            self.reference.len(),
            self.reference.source_rows()
        ));
    }

    /// 1ファイル分の結果を取り込み、その結果を Reporter に通知する
    ///
    /// `reconcile` とCLI側の逐次・並列実行はすべてここを通る。
    pub fn record_and_report(
        &mut self,
        name: &str,
        result: Result<(UnmatchedTable, FileSummary)>,
        reporter: &dyn Reporter,
    ) -> Option<FileSummary> {
        match self.record_vendor_result(name, result) {
            Ok(summary) => {
                reporter.report(&format!(
                    "{}: {}行中 未一致 {}件（新規 {}件）",
                    summary.name, summary.rows_read, summary.unmatched_rows, summary.added_rows
                ));
                Some(summary)
            }
            Err(e) => {
                reporter.report_error(&e.to_string());
                None
            }
        }
    }

    /// セッションを確定する
    pub fn finalize(self) -> ReconcileReport {
        ReconcileReport {
            reference_keys: self.reference.len(),
            table: self.table,
            outcomes: self.outcomes,
        }
    }
}

/// アップロードされた1ファイル（名前と内容）
pub struct Upload<R> {
    pub name: String,
    pub reader: R,
}

impl<R: Read> Upload<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// 参照読み込みから確定までを一括で実行する
///
/// ライブラリとして組み込む場合の入口。任意の `Read` を受け取り、逐次に処理する。
/// 並列実行や進捗表示が必要な場合は `ReconcileSession` を直接使う
/// （CLIの `pipeline::run_pipeline` がその例）。
///
/// 設定・参照ファイルのエラーはベンダーファイルを処理する前に `Err` で返す。
/// ベンダーファイルのエラーは通知して次のファイルへ進む。
pub fn reconcile<R, V, I>(
    reference: Upload<R>,
    vendors: I,
    options: SessionOptions,
    reporter: &dyn Reporter,
) -> Result<ReconcileReport>
where
    R: Read,
    V: Read,
    I: IntoIterator<Item = Upload<V>>,
{
    let mut session = match ReconcileSession::from_reference(reference.reader, &reference.name, options) {
        Ok(session) => session,
        Err(e) => {
            reporter.report_error(&e.to_string());
            return Err(e);
        }
    };
    session.report_reference(reporter);

    for vendor in vendors {
        reporter.report(&format!("{} を処理中...", vendor.name));
        let result = match_vendor_file(
            vendor.reader,
            &vendor.name,
            session.reference(),
            session.options().chunk_size,
        );
        session.record_and_report(&vendor.name, result, reporter);
    }

    Ok(session.finalize())
}

/// エラーメッセージを保持するだけのReporter（テスト・集計用）
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: std::cell::RefCell<Vec<String>>,
    errors: std::cell::RefCell<Vec<String>>,
}

impl CollectingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn report_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}
