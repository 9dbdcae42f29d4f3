//! 照合の実行（逐次・並列）
//!
//! 並列時も結果の取り込みは指定順に1か所で行うため、
//! ファイル間の「先勝ち」は逐次実行と同じ結果になる。

use crate::error::{AppError, Result};
use crate::scanner::display_name;
use indicatif::ProgressBar;
use rayon::prelude::*;
use reconcile_common::{
    match_vendor_file, FileSummary, ReconcileError, ReconcileReport, ReconcileSession,
    ReferenceKeySet, Reporter, SessionOptions, UnmatchedTable,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub chunk_size: usize,
    pub parallel: bool,
}

/// 参照ファイルを読み込んでセッションを開始する
pub fn open_session(reference: &Path, chunk_size: usize) -> Result<ReconcileSession> {
    if !reference.exists() {
        return Err(AppError::FileNotFound(reference.display().to_string()));
    }

    let name = display_name(reference);
    let file = File::open(reference)?;
    let session = ReconcileSession::from_reference(
        BufReader::new(file),
        &name,
        SessionOptions { chunk_size },
    )?;
    Ok(session)
}

/// 1ファイルを開いて照合する（開けない場合も読み込みエラーとして扱う）
fn match_path(
    path: &Path,
    reference: &ReferenceKeySet,
    chunk_size: usize,
) -> reconcile_common::Result<(UnmatchedTable, FileSummary)> {
    let name = display_name(path);
    let file = File::open(path).map_err(|e| ReconcileError::read(&name, e))?;
    match_vendor_file(BufReader::new(file), &name, reference, chunk_size)
}

/// 参照読み込みから確定までを実行する
///
/// ファイル単位の取り込みと通知は `ReconcileSession::record_and_report` に任せ、
/// ここではファイルの読み出し・並列化・進捗表示だけを扱う。
/// 参照ファイルのエラーは通知したうえで `Err` を返す。
/// ベンダーファイルのエラーは通知して残りのファイルを続行する。
pub fn run_pipeline(
    reference: &Path,
    vendors: &[PathBuf],
    options: &RunOptions,
    reporter: &dyn Reporter,
    progress: Option<&ProgressBar>,
) -> Result<ReconcileReport> {
    let mut session = match open_session(reference, options.chunk_size) {
        Ok(session) => session,
        Err(e) => {
            reporter.report_error(&e.to_string());
            return Err(e);
        }
    };
    session.report_reference(reporter);

    if options.parallel {
        debug!(files = vendors.len(), "ベンダーファイルを並列に照合");
        let reference_keys = session.reference();
        let results: Vec<_> = vendors
            .par_iter()
            .map(|path| {
                let result = match_path(path, reference_keys, options.chunk_size);
                if let Some(bar) = progress {
                    bar.inc(1);
                }
                result
            })
            .collect();

        for (path, result) in vendors.iter().zip(results) {
            session.record_and_report(&display_name(path), result, reporter);
        }
    } else {
        for path in vendors {
            let name = display_name(path);
            if let Some(bar) = progress {
                bar.set_message(name.clone());
            }
            reporter.report(&format!("{} を処理中...", name));
            let result = match_path(path, session.reference(), options.chunk_size);
            session.record_and_report(&name, result, reporter);
            if let Some(bar) = progress {
                bar.inc(1);
            }
        }
    }

    Ok(session.finalize())
}
