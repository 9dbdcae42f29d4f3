//! Reconcile Common Library
//!
//! 品目マスタとベンダー在庫の照合処理（CLIから利用する中核部分）
//!
//! 入出力はバイト列で受け渡し、ファイル選択や通知は呼び出し側が担う。

pub mod accumulator;
pub mod error;
pub mod export;
pub mod format;
pub mod matcher;
pub mod normalizer;
pub mod reference;
pub mod session;
pub mod types;

pub use accumulator::UnmatchedTable;
pub use error::{ReconcileError, Result};
pub use export::{generate_csv_buffer, generate_excel_buffer};
pub use format::FileFormat;
pub use matcher::{ChunkedMatcher, UnmatchedBatch};
pub use normalizer::{normalize_key, NormalizedKey};
pub use reference::{load_reference, ReferenceKeySet};
pub use session::{
    match_vendor_file, reconcile, CollectingReporter, FileOutcome, FileSummary, NullReporter,
    ReconcileReport, ReconcileSession, Reporter, SessionOptions, Upload,
};
pub use types::VendorRecord;
