//! コンソール向けの進捗通知

use indicatif::{ProgressBar, ProgressStyle};
use reconcile_common::Reporter;

/// 進捗を標準出力、エラーを標準エラーに出すReporter
///
/// プログレスバー表示中はバーを崩さないようにバー経由で出力する。
pub struct ConsoleReporter {
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// ファイル数に応じたプログレスバーを開始する
    pub fn start_progress(&mut self, total_files: usize) -> ProgressBar {
        let bar = ProgressBar::new(total_files as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} ファイル {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        self.progress = Some(bar.clone());
        bar
    }

    pub fn finish_progress(&mut self) {
        if let Some(bar) = self.progress.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, message: &str) {
        match &self.progress {
            Some(bar) => bar.println(format!("- {}", message)),
            None => println!("- {}", message),
        }
    }

    fn report_error(&self, message: &str) {
        match &self.progress {
            Some(bar) => bar.println(format!("⚠ {}", message)),
            None => eprintln!("⚠ {}", message),
        }
    }
}
