use clap::Parser;
use stock_reconcile::{cli, config, error, export, pipeline, report, scanner};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use reconcile_common::FileOutcome;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging(verbose: bool) {
    // RUST_LOG > --verbose > 既定（warn）
    let default_filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Run { reference, vendors, output, format, chunk_size, parallel, recursive } => {
            println!("📦 stock-reconcile - 在庫照合\n");

            let chunk_size = match chunk_size {
                Some(size) => config::validate_chunk_size(size)?,
                None => config.effective_chunk_size()?,
            };
            let parallel = parallel || config.parallel;

            // 1. ベンダーCSV収集
            println!("[1/3] ベンダーCSVを収集中...");
            let vendor_files = scanner::collect_vendor_files(&vendors, recursive)?;
            if vendor_files.is_empty() {
                println!("⚠ ベンダーCSVが0件です（ヘッダーのみの結果を出力します）\n");
            } else {
                println!("✔ {}件のベンダーCSVを検出\n", vendor_files.len());
            }

            // 2. 照合
            println!(
                "[2/3] 照合中... (チャンク: {}行{})",
                chunk_size,
                if parallel { ", 並列" } else { "" }
            );
            let mut reporter = report::ConsoleReporter::new();
            let bar = reporter.start_progress(vendor_files.len());
            let options = pipeline::RunOptions { chunk_size, parallel };
            let result =
                pipeline::run_pipeline(&reference, &vendor_files, &options, &reporter, Some(&bar));
            reporter.finish_progress();
            let report = result?;

            for outcome in report.outcomes.iter().filter(|o| o.is_failed()) {
                if let FileOutcome::Failed { name, message } = outcome {
                    println!("  ✘ {}: {}", name, message);
                }
            }
            println!(
                "✔ 照合完了: {}行読み込み / 未一致 {}件 / 失敗 {}ファイル\n",
                report.total_rows_read(),
                report.table.len(),
                report.failed_files()
            );

            // 3. 出力
            println!("[3/3] 結果を保存中...");
            let output_target = output.unwrap_or_else(|| export::default_output_dir(&reference));
            let written = export::export_table(
                &report.table,
                format,
                &output_target,
                &config.output_file_stem,
            )?;
            for file in &written {
                println!(
                    "✔ 出力: {} ({}, {} bytes)",
                    file.path.display(),
                    file.content_type,
                    file.size
                );
            }

            println!("\n✅ 完了");
        }

        Commands::Check { reference } => {
            let session = pipeline::open_session(&reference, config.chunk_size)?;
            let keys = session.reference();
            println!("参照ファイル: {}", reference.display());
            println!("  データ行数: {}", keys.source_rows());
            println!("  正規化後のキー数: {}", keys.len());
            if keys.contains("") {
                println!("  ⚠ 空のキー（空欄またはゼロのみのコード）を含みます");
            }
        }

        Commands::Config { set_chunk_size, set_parallel, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(size) = set_chunk_size {
                config.set_chunk_size(size)?;
                changed = true;
                println!("✔ チャンク行数を設定しました: {}", size);
            }

            if let Some(parallel) = set_parallel {
                config.parallel = parallel;
                changed = true;
                println!("✔ 並列処理の既定値を設定しました: {}", parallel);
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  チャンク行数: {}", config.chunk_size);
                println!("  並列処理: {}", if config.parallel { "有効" } else { "無効" });
                println!("  出力ファイル名: {}", config.output_file_stem);
            }
        }
    }

    Ok(())
}
