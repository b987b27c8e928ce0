use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr_booster::cli::{Cli, Commands};
use ocr_booster::config::{Config, API_KEY_ENV};
use ocr_booster::credentials::{provider_for, CredentialProvider};
use ocr_booster::error::{OcrBoosterError, Result};
use ocr_booster::key_strategy::KeyStrategy;
use ocr_booster::pipeline::{BatchProgress, ProcessOutcome, RefineOutcome, Session};
use ocr_booster::service::gemini::GeminiClient;
use ocr_booster::{export, scanner};
use ocr_booster_common::{IncomingFile, RefineMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    let strategy = cli.key_strategy.unwrap_or(config.key_strategy);

    match cli.command {
        Commands::Scan {
            inputs,
            output,
            fast,
            recursive,
            paste,
            paste_type,
            refine,
            select,
            no_report,
        } => {
            println!("🔍 ocr-booster - OCRスキャン\n");

            // 1. 入力収集
            println!("[1/3] ファイルを読み込み中...");
            let mut incoming: Vec<IncomingFile> = Vec::new();
            if paste {
                incoming.push(scanner::read_pasted(std::io::stdin().lock(), &paste_type)?);
            }
            for file in scanner::scan_inputs(&inputs, recursive)? {
                incoming.push(file.load()?);
            }
            if incoming.is_empty() {
                let target = inputs
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(OcrBoosterError::NoFilesFound(target).into());
            }
            println!("✔ {}件のファイルを検出\n", incoming.len());

            let high_accuracy = config.high_accuracy && !fast;
            let session = build_session(&mut config, strategy, !paste)?.with_high_accuracy(high_accuracy);
            session.add_files(incoming).await;

            if let Some(name) = select {
                let mut registry = session.registry().await;
                let id = registry
                    .find_by_name(&name)
                    .map(|r| r.id().clone())
                    .ok_or(OcrBoosterError::FileNotFound(name))?;
                registry.select(&id);
            }

            // 2. OCR
            println!(
                "[2/3] OCR実行中... ({})",
                if high_accuracy { "高精度モード" } else { "高速モード" }
            );
            let pending = session.registry().await.pending_ids().len();
            let progress = ProgressBar::new(pending as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
                    .progress_chars("█▓░"),
            );

            let report = session
                .run_batch(|event| match event {
                    BatchProgress::Started { file_name, .. } => {
                        progress.set_message(file_name.clone());
                    }
                    BatchProgress::Finished {
                        file_name, outcome, ..
                    } => {
                        progress.inc(1);
                        if let ProcessOutcome::Failed(message) = outcome {
                            progress.println(format!("✖ {}: {}", file_name, message));
                        }
                    }
                })
                .await?;
            progress.finish_and_clear();

            println!(
                "✔ OCR完了: 成功 {} / 失敗 {} / スキップ {}\n",
                report.completed, report.failed, report.skipped
            );
            if report.stopped_for_key {
                print_key_required(session.key_strategy());
            }

            if let Some(mode) = refine {
                refine_in_session(&session, mode).await;
            }

            // 3. 保存
            println!("[3/3] 結果を保存中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let records = session.registry().await.records().to_vec();
            export::export_results(&records, &output_dir, !no_report)?;

            println!("\n✅ 完了");
        }

        Commands::Refine { input, mode, output } => {
            println!("✏️  ocr-booster - テキスト加工 ({})\n", mode);

            if !input.is_file() {
                return Err(OcrBoosterError::FileNotFound(input.display().to_string()).into());
            }
            let text = std::fs::read_to_string(&input)?;
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let session = build_session(&mut config, strategy, true)?;
            let ids = session
                .add_files(vec![IncomingFile::new(file_name, "text/plain", text.clone().into_bytes())])
                .await;
            if let Some(id) = ids.first() {
                session.registry().await.edit_text(id, text);
            }

            match session.refine_selected(mode).await? {
                RefineOutcome::Refined => {}
                RefineOutcome::NothingToRefine => {
                    println!("加工対象のテキストがありません");
                    return Ok(());
                }
            }

            let refined = session
                .registry()
                .await
                .selected()
                .and_then(|r| r.extracted_text())
                .map(str::to_string)
                .unwrap_or_default();

            match output {
                Some(path) => {
                    write_text(&path, &refined)?;
                    println!("✔ 出力: {}", path.display());
                }
                None => println!("{}", refined),
            }
        }

        Commands::Config {
            set_api_key,
            clear_api_key,
            high_accuracy,
            show,
        } => {
            if let Some(key) = set_api_key {
                let key = match key {
                    Some(key) => key,
                    None => prompt_api_key()?,
                };
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if clear_api_key {
                config.clear_api_key()?;
                println!("✔ APIキーを削除しました");
            }

            if let Some(strategy) = cli.key_strategy {
                config.key_strategy = strategy;
                config.save()?;
                println!("✔ キー取得方式を {} に設定しました", strategy);
            }

            if let Some(high_accuracy) = high_accuracy {
                config.high_accuracy = high_accuracy;
                config.save()?;
                println!("✔ 高精度モード: {}", if high_accuracy { "有効" } else { "無効" });
            }

            if show {
                println!("設定:");
                println!("  キー取得方式: {}", config.key_strategy);
                println!("  OCRモデル: {}", config.ocr_model);
                println!("  加工モデル: {}", config.refine_model);
                println!("  高精度モード: {}", if config.high_accuracy { "有効" } else { "無効" });
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  APIキー: {}",
                    if config.stored_api_key().is_some() { "設定済み" } else { "未設定" }
                );
                if std::env::var(API_KEY_ENV).is_ok() {
                    println!("  ({} が設定されています)", API_KEY_ENV);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ocr_booster=debug,ocr_booster_common=debug"
    } else {
        "ocr_booster=error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// キー取得方式を決めてセッションを組み立てる
///
/// stored 方式でキーが無く対話可能なら、その場で入力を求めて保存する。
fn build_session(config: &mut Config, strategy: KeyStrategy, interactive: bool) -> Result<Session> {
    let mut credentials: Arc<dyn CredentialProvider> = provider_for(strategy, config);

    if credentials.api_key().is_none() && strategy == KeyStrategy::Stored && interactive {
        println!("APIキーが未設定です（入力したキーは設定ファイルに保存されます）");
        let key = prompt_api_key()?;
        config.set_api_key(key)?;
        credentials = provider_for(strategy, config);
    }

    if credentials.api_key().is_none() {
        print_key_required(strategy);
        return Err(OcrBoosterError::MissingApiKey(strategy));
    }

    let client = GeminiClient::new(config)?;
    Ok(Session::new(Arc::new(client), credentials))
}

fn prompt_api_key() -> Result<String> {
    let key = dialoguer::Password::new()
        .with_prompt("Gemini APIキー")
        .interact()?;
    Ok(key.trim().to_string())
}

fn print_key_required(strategy: KeyStrategy) {
    println!("🔑 APIキーが必要です（方式: {}）", strategy);
    match strategy {
        KeyStrategy::Host => {
            println!("  環境変数 {} を設定してから再実行してください", API_KEY_ENV);
        }
        KeyStrategy::Stored => {
            println!("  `ocr-booster config --set-api-key` でキーを保存してください");
        }
        KeyStrategy::Optimistic => {
            println!("  認証エラーが発生しました。キーを確認して再実行してください");
        }
    }
    println!();
}

/// 選択中ファイルの加工（失敗は表示のみで処理は続行）
async fn refine_in_session(session: &Session, mode: RefineMode) {
    let target = session
        .registry()
        .await
        .selected()
        .map(|r| r.file_name().to_string())
        .unwrap_or_default();
    println!("- テキスト加工中 ({}): {}", mode, target);

    match session.refine_selected(mode).await {
        Ok(RefineOutcome::Refined) => println!("✔ テキスト加工完了\n"),
        Ok(RefineOutcome::NothingToRefine) => println!("- 加工対象のテキストがありません\n"),
        Err(e) => println!("✖ {}\n", e),
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text.as_bytes())?;
    Ok(())
}
