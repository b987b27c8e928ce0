use crate::key_strategy::KeyStrategy;
use clap::{Parser, Subcommand};
use ocr_booster_common::RefineMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ocr-booster")]
#[command(about = "画像・PDFのAI OCRと要約・校正ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// APIキーの取得方式 (host/stored/optimistic)。省略時は設定ファイルの値
    #[arg(long, global = true)]
    pub key_strategy: Option<KeyStrategy>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像/PDFをOCRしてテキストを保存
    Scan {
        /// 入力ファイルまたはフォルダ（複数可）
        #[arg(required_unless_present = "paste")]
        inputs: Vec<PathBuf>,

        /// 出力ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 高速モード（精度より速度を優先）
        #[arg(long)]
        fast: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 標準入力から画像を読み込む（貼り付け）
        #[arg(long)]
        paste: bool,

        /// 貼り付けデータのメディアタイプ
        #[arg(long, default_value = "image/png")]
        paste_type: String,

        /// OCR後に選択中ファイルのテキストを加工 (summary/correction)
        #[arg(long)]
        refine: Option<RefineMode>,

        /// 加工対象のファイル名（デフォルト: 最初のファイル）
        #[arg(long)]
        select: Option<String>,

        /// レポート(ocr-report.json)を出力しない
        #[arg(long)]
        no_report: bool,
    },

    /// テキストファイルを要約・校正
    Refine {
        /// 入力テキストファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 加工モード (summary/correction)
        #[arg(short, long, default_value = "correction")]
        mode: RefineMode,

        /// 出力ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集（--key-strategy 指定時はその方式を保存）
    Config {
        /// APIキーを設定（値を省略すると入力を求める）
        #[arg(long, num_args = 0..=1, value_name = "KEY")]
        set_api_key: Option<Option<String>>,

        /// 保存済みAPIキーを削除
        #[arg(long)]
        clear_api_key: bool,

        /// 高精度モードの既定値 (true/false)
        #[arg(long, value_name = "BOOL")]
        high_accuracy: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_with_refine() {
        let cli = Cli::try_parse_from([
            "ocr-booster",
            "scan",
            "a.png",
            "docs",
            "--refine",
            "summary",
            "--key-strategy",
            "optimistic",
        ])
        .unwrap();

        assert_eq!(cli.key_strategy, Some(KeyStrategy::Optimistic));
        match cli.command {
            Commands::Scan { inputs, refine, fast, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(refine, Some(RefineMode::Summary));
                assert!(!fast);
            }
            _ => panic!("scan expected"),
        }
    }

    #[test]
    fn test_scan_requires_input_or_paste() {
        assert!(Cli::try_parse_from(["ocr-booster", "scan"]).is_err());
        assert!(Cli::try_parse_from(["ocr-booster", "scan", "--paste"]).is_ok());
    }

    #[test]
    fn test_parse_config_set_api_key_without_value() {
        let cli = Cli::try_parse_from(["ocr-booster", "config", "--set-api-key"]).unwrap();
        match cli.command {
            Commands::Config { set_api_key, .. } => assert_eq!(set_api_key, Some(None)),
            _ => panic!("config expected"),
        }

        let cli = Cli::try_parse_from(["ocr-booster", "config", "--set-api-key", "abc"]).unwrap();
        match cli.command {
            Commands::Config { set_api_key, .. } => {
                assert_eq!(set_api_key, Some(Some("abc".to_string())))
            }
            _ => panic!("config expected"),
        }
    }
}
