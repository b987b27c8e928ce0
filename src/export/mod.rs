use crate::error::Result;
use ocr_booster_common::export::{write_extracted_text, write_report, OutputNames};
use ocr_booster_common::FileRecord;
use std::path::{Path, PathBuf};

/// 実行レポートのファイル名
pub const REPORT_FILE_NAME: &str = "ocr-report.json";

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub text_files: Vec<PathBuf>,
    pub report: Option<PathBuf>,
}

/// 抽出テキストを1ファイルずつ保存し、最後にレポートを出力
pub fn export_results(records: &[FileRecord], output_dir: &Path, with_report: bool) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    let mut names = OutputNames::new();

    for record in records {
        match write_extracted_text(record, output_dir, &mut names)? {
            Some(path) => {
                println!("✔ テキスト出力: {}", path.display());
                summary.text_files.push(path);
            }
            None => {
                println!("- スキップ（テキストなし）: {}", record.file_name());
            }
        }
    }

    if with_report {
        let report_path = output_dir.join(REPORT_FILE_NAME);
        write_report(records, &report_path)?;
        println!("✔ レポート出力: {}", report_path.display());
        summary.report = Some(report_path);
    }

    Ok(summary)
}
