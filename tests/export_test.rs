//! テキスト出力・レポート出力の統合テスト

use ocr_booster::export::{export_results, REPORT_FILE_NAME};
use ocr_booster_common::{IncomingFile, Registry};
use tempfile::tempdir;

fn registry_with(names: &[&str]) -> Registry {
    let mut registry = Registry::new();
    registry.add_files(
        names
            .iter()
            .map(|n| IncomingFile::new(*n, "image/jpeg", vec![0xFF, 0xD8])),
    );
    registry
}

#[test]
fn test_export_writes_text_byte_for_byte() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut registry = registry_with(&["receipt.jpg"]);
    let id = registry.records()[0].id().clone();

    let text = "合計 ¥1,200\r\n  税込\n\tend without newline";
    registry.complete(&id, text);

    let summary = export_results(registry.records(), dir.path(), false).unwrap();
    assert_eq!(summary.text_files.len(), 1);
    assert!(summary.report.is_none());

    let path = dir.path().join("receipt_extracted.txt");
    assert_eq!(summary.text_files[0], path);
    assert_eq!(std::fs::read(&path).unwrap(), text.as_bytes());
}

#[test]
fn test_export_reflects_user_edits() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut registry = registry_with(&["page.v2.jpg"]);
    let id = registry.records()[0].id().clone();

    registry.complete(&id, "OCR output");
    registry.edit_text(&id, "hand-corrected output\n");

    export_results(registry.records(), dir.path(), false).unwrap();

    let content = std::fs::read_to_string(dir.path().join("page.v2_extracted.txt")).unwrap();
    assert_eq!(content, "hand-corrected output\n");
}

#[test]
fn test_export_skips_records_without_text() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut registry = registry_with(&["a.jpg", "b.jpg"]);
    let id = registry.records()[1].id().clone();
    registry.complete(&id, "B");

    let summary = export_results(registry.records(), dir.path(), true).unwrap();
    assert_eq!(summary.text_files.len(), 1);
    assert!(!dir.path().join("a_extracted.txt").exists());
    assert!(dir.path().join("b_extracted.txt").exists());

    let report_path = dir.path().join(REPORT_FILE_NAME);
    assert_eq!(summary.report.as_deref(), Some(report_path.as_path()));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let entries = report.as_array().expect("配列で出力されるはず");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["fileName"], "a.jpg");
    assert_eq!(entries[0]["status"], "waiting");
    assert_eq!(entries[1]["status"], "completed");
    assert_eq!(entries[1]["progress"], 100);
}

#[test]
fn test_export_creates_output_dir() {
    let dir = tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("out").join("texts");
    let mut registry = registry_with(&["scan.jpg"]);
    let id = registry.records()[0].id().clone();
    registry.complete(&id, "x");

    export_results(registry.records(), &nested, true).unwrap();
    assert!(nested.join("scan_extracted.txt").exists());
    assert!(nested.join(REPORT_FILE_NAME).exists());
}

#[test]
fn test_export_same_stem_keeps_both_texts() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut registry = Registry::new();
    let ids = registry.add_files(vec![
        IncomingFile::new("scan.png", "image/png", vec![1]),
        IncomingFile::new("scan.pdf", "application/pdf", vec![2]),
    ]);
    registry.complete(&ids[0], "from png");
    registry.complete(&ids[1], "from pdf");

    let summary = export_results(registry.records(), dir.path(), false).unwrap();
    assert_eq!(
        summary.text_files,
        vec![
            dir.path().join("scan_extracted.txt"),
            dir.path().join("scan_extracted-2.txt"),
        ]
    );
    assert_eq!(std::fs::read_to_string(&summary.text_files[0]).unwrap(), "from png");
    assert_eq!(std::fs::read_to_string(&summary.text_files[1]).unwrap(), "from pdf");
}
