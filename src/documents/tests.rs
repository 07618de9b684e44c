use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn extension_mapping() {
    assert_eq!(DocumentType::from_extension("pdf").ok(), Some(DocumentType::Pdf));
    assert_eq!(DocumentType::from_extension(".XLSX").ok(), Some(DocumentType::Excel));
    assert_eq!(DocumentType::from_extension("xls").ok(), Some(DocumentType::Excel));
    assert_eq!(DocumentType::from_extension("csv").ok(), Some(DocumentType::Csv));
    assert_eq!(DocumentType::from_extension("Txt").ok(), Some(DocumentType::Txt));
    assert_eq!(DocumentType::from_extension("heic").ok(), Some(DocumentType::Image));
    assert!(matches!(
        DocumentType::from_extension("exe"),
        Err(DocQaError::UnsupportedFormat(ext)) if ext == "exe"
    ));
}

#[test]
fn from_path_requires_extension() {
    assert!(DocumentType::from_path(&PathBuf::from("notes")).is_err());
    assert_eq!(
        DocumentType::from_path(&PathBuf::from("dir/notes.TXT")).ok(),
        Some(DocumentType::Txt)
    );
}

#[test]
fn display_and_parse() {
    for doc_type in [
        DocumentType::Pdf,
        DocumentType::Excel,
        DocumentType::Csv,
        DocumentType::Txt,
        DocumentType::Docx,
        DocumentType::Image,
    ] {
        let parsed: DocumentType = doc_type.to_string().parse().expect("should parse");
        assert_eq!(parsed, doc_type);
    }
}

#[test]
fn extract_plain_text() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("doc.txt");
    fs::write(&path, "The cat sat.\nThe dog ran.").expect("should write file");

    let (text, doc_type) = load_document(&path).expect("should load document");
    assert_eq!(doc_type, DocumentType::Txt);
    assert_eq!(text, "The cat sat.\nThe dog ran.");
}

#[test]
fn extract_replaces_invalid_utf8() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("data.csv");
    fs::write(&path, b"name,value\nab\xffc,1\n").expect("should write file");

    let text = extract_text(&path, DocumentType::Csv).expect("should extract csv");
    assert!(text.starts_with("name,value\n"));
    assert!(text.contains('\u{FFFD}'));
}

#[test]
fn extract_unsupported_format() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("scan.pdf");
    fs::write(&path, b"%PDF-1.4").expect("should write file");

    assert!(matches!(
        extract_text(&path, DocumentType::Pdf),
        Err(DocQaError::UnsupportedFormat(_))
    ));
}

#[test]
fn extract_missing_file_is_io_error() {
    let result = extract_text(&PathBuf::from("/definitely/not/here.txt"), DocumentType::Txt);
    assert!(matches!(result, Err(DocQaError::Io(_))));
}

#[test]
fn serde_uses_lowercase_names() {
    let json = serde_json::to_string(&DocumentType::Excel).expect("should serialize");
    assert_eq!(json, "\"excel\"");
}
