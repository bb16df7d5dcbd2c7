//! Integration tests for input resolution and conversion failures that occur
//! before any page is rendered.

use std::fs;

use pdfdeck::{convert_file, resolve_input, ConvertOptions, Error, ErrorKind, PdfDeck};

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("nope.pdf");

    let err = convert_file(&input, None, &ConvertOptions::default()).unwrap_err();

    assert!(matches!(err, Error::InputNotFound(ref p) if p == &input));
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_input_with_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pptx");

    let result = PdfDeck::new().convert_to(dir.path().join("nope.pdf"), &output);

    assert!(matches!(result, Err(Error::InputNotFound(_))));
    assert!(!output.exists());
}

#[test]
fn test_text_file_named_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("readme.pdf");
    fs::write(&input, "This is plain text, not a PDF.\n").unwrap();

    let err = convert_file(&input, None, &ConvertOptions::default()).unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert_eq!(err.kind(), ErrorKind::UnsupportedInputFormat);
    assert!(!dir.path().join("readme.pptx").exists());
}

#[test]
fn test_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.pdf");
    fs::write(&input, b"").unwrap();

    assert!(matches!(
        resolve_input(&input),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_directory_input() {
    let dir = tempfile::tempdir().unwrap();

    let err = convert_file(dir.path(), None, &ConvertOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedInputFormat);
}

#[test]
fn test_pdf_header_with_other_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.bin");
    fs::write(&input, b"%PDF-1.5\n%%EOF\n").unwrap();

    let format = resolve_input(&input).unwrap();
    assert_eq!(format.version, "1.5");
}
