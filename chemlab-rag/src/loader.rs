//! Loading documents from a directory.
//!
//! Text is extracted according to the file extension:
//!
//! | extension | extraction |
//! |---|---|
//! | `txt`, `md` | file contents as UTF-8 |
//! | `pdf` | text of every page, in page order |
//! | `docx`, `doc` | paragraph texts in document order, one per line |
//! | anything else | empty text |
//!
//! The extracted text is trimmed at both ends.

use std::path::{Path, PathBuf};

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// File extensions with a dedicated extractor.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["txt", "md", "pdf", "docx", "doc"];

/// List every regular file below `dir`, sorted by path.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns [`RagError::Loader`] if `dir` exists but is not a directory.
pub fn discover_documents(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(RagError::Loader { path: dir.to_path_buf(), message: "not a directory".into() });
    }

    let mut files = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

fn extension(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).unwrap_or_default()
}

fn loader_error(path: &Path, message: impl ToString) -> RagError {
    RagError::Loader { path: path.to_path_buf(), message: message.to_string() }
}

/// Extract the plain text of a single file.
///
/// # Errors
///
/// Returns [`RagError::Loader`] if the file cannot be read or parsed.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = match extension(path).as_str() {
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| loader_error(path, e))?,
        "pdf" => std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| loader_error(path, "PDF parser panicked"))?
            .map_err(|e| loader_error(path, e))?,
        "docx" | "doc" => {
            let bytes = std::fs::read(path).map_err(|e| loader_error(path, e))?;
            docx_paragraphs(&bytes).map_err(|e| loader_error(path, e))?
        }
        other => {
            debug!(path = %path.display(), extension = other, "unsupported extension, no text extracted");
            String::new()
        }
    };
    Ok(text.trim().to_string())
}

fn docx_paragraphs(bytes: &[u8]) -> std::result::Result<String, docx_rs::ReaderError> {
    let docx = docx_rs::read_docx(bytes)?;
    let mut text = String::new();

    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in &paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in &run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Load every file under `dir` as a [`Document`].
///
/// Files that cannot be read are logged and skipped; the rest of the batch
/// is still returned. Each document's `id` is the file stem and its
/// `source` metadata the file name.
///
/// # Errors
///
/// Only fails if the directory itself cannot be enumerated.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let mut documents = Vec::new();

    for path in discover_documents(dir)? {
        let text = match extract_text(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read document, skipping");
                continue;
            }
        };

        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let id = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let mut document = Document::new(id, text, file_name);
        document.source_uri = Some(path.display().to_string());
        documents.push(document);
    }

    info!(path = %dir.display(), documents = documents.len(), "loaded documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use docx_rs::{Docx, Paragraph, Run};

    use super::*;
    use crate::document::SOURCE_KEY;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
        });
        docx.build().pack(fs::File::create(path).unwrap()).unwrap();
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(discover_documents(temp.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn file_instead_of_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("notes.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(discover_documents(&file), Err(RagError::Loader { .. })));
    }

    #[test]
    fn loads_text_and_markdown_trimmed() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("zinc.txt"), "\n  Zn + HCl -> ZnCl2 + H2 \n").unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/sodium.md"), "# Sodium\nNa + H2O -> NaOH + H2").unwrap();

        let docs = load_documents(temp.path()).unwrap();
        assert_eq!(docs.len(), 2);

        let zinc = docs.iter().find(|d| d.id == "zinc").unwrap();
        assert_eq!(zinc.text, "Zn + HCl -> ZnCl2 + H2");
        assert_eq!(zinc.source(), Some("zinc.txt"));
        assert_eq!(docs.iter().find(|d| d.id == "sodium").unwrap().text, "# Sodium\nNa + H2O -> NaOH + H2");
    }

    #[test]
    fn docx_paragraphs_come_out_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("notes.docx");
        write_docx(&path, &["first", "second"]);
        assert_eq!(extract_text(&path).unwrap(), "first\nsecond");
    }

    #[test]
    fn doc_extension_uses_the_docx_reader() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("legacy.DOC");
        write_docx(&path, &["Fe + S -> FeS"]);
        assert_eq!(extract_text(&path).unwrap(), "Fe + S -> FeS");
    }

    #[test]
    fn pdf_pages_come_out_in_order() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/two_pages.pdf");
        let text = extract_text(&path).unwrap();
        let zinc = text.find("Zinc").expect("first page text");
        let sodium = text.find("Sodium").expect("second page text");
        assert!(zinc < sodium, "{text:?}");
        assert_eq!(text, text.trim());
    }

    #[test]
    fn unsupported_extension_yields_empty_text() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("table.csv");
        fs::write(&path, "a,b").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "");
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("good.txt"), "S + O2 -> SO2").unwrap();
        fs::write(temp.path().join("broken.pdf"), b"definitely not a pdf").unwrap();
        fs::write(temp.path().join("broken.docx"), b"not a zip archive").unwrap();
        fs::write(temp.path().join("latin1.txt"), [0xff, 0xfe, 0x41]).unwrap();

        let docs = load_documents(temp.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good");
        assert_eq!(docs[0].metadata.get(SOURCE_KEY).map(String::as_str), Some("good.txt"));
    }
}
