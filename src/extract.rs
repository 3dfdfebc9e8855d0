//! Per-format text extraction for source files.
//!
//! The ingestion pipeline hands a path here and gets plain UTF-8 text
//! back. Plain text and markdown are read directly; PDF and Word
//! extraction run through format libraries; image OCR is a black-box
//! collaborator with no built-in backend. Extraction never fails for
//! "no text found" — a format-level failure produces a warning and an
//! empty string, which the pipeline reports as `EmptyContent`.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Maximum decompressed bytes to read from a single ZIP entry
/// (zip-bomb protection for .docx archives).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Source file categories supported by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Text,
    Markdown,
    Pdf,
    Word,
    Image,
}

impl FileType {
    /// Resolve the file type from a path's extension.
    pub fn from_path(path: &Path) -> Result<FileType> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(FileType::Text),
            "md" | "markdown" => Ok(FileType::Markdown),
            "pdf" => Ok(FileType::Pdf),
            "docx" | "doc" => Ok(FileType::Word),
            "png" | "jpg" | "jpeg" => Ok(FileType::Image),
            _ => Err(Error::UnsupportedFileType(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Markdown => "markdown",
            FileType::Pdf => "pdf",
            FileType::Word => "word",
            FileType::Image => "image",
        }
    }
}

/// Extract plain text from `path` according to its resolved type.
///
/// Returns an empty string when the format-level extraction fails or
/// finds no text (with a stderr warning); only filesystem errors on
/// directly readable formats surface as `Err`.
pub fn extract_text(path: &Path, file_type: FileType) -> Result<String> {
    match file_type {
        FileType::Text | FileType::Markdown => Ok(fs::read_to_string(path)?),
        FileType::Pdf => Ok(extract_pdf(path)),
        FileType::Word => Ok(extract_docx(path)),
        FileType::Image => {
            // OCR is an external collaborator; without a backend wired
            // in, image files yield no text.
            eprintln!(
                "Warning: no OCR backend configured; {} yields no text",
                path.display()
            );
            Ok(String::new())
        }
    }
}

fn extract_pdf(path: &Path) -> String {
    match pdf_extract::extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Warning: PDF extraction failed for {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn extract_docx(path: &Path) -> String {
    match try_extract_docx(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "Warning: Word extraction failed for {}: {}",
                path.display(),
                e
            );
            String::new()
        }
    }
}

fn try_extract_docx(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))?;
    let entry = archive.by_name("word/document.xml")?;
    let mut doc_xml = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut doc_xml)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        anyhow::bail!("word/document.xml exceeds size limit");
    }
    extract_w_t_elements(&doc_xml)
}

/// Collect the text of every `w:t` element in a WordprocessingML body.
fn extract_w_t_elements(xml: &[u8]) -> anyhow::Result<String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => anyhow::bail!("invalid document XML: {}", e),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn file_type_resolution() {
        assert_eq!(
            FileType::from_path(Path::new("notes.txt")).unwrap(),
            FileType::Text
        );
        assert_eq!(
            FileType::from_path(Path::new("README.MD")).unwrap(),
            FileType::Markdown
        );
        assert_eq!(
            FileType::from_path(Path::new("paper.pdf")).unwrap(),
            FileType::Pdf
        );
        assert_eq!(
            FileType::from_path(Path::new("memo.docx")).unwrap(),
            FileType::Word
        );
        assert_eq!(
            FileType::from_path(Path::new("scan.jpeg")).unwrap(),
            FileType::Image
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            FileType::from_path(Path::new("archive.tar.gz")),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(matches!(
            FileType::from_path(Path::new("noextension")),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn text_file_reads_directly() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.txt");
        fs::write(&path, "hello world").unwrap();
        assert_eq!(extract_text(&path, FileType::Text).unwrap(), "hello world");
    }

    #[test]
    fn invalid_pdf_yields_empty_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        fs::write(&path, "not a pdf").unwrap();
        assert_eq!(extract_text(&path, FileType::Pdf).unwrap(), "");
    }

    #[test]
    fn invalid_docx_yields_empty_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.docx");
        fs::write(&path, "not a zip").unwrap();
        assert_eq!(extract_text(&path, FileType::Word).unwrap(), "");
    }

    #[test]
    fn image_yields_empty_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.png");
        fs::write(&path, [0u8; 8]).unwrap();
        assert_eq!(extract_text(&path, FileType::Image).unwrap(), "");
    }

    #[test]
    fn w_t_elements_are_collected() {
        let xml = br#"<w:document xmlns:w="ns"><w:body><w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t>world</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(extract_w_t_elements(xml).unwrap(), "Hello world");
    }
}
