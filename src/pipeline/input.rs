//! Input resolution: validate a user-supplied path or uploaded bytes.
//!
//! ## Why a temp file for uploads?
//!
//! pdfium requires a file-system path; it cannot stream from a byte buffer.
//! Uploaded bytes are written to a [`tempfile::NamedTempFile`] whose RAII
//! drop deletes the file on every exit path: success, parse failure, service
//! failure, even a panic mid-pipeline. We validate the PDF magic bytes
//! (`%PDF`) before handing anything to pdfium so callers get a meaningful
//! error rather than an opaque pdfium failure.

use crate::error::ExtractError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// The resolved input: a caller-owned path or a temp file holding an upload.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Uploaded bytes, written to a temp file that is deleted on drop.
    Uploaded(NamedTempFile),
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Uploaded(f) => f.path(),
        }
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
pub fn resolve_local(path_str: impl AsRef<Path>) -> Result<ResolvedInput, ExtractError> {
    let path = path_str.as_ref().to_path_buf();

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            // Files shorter than the magic are rejected too, zero-padded,
            // matching resolve_bytes on short uploads.
            let mut magic = [0u8; 4];
            let mut filled = 0;
            while filled < magic.len() {
                match f.read(&mut magic[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            if filled < magic.len() || &magic != b"%PDF" {
                return Err(ExtractError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Write uploaded PDF bytes to a managed temp file.
///
/// The magic-byte check runs before the write so an upload of the wrong file
/// kind fails fast without touching the filesystem.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, ExtractError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ExtractError::NotAPdf {
            path: PathBuf::from("<uploaded bytes>"),
            magic,
        });
    }

    let mut tmp = NamedTempFile::with_suffix(".pdf")
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    tmp.flush()
        .map_err(|e| ExtractError::Internal(format!("tempfile flush: {e}")))?;

    debug!("Wrote {} uploaded bytes to {}", bytes.len(), tmp.path().display());
    Ok(ResolvedInput::Uploaded(tmp))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal but structurally-plausible PDF prefix; enough for the magic check.
    const PDF_MAGIC: &[u8] = b"%PDF-1.4\n%fake body\n";

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        let err = resolve_local(&path).unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.pdf");
        std::fs::write(&path, b"%P").unwrap();
        let err = resolve_local(&path).unwrap_err();
        match err {
            ExtractError::NotAPdf { magic, .. } => assert_eq!(&magic, b"%P\0\0"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }

        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        let err = resolve_local(&empty).unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }

    #[test]
    fn pdf_magic_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, PDF_MAGIC).unwrap();
        let resolved = resolve_local(&path).unwrap();
        assert_eq!(resolved.path(), path);
    }

    #[test]
    fn uploaded_bytes_are_validated_and_cleaned_up() {
        let err = resolve_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));

        let tmp_path = {
            let resolved = resolve_bytes(PDF_MAGIC).unwrap();
            let p = resolved.path().to_path_buf();
            assert!(p.exists());
            assert_eq!(std::fs::read(&p).unwrap(), PDF_MAGIC);
            p
        };
        // Temp file must be gone once the ResolvedInput is dropped.
        assert!(!tmp_path.exists());
    }

    #[test]
    fn short_uploads_do_not_panic() {
        let err = resolve_bytes(b"%P").unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }
}
