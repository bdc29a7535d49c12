//! Per-request scratch storage for uploaded documents.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;
use crate::pdf::Document;

/// An uploaded document written to the scratch directory.
///
/// The file is removed when the value is dropped, on every exit path.
pub struct ScratchUpload {
    file: NamedTempFile,
    name: String,
}

impl ScratchUpload {
    /// Write `bytes` to a uniquely named file inside `dir`, creating `dir` if needed.
    pub fn create(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!("Stored upload {} at {}", name, file.path().display());

        Ok(Self {
            file,
            name: display_name(name),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name the client submitted, reduced to its final path component.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the stored bytes back as a document.
    pub fn read_document(&self) -> Result<Document> {
        let bytes = std::fs::read(self.path())?;
        Ok(Document::new(self.name.clone(), bytes))
    }
}

impl Drop for ScratchUpload {
    fn drop(&mut self) {
        debug!("Removing scratch file {}", self.file.path().display());
    }
}

/// Strip any directory components from a client-supplied file name.
pub fn display_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.pdf")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch_dir = dir.path().join("uploads");

        let upload = ScratchUpload::create(&scratch_dir, "invoice.pdf", b"%PDF-1.4").unwrap();
        assert!(upload.path().exists());
        assert!(upload.path().starts_with(&scratch_dir));
        assert_eq!(upload.read_document().unwrap().bytes(), b"%PDF-1.4");
        assert_eq!(entries(&scratch_dir), 1);

        drop(upload);
        assert_eq!(entries(&scratch_dir), 0);
    }

    #[test]
    fn test_same_name_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = ScratchUpload::create(dir.path(), "invoice.pdf", b"a").unwrap();
        let b = ScratchUpload::create(dir.path(), "invoice.pdf", b"b").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("../../etc/passwd"), "passwd");
        assert_eq!(display_name("C:\\scans\\march.pdf"), "march.pdf");
        assert_eq!(display_name("invoice.pdf"), "invoice.pdf");
        assert_eq!(display_name("dir/"), "upload.pdf");
    }
}
