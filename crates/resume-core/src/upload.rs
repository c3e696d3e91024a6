use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Where the bytes of a selected file can be read from. The core never reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// A file as handed over by a picker or a drop event, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub source: FileSource,
    pub media_type: String,
    pub size_bytes: u64,
    pub name: String,
}

impl SelectedFile {
    pub fn new(
        source: FileSource,
        media_type: impl Into<String>,
        size_bytes: u64,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            media_type: media_type.into(),
            size_bytes,
            name: name.into(),
        }
    }
}

/// A file that passed validation. Only [`validate_file`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile(SelectedFile);

impl CandidateFile {
    pub fn file(&self) -> &SelectedFile {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.0.size_bytes
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.0.size_bytes)
    }

    pub fn into_inner(self) -> SelectedFile {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRejection {
    WrongType,
    TooLarge,
}

impl FileRejection {
    pub fn label(self) -> &'static str {
        match self {
            Self::WrongType => "wrong_type",
            Self::TooLarge => "too_large",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Self::WrongType => "Please upload a PDF file only.",
            Self::TooLarge => "File size must be less than 10MB.",
        }
    }
}

pub fn validate_file(file: SelectedFile) -> Result<CandidateFile, FileRejection> {
    if file.media_type != PDF_MEDIA_TYPE {
        return Err(FileRejection::WrongType);
    }
    if file.size_bytes > MAX_UPLOAD_BYTES {
        return Err(FileRejection::TooLarge);
    }
    Ok(CandidateFile(file))
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    candidate: Option<CandidateFile>,
    last_error: Option<FileRejection>,
    drag_active: bool,
}

impl UploadState {
    pub fn candidate(&self) -> Option<&CandidateFile> {
        self.candidate.as_ref()
    }

    pub fn last_error(&self) -> Option<FileRejection> {
        self.last_error
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    /// Accepted files replace any prior candidate; rejected ones leave it untouched.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), FileRejection> {
        match validate_file(file) {
            Ok(candidate) => {
                tracing::debug!(
                    name = candidate.name(),
                    size = candidate.size_bytes(),
                    replaced = self.candidate.is_some(),
                    "candidate file accepted"
                );
                self.candidate = Some(candidate);
                self.last_error = None;
                Ok(())
            }
            Err(rejection) => {
                tracing::info!(reason = rejection.label(), "candidate file rejected");
                self.last_error = Some(rejection);
                Err(rejection)
            }
        }
    }

    pub fn clear(&mut self) {
        self.candidate = None;
        self.last_error = None;
    }

    pub fn set_drag_active(&mut self, active: bool) {
        self.drag_active = active;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(name: &str, media_type: &str, size_bytes: u64) -> SelectedFile {
        SelectedFile::new(
            FileSource::Path(PathBuf::from(format!("/tmp/{name}"))),
            media_type,
            size_bytes,
            name,
        )
    }

    #[test]
    fn non_pdf_types_are_rejected_before_size_is_checked() {
        for media_type in ["image/png", "application/x-pdf", "APPLICATION/PDF", "", "text/plain"] {
            let result = validate_file(file("a", media_type, MAX_UPLOAD_BYTES * 4));
            assert_eq!(result, Err(FileRejection::WrongType), "{media_type}");
        }
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        assert!(validate_file(file("edge.pdf", PDF_MEDIA_TYPE, MAX_UPLOAD_BYTES)).is_ok());
        assert_eq!(
            validate_file(file("big.pdf", PDF_MEDIA_TYPE, MAX_UPLOAD_BYTES + 1)),
            Err(FileRejection::TooLarge)
        );
        assert!(validate_file(file("empty.pdf", PDF_MEDIA_TYPE, 0)).is_ok());
    }

    #[test]
    fn rejection_keeps_previous_candidate() {
        let mut upload = UploadState::default();
        upload
            .select_file(file("resume.pdf", PDF_MEDIA_TYPE, 2_048))
            .expect("valid pdf");

        let result = upload.select_file(file("photo.png", "image/png", 10));
        assert_eq!(result, Err(FileRejection::WrongType));
        assert_eq!(upload.candidate().map(CandidateFile::name), Some("resume.pdf"));
        assert_eq!(upload.last_error(), Some(FileRejection::WrongType));
    }

    #[test]
    fn accepted_selection_replaces_candidate_and_clears_error() {
        let mut upload = UploadState::default();
        let _ = upload.select_file(file("huge.pdf", PDF_MEDIA_TYPE, MAX_UPLOAD_BYTES + 10));
        assert_eq!(upload.last_error(), Some(FileRejection::TooLarge));

        upload
            .select_file(file("first.pdf", PDF_MEDIA_TYPE, 1))
            .expect("first");
        upload
            .select_file(file("second.pdf", PDF_MEDIA_TYPE, 2))
            .expect("second");

        assert_eq!(upload.candidate().map(CandidateFile::name), Some("second.pdf"));
        assert_eq!(upload.last_error(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut upload = UploadState::default();
        upload
            .select_file(file("resume.pdf", PDF_MEDIA_TYPE, 1))
            .expect("valid pdf");
        upload.clear();
        let once = upload.clone();
        upload.clear();
        assert_eq!(upload, once);
        assert_eq!(upload, UploadState::default());
    }

    #[test]
    fn file_size_tiers() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(MIB - 1), "1024.00 KB");
        assert_eq!(format_file_size(MIB), "1.00 MB");
        assert_eq!(format_file_size(MAX_UPLOAD_BYTES), "10.00 MB");
        assert_eq!(format_file_size(5 * MIB / 2), "2.50 MB");
    }

    #[test]
    fn guidance_text_matches_rejection() {
        assert_eq!(
            FileRejection::WrongType.guidance(),
            "Please upload a PDF file only."
        );
        assert_eq!(
            FileRejection::TooLarge.guidance(),
            "File size must be less than 10MB."
        );
    }
}
