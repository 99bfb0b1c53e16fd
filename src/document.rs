//! The document a user picked for processing.

use std::path::Path;

const PDF_MIME: &str = "application/pdf";
const FALLBACK_MIME: &str = "application/octet-stream";

/// A selected document held in memory until it is replaced by another selection.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wrap raw bytes under the given file name and MIME type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the MIME type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = mime_for(&name);
        tracing::debug!(file = %name, size = bytes.len(), mime = mime_type, "Loaded document");
        Ok(Self::new(name, mime_type, bytes))
    }

    /// File name shown to the user and sent as the multipart file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type attached to the multipart part.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the document in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Raw document contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size formatted in megabytes with two decimals, e.g. `1.50 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size() as f64 / (1024.0 * 1024.0))
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn mime_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => FALLBACK_MIME,
    }
}
