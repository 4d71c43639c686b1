use std::path::Path;
use std::pin::Pin;

use super::DocumentLoader;
use crate::document::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentSource};

/// Loads a plain-text or Markdown file as a single uploaded [`Document`] named
/// after the file.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !ext.is_empty() && !self.supported_extensions().contains(&ext) {
                return Err(DocumentError::UnsupportedFormat(ext.to_owned()));
            }

            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            let content = tokio::fs::read_to_string(&path).await?;

            Ok(vec![
                Document::new(name, content, DocumentSource::Upload)
                    .with_source_id(path.display().to_string()),
            ])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown", "text"]
    }
}
