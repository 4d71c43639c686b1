use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    #[default]
    Upload,
    Synced,
}

impl DocumentSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Synced => "synced",
        }
    }
}

impl std::str::FromStr for DocumentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Self::Upload),
            "synced" => Ok(Self::Synced),
            other => Err(format!("unknown document source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub source: DocumentSource,
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>, source: DocumentSource) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            source,
            source_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    #[must_use]
    pub fn to_ref(&self) -> DocumentRef {
        DocumentRef {
            id: self.id,
            name: self.name.clone(),
            source: self.source,
            source_id: self.source_id.clone(),
        }
    }
}

/// Character offsets of a chunk within its document, end exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    /// Empty until embedded, and in search results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    pub chunk_index: usize,
    pub span: ChunkSpan,
}

/// Document identity carried on search hits, without the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: Uuid,
    pub name: String,
    pub source: DocumentSource,
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub document: DocumentRef,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentSource::Upload).unwrap(),
            "\"upload\""
        );
        assert_eq!(
            serde_json::from_str::<DocumentSource>("\"synced\"").unwrap(),
            DocumentSource::Synced
        );
    }

    #[test]
    fn source_from_str() {
        assert_eq!("upload".parse(), Ok(DocumentSource::Upload));
        assert!("google-drive".parse::<DocumentSource>().is_err());
    }

    #[test]
    fn new_document_has_fresh_id_and_timestamps() {
        let a = Document::new("a.txt", "x", DocumentSource::Upload);
        let b = Document::new("a.txt", "x", DocumentSource::Upload);
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert!(a.source_id.is_none());
    }

    #[test]
    fn document_ref_drops_content() {
        let doc = Document::new("notes", "body", DocumentSource::Synced).with_source_id("drive-1");
        let r = doc.to_ref();
        assert_eq!(r.id, doc.id);
        assert_eq!(r.name, "notes");
        assert_eq!(r.source_id.as_deref(), Some("drive-1"));
    }
}
