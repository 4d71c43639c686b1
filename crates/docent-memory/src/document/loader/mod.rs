mod text;

pub use text::TextLoader;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::{Document, DocumentError};

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>;

    fn supported_extensions(&self) -> &[&str];
}
