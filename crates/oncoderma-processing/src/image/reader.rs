//! Header re-read used by the scoring engine

use async_trait::async_trait;
use std::path::Path;

use super::probe::{read_dimensions, ProbeError};

#[async_trait]
pub trait DimensionReader: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError>;
}

/// Reads width and height from the image header on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderDimensionReader;

#[async_trait]
impl DimensionReader for HeaderDimensionReader {
    async fn dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        read_dimensions(path).await
    }
}
