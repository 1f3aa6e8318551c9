use crate::error::{PipelineError, Result};
use std::path::Path;

/// Read a text file as UTF-8, silently dropping bytes that do not decode.
pub async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::extraction(path, e))?;
    Ok(decode_valid_utf8(&bytes))
}

fn decode_valid_utf8(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
