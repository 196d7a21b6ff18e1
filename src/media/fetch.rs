//! HTTP fetch helpers built on reqwest.

use std::io;

use futures::StreamExt;

use crate::error::CastError;
use crate::pipeline::BoxChunkStream;

/// Issues a GET and returns the response body as a chunk stream suitable for
/// feeding the decode stage.
pub(crate) async fn open_url_stream(
    client: &reqwest::Client,
    url: &str,
) -> Result<BoxChunkStream, CastError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CastError::stream_init(format!("request to {url} failed: {e}")))?
        .error_for_status()
        .map_err(|e| CastError::stream_init(format!("request to {url} failed: {e}")))?;

    Ok(Box::pin(response.bytes_stream().map(|item| {
        item.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    })))
}

/// Fetches a whole body into memory (thumbnail images).
pub(crate) async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, CastError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CastError::stream_init(format!("request to {url} failed: {e}")))?
        .error_for_status()
        .map_err(|e| CastError::stream_init(format!("request to {url} failed: {e}")))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| CastError::stream_init(format!("reading body of {url} failed: {e}")))?;
    Ok(body.to_vec())
}
