//! Incremental event-stream decoding.
//!
//! Vendors stream completions as newline-delimited `data: ` frames. This
//! module splits the byte stream back into frame payloads; the adapters
//! interpret each payload against their own chunk schema.

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use maestro_error::{ClientError, ClientErrorKind, ClientResult, MaestroResult};
use maestro_interface::StreamChunk;
use std::pin::Pin;

/// Boxed chunk stream shared by every adapter's streaming path.
pub(crate) type ChunkStream = Pin<Box<dyn Stream<Item = MaestroResult<StreamChunk>> + Send>>;

/// Split a response body into `data: ` frame payloads.
///
/// Lines without the `data: ` prefix (blank separators, `event:` headers)
/// are dropped. The stream ends when the body ends; end-of-stream sentinels
/// inside payloads (`[DONE]`, `message_stop`) are the caller's concern.
pub(crate) fn data_frames(
    response: reqwest::Response,
) -> impl Stream<Item = ClientResult<String>> + Send {
    stream! {
        let mut body = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield Err(ClientError::new(ClientErrorKind::Stream(format!(
                        "Stream error: {}",
                        e
                    ))));
                    return;
                }
            };

            match std::str::from_utf8(&bytes) {
                Ok(text) => buffer.push_str(text),
                Err(e) => {
                    yield Err(ClientError::new(ClientErrorKind::Stream(format!(
                        "Invalid UTF-8: {}",
                        e
                    ))));
                    return;
                }
            }

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim_end_matches('\r').to_string();
                buffer.drain(..=pos);
                if let Some(data) = line.strip_prefix("data: ") {
                    yield Ok(data.to_string());
                }
            }
        }

        // Trailing payload without a final newline.
        let line = buffer.trim_end_matches('\r');
        if let Some(data) = line.strip_prefix("data: ") {
            yield Ok(data.to_string());
        }
    }
}

/// Parse one frame payload with the vendor's chunk schema, skipping frames
/// that fail to parse as structured data.
pub(crate) fn decode_frame<T: serde::de::DeserializeOwned>(payload: &str) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unparseable stream frame");
            None
        }
    }
}
