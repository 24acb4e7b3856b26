//! Lazily materialized response body.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::error_handling::{categorize_reqwest_error, FetchError};

/// Response content, read from the network at most once.
///
/// Clones share both the pending stream and the materialized bytes, so a copy
/// kept by the history log sees the body read through any other copy. The
/// stream is dropped (releasing the connection) as soon as it has been read,
/// or when the last clone goes away unread.
#[derive(Clone)]
pub(crate) struct Body {
    content: Arc<OnceCell<Vec<u8>>>,
    pending: Arc<Mutex<Option<reqwest::Response>>>,
}

impl Body {
    pub(crate) fn ready(content: Vec<u8>) -> Self {
        Self {
            content: Arc::new(OnceCell::new_with(Some(content))),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn streaming(response: reqwest::Response) -> Self {
        Self {
            content: Arc::new(OnceCell::new()),
            pending: Arc::new(Mutex::new(Some(response))),
        }
    }

    pub(crate) fn loaded(&self) -> Option<&[u8]> {
        self.content.get().map(Vec::as_slice)
    }

    pub(crate) async fn read(&self, url: &str) -> Result<&[u8], FetchError> {
        let content = self
            .content
            .get_or_try_init(|| async {
                // Guard released before awaiting the network read
                let response = self
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                match response {
                    Some(response) => response
                        .bytes()
                        .await
                        .map(|bytes| bytes.to_vec())
                        .map_err(|e| categorize_reqwest_error(url, e)),
                    None => Err(FetchError::Other {
                        url: url.to_string(),
                        message: "response body is no longer available".to_string(),
                    }),
                }
            })
            .await?;
        Ok(content.as_slice())
    }
}
