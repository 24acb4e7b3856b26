//! Referer inference.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::header::REFERER;

use super::History;
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};
use crate::utils::common_prefix_len;

/// Sets `Referer` to the previously visited page when the new URL plausibly
/// appears in that page.
///
/// The part of the new URL after its common prefix with the previous page's
/// URL (minus its last character) must occur literally in the previous body.
/// This is a loose text match, not link extraction.
pub struct Referer {
    history: Arc<History>,
}

impl Referer {
    /// Infers referers from the current page of `history`.
    pub fn new(history: Arc<History>) -> Self {
        Self { history }
    }
}

/// Part of `url` that follows its common prefix with `previous`, without the
/// final character of `url`.
pub(crate) fn distinct_suffix<'a>(previous: &str, url: &'a str) -> &'a str {
    let start = common_prefix_len(previous, url);
    let end = url.char_indices().last().map_or(0, |(i, _)| i);
    url.get(start..end).unwrap_or("")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[async_trait]
impl Handler for Referer {
    fn name(&self) -> &str {
        "referer"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        if let Some(last) = self.history.last() {
            let previous = last.response.final_url();
            let previous = if previous.is_empty() {
                last.request.url.as_str()
            } else {
                previous
            };
            let suffix = distinct_suffix(previous, &request.url);
            // An unreadable previous body just means no match
            let matched = match last.response.bytes().await {
                Ok(body) => contains(body, suffix.as_bytes()),
                Err(_) => false,
            };
            if matched {
                debug!("Referer for {}: {}", request.url, previous);
                request.set_header(REFERER, previous)?;
            }
        }
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryLimit;
    use crate::handler::Pipeline;
    use crate::handlers::HistoryEntry;

    struct EchoReferer;

    #[async_trait]
    impl Handler for EchoReferer {
        fn name(&self) -> &str {
            "echo-referer"
        }

        async fn handle(&self, request: Request, _next: Next<'_>) -> Result<Response, FetchError> {
            let referer = request.header(REFERER).unwrap_or_default().to_string();
            Ok(Response::from_body(&request.url, &request.url, 200, referer))
        }
    }

    fn setup(previous_url: Option<&str>, previous_body: &str) -> Pipeline {
        let history = Arc::new(History::new(HistoryLimit::Unbounded));
        if let Some(url) = previous_url {
            history.push(HistoryEntry {
                request: Request::new(url),
                response: Response::from_body(url, url, 200, previous_body.to_string()),
            });
        }
        Pipeline::chain(vec![
            Arc::new(Referer::new(history)) as Arc<dyn Handler>,
            Arc::new(EchoReferer),
        ])
    }

    async fn referer_for(pipeline: &Pipeline, url: &str) -> String {
        pipeline.handle(Request::new(url)).await.unwrap().text().await.unwrap()
    }

    #[test]
    fn test_distinct_suffix() {
        assert_eq!(
            distinct_suffix("http://a.com/list", "http://a.com/item/42"),
            "item/4"
        );
        assert_eq!(distinct_suffix("http://a.com/x", "http://a.com/x"), "");
        assert_eq!(distinct_suffix("http://a.com/xyz", "http://a.com/x"), "");
        assert_eq!(distinct_suffix("", ""), "");
    }

    #[tokio::test]
    async fn test_referer_set_when_link_found() {
        let pipeline = setup(
            Some("http://a.com/list"),
            r#"<a href="/item/42">item</a>"#,
        );
        assert_eq!(
            referer_for(&pipeline, "http://a.com/item/42").await,
            "http://a.com/list"
        );
    }

    #[tokio::test]
    async fn test_no_referer_when_link_absent() {
        let pipeline = setup(Some("http://a.com/list"), "<p>nothing here</p>");
        assert_eq!(referer_for(&pipeline, "http://a.com/item/42").await, "");
    }

    #[tokio::test]
    async fn test_no_referer_without_history() {
        let pipeline = setup(None, "");
        assert_eq!(referer_for(&pipeline, "http://a.com/item/42").await, "");
    }
}
