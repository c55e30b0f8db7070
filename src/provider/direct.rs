//! Single free translation endpoint (Google `translate_a/single`, `client=gtx`).

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{build_client, classify_send_error, read_body, Translate};
use crate::error::{EndpointFailure, FailureCause, TranslateError, TranslateResult};

pub const DEFAULT_DIRECT_URL: &str = "https://translate.googleapis.com/translate_a/single";

pub struct DirectProvider {
    client: reqwest::Client,
    base_url: String,
    source_lang: String,
    target_lang: String,
    timeout: Duration,
}

impl DirectProvider {
    pub fn new(
        base_url: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> TranslateResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            timeout,
        })
    }

    async fn request(&self, text: &str) -> Result<String, FailureCause> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.timeout))?;

        let body = read_body(response, self.timeout).await?;
        parse_segments(&body)
    }
}

/// Concatenate the translated segments of a `[[[segment, source, ...], ...], ...]` body.
fn parse_segments(body: &str) -> Result<String, FailureCause> {
    let data: Value =
        serde_json::from_str(body).map_err(|e| FailureCause::Malformed(e.to_string()))?;

    let Some(segments) = data.get(0).and_then(Value::as_array) else {
        let preview: String = body.chars().take(200).collect();
        warn!("Unexpected translation response shape: {}", preview);
        return Err(FailureCause::Malformed(
            "expected a nested array of translated segments".to_string(),
        ));
    };

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(FailureCause::Empty);
    }
    Ok(translated)
}

#[async_trait]
impl Translate for DirectProvider {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        debug!("Requesting translation of {} chars from {}", text.len(), self.base_url);

        self.request(text)
            .await
            .map_err(|cause| EndpointFailure::new(&self.base_url, cause).into())
    }

    fn provider_name(&self) -> &str {
        "Google Translate (free endpoint)"
    }
}

impl std::fmt::Debug for DirectProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectProvider")
            .field("base_url", &self.base_url)
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, timeout: Duration) -> DirectProvider {
        let url = format!("{}/translate_a/single", server.uri());
        DirectProvider::new(&url, "en", "zh", timeout).unwrap()
    }

    #[test]
    fn test_parse_segments_concatenates_in_order() {
        let body = r#"[[["你好，","Hello, ",null,null,1],["世界","world",null,null,1]],null,"en"]"#;
        assert_eq!(parse_segments(body).unwrap(), "你好，世界");
    }

    #[test]
    fn test_parse_segments_skips_non_string_segments() {
        let body = r#"[[["一",null],[null,"x"],["二","y"]]]"#;
        assert_eq!(parse_segments(body).unwrap(), "一二");
    }

    #[test]
    fn test_parse_segments_rejects_bad_shape() {
        assert!(matches!(
            parse_segments(r#"{"sentences": []}"#),
            Err(FailureCause::Malformed(_))
        ));
        assert!(matches!(
            parse_segments("not json"),
            Err(FailureCause::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_segments_empty_translation() {
        assert_eq!(parse_segments(r#"[[["  ","a"]]]"#), Err(FailureCause::Empty));
        assert_eq!(parse_segments("[[]]"), Err(FailureCause::Empty));
    }

    #[tokio::test]
    async fn test_translate_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("client", "gtx"))
            .and(query_param("sl", "en"))
            .and(query_param("tl", "zh"))
            .and(query_param("dt", "t"))
            .and(query_param("q", "hello & goodbye"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([[["你好和再见", "hello & goodbye", null, null, 1]], null, "en"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server, Duration::from_secs(5))
            .translate("hello & goodbye")
            .await
            .unwrap();
        assert_eq!(result, "你好和再见");
    }

    #[tokio::test]
    async fn test_translate_single_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "hello"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[[["你好","hello",null,null,1]],null,"en"]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server, Duration::from_secs(5))
            .translate("hello")
            .await
            .unwrap();
        assert_eq!(result, "你好");
    }

    #[tokio::test]
    async fn test_translate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let error = provider(&server, Duration::from_secs(5))
            .translate("hello")
            .await
            .unwrap_err();
        match error {
            TranslateError::ProviderHttp { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Too Many Requests");
            }
            other => panic!("expected ProviderHttp, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([[["慢", "slow"]]]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let error = provider(&server, Duration::from_millis(100))
            .translate("slow")
            .await
            .unwrap_err();
        assert!(
            matches!(error, TranslateError::ProviderTimeout { .. }),
            "got {:?}",
            error
        );
    }

    #[tokio::test]
    async fn test_translate_network_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let provider =
            DirectProvider::new("http://127.0.0.1:9/single", "en", "zh", Duration::from_secs(2))
                .unwrap();
        let error = provider.translate("hello").await.unwrap_err();
        assert!(
            matches!(error, TranslateError::ProviderNetwork { .. }),
            "got {:?}",
            error
        );
    }

    #[tokio::test]
    async fn test_translate_empty_input() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let error = provider(&server, Duration::from_secs(5))
            .translate("   ")
            .await
            .unwrap_err();
        assert_eq!(error, TranslateError::EmptyInput);
    }

    #[tokio::test]
    async fn test_translate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&server)
            .await;

        let error = provider(&server, Duration::from_secs(5))
            .translate("hello")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            TranslateError::ProviderMalformedResponse { .. }
        ));
    }
}
