//! Integration tests for the bilingual reader
//!
//! These tests drive the public API end to end: configuration selects a
//! provider, the controller extracts paragraphs from an in-memory chapter,
//! translates them against mocked HTTP endpoints and renders the result.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

use bilingual_reader::{
    Element, MemoryDocument, ModeController, ProviderKind, ReadingMode, RetryConfig,
    TextUnitExtractor, TranslateError, TranslatorConfig,
};

// ==================== Test Helpers ====================

const CHAPTER: [&str; 3] = [
    "The lighthouse keeper climbed the stairs.",
    "Below him the sea was grey and restless.",
    "He lit the lamp and waited for the ships.",
];

/// LibreTranslate-style responder that tags the submitted text.
struct LibreEcho;

impl Respond for LibreEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400).set_body_string("bad json"),
        };
        let q = body["q"].as_str().unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({ "translatedText": format!("[zh] {}", q) }))
    }
}

/// Google `translate_a/single`-style responder, splitting the text into two segments.
struct GoogleEcho;

impl Respond for GoogleEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let q = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!([
            [["[zh] ", "", null, null, 1], [q.clone(), q, null, null, 1]],
            null,
            "en"
        ]))
    }
}

fn fallback_config(endpoints: Vec<String>) -> TranslatorConfig {
    TranslatorConfig {
        provider: ProviderKind::Fallback,
        endpoints,
        request_timeout: Duration::from_secs(5),
        yield_pause: Duration::from_millis(1),
        ..TranslatorConfig::default()
    }
}

fn units(document: &MemoryDocument) -> Vec<bilingual_reader::TextUnit> {
    TextUnitExtractor::default().extract(document)
}

// ==================== Fallback Chain Flow ====================

#[tokio::test]
async fn test_fallback_chain_translates_then_reuses_cache() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/down/translate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/up/translate"))
        .respond_with(LibreEcho)
        .expect(3)
        .mount(&server)
        .await;

    let config = fallback_config(vec![
        format!("{}/down/translate", server.uri()),
        format!("{}/up/translate", server.uri()),
    ]);
    let controller = ModeController::from_config(&config).unwrap();
    let document = MemoryDocument::from_paragraphs(CHAPTER);

    let translated = controller
        .switch_mode(ReadingMode::Translated, &document, &document)
        .await
        .unwrap();
    assert_eq!(translated.fetched(), 3);

    for unit in units(&document) {
        assert!(!document.is_original_visible(unit.anchor));
        assert_eq!(
            document.translation(unit.anchor),
            Some(format!("[zh] {}", unit.source_text))
        );
    }

    // Bilingual and back to original are served without further requests
    let bilingual = controller
        .switch_mode(ReadingMode::Bilingual, &document, &document)
        .await
        .unwrap();
    assert_eq!(bilingual.hits(), 3);

    controller
        .switch_mode(ReadingMode::Original, &document, &document)
        .await
        .unwrap();
    assert_eq!(document.translation_count(), 0);

    let metrics = controller.metrics().report();
    assert_eq!(metrics.api_calls, 3);
    assert_eq!(metrics.cache_hits, 3);
    assert_eq!(metrics.cache_hit_rate, 50.0);
}

#[tokio::test]
async fn test_exhausted_chain_leaves_originals_with_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/a/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid API key"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b/translate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = fallback_config(vec![
        format!("{}/a/translate", server.uri()),
        format!("{}/b/translate", server.uri()),
    ]);
    let controller = ModeController::from_config(&config).unwrap();
    let document = MemoryDocument::from_paragraphs(CHAPTER);

    let report = controller
        .switch_mode(ReadingMode::Translated, &document, &document)
        .await
        .unwrap();

    assert_eq!(report.failures(), 3);
    assert_eq!(controller.mode(), ReadingMode::Translated);
    for unit in units(&document) {
        assert!(document.is_original_visible(unit.anchor));
        assert_eq!(document.translation(unit.anchor), None);

        let error = document.error(unit.anchor).unwrap();
        assert!(error.contains("API key required"));
        assert!(error.contains("HTTP 500: boom"));
    }
}

// ==================== Direct Provider Flow ====================

#[tokio::test]
async fn test_direct_provider_bilingual_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .respond_with(GoogleEcho)
        .expect(3)
        .mount(&server)
        .await;

    let config = TranslatorConfig {
        provider: ProviderKind::Direct,
        direct_url: format!("{}/translate_a/single", server.uri()),
        request_timeout: Duration::from_secs(5),
        ..TranslatorConfig::default()
    };
    let controller = ModeController::from_config(&config).unwrap();
    let document = MemoryDocument::from_paragraphs(CHAPTER);

    controller
        .switch_mode(ReadingMode::Bilingual, &document, &document)
        .await
        .unwrap();

    for unit in units(&document) {
        assert!(document.is_original_visible(unit.anchor));
        assert_eq!(
            document.translation(unit.anchor),
            Some(format!("[zh] {}", unit.source_text))
        );
    }
}

// ==================== Page Structure ====================

#[tokio::test]
async fn test_only_chapter_body_is_sent_for_translation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(LibreEcho)
        .expect(2)
        .mount(&server)
        .await;

    let document = MemoryDocument::new();
    let root = document.root();
    let preface = document.append(root, Element::new("div").class("preface"));
    let summary = document.append(preface, Element::new("blockquote").class("userstuff"));
    document.append(summary, Element::paragraph("Summary paragraph, not the story."));

    let chapters = document.append(root, Element::new("div").id("chapters"));
    let body = document.append(chapters, Element::new("div").class("userstuff"));
    document.append(body, Element::paragraph("First line of the story."));
    document.append(body, Element::paragraph("~"));
    document.append(body, Element::paragraph("Second line of the story."));
    let end_notes = document.append(chapters, Element::new("div").class("notes"));
    document.append(end_notes, Element::paragraph("See the end of the chapter for notes."));

    let controller = ModeController::from_config(&fallback_config(vec![server.uri()])).unwrap();
    let report = controller
        .switch_mode(ReadingMode::Translated, &document, &document)
        .await
        .unwrap();

    assert_eq!(report.fetched(), 2);
    assert_eq!(document.translation_count(), 2);
}

#[tokio::test]
async fn test_empty_page_reports_extraction_empty() {
    let controller = ModeController::from_config(&TranslatorConfig::default()).unwrap();
    let document = MemoryDocument::new();

    let result = controller
        .switch_mode(ReadingMode::Translated, &document, &document)
        .await;

    assert_eq!(result, Err(TranslateError::ExtractionEmpty));
    assert_eq!(controller.mode(), ReadingMode::Translated);
}

#[tokio::test]
async fn test_extraction_retry_picks_up_late_content() {
    let document = MemoryDocument::new();
    let retry = RetryConfig::new(2, Duration::from_millis(100));
    let extractor = TextUnitExtractor::default();

    let (units, _) = tokio::join!(extractor.extract_with_retry(&document, &retry), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let chapters = document.append(document.root(), Element::new("div").id("chapters"));
        let body = document.append(chapters, Element::new("div").class("userstuff"));
        document.append(body, Element::paragraph("Rendered a little late."));
    });

    let units = units.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source_text, "Rendered a little late.");
}

#[tokio::test]
async fn test_translations_stay_with_their_paragraphs_when_page_changes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(LibreEcho)
        .expect(3)
        .mount(&server)
        .await;

    let config = fallback_config(vec![format!("{}/translate", server.uri())]);
    let controller = ModeController::from_config(&config).unwrap();
    let document = MemoryDocument::from_paragraphs(CHAPTER);
    let before = units(&document);

    controller
        .switch_mode(ReadingMode::Bilingual, &document, &document)
        .await
        .unwrap();
    document.detach(before[0].anchor);
    controller
        .switch_mode(ReadingMode::Original, &document, &document)
        .await
        .unwrap();
    let report = controller
        .switch_mode(ReadingMode::Bilingual, &document, &document)
        .await
        .unwrap();

    assert_eq!(report.hits(), 2);
    assert_eq!(report.fetched(), 0);
    for unit in &before[1..] {
        assert_eq!(
            document.translation(unit.anchor),
            Some(format!("[zh] {}", unit.source_text))
        );
    }
}

// ==================== Text Loading ====================

#[tokio::test]
async fn test_plain_text_chapter_round_trip_through_modes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(LibreEcho)
        .mount(&server)
        .await;

    let text = "Chapter One\n\nThe first paragraph\nwraps over two lines.\n\n***\n\nThe last paragraph.\n";
    let document = MemoryDocument::from_text(text);
    let controller = ModeController::from_config(&fallback_config(vec![server.uri()])).unwrap();

    controller
        .switch_mode(ReadingMode::Translated, &document, &document)
        .await
        .unwrap();

    let units = units(&document);
    let sources: Vec<&str> = units.iter().map(|u| u.source_text.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            "Chapter One",
            "The first paragraph wraps over two lines.",
            "***",
            "The last paragraph."
        ]
    );
    assert_eq!(
        document.translation(units[1].anchor).as_deref(),
        Some("[zh] The first paragraph wraps over two lines.")
    );

    controller.reset(&document, &document);
    assert_eq!(controller.mode(), ReadingMode::Original);
    assert_eq!(document.translation_count(), 0);
    assert_eq!(controller.cache_len(), 0);
}
