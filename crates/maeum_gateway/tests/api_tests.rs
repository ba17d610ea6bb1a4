//! End-to-end tests against a gateway bound to an ephemeral port.
//!
//! The completion, transcription and synthesis services are scripted fakes;
//! storage is a seeded in-memory SQLite database.

use anyhow::Result;
use async_trait::async_trait;
use maeum_core::config::RecommendConfig;
use maeum_core::{ClassificationResult, EmotionClassifier, LexiconClassifier};
use maeum_gateway::{router, AppState, StaticTokenVerifier};
use maeum_memory::{CatalogMatcher, SqliteStore};
use maeum_reasoning::llm::CompletionParams;
use maeum_reasoning::providers::MockProvider;
use maeum_reasoning::{ConversationSession, DiaryJournal, ModeDetector, PromptAssembler};
use maeum_voice::{AudioFormat, AudioStore, SpeechToText, TextToSpeech, VoiceStyle};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

const TOKEN: &str = "test-token";

struct FakeStt;

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio: &[u8], format: AudioFormat) -> Result<String> {
        match format {
            AudioFormat::M4a => anyhow::bail!("recognizer returned 500"),
            _ => Ok("냉정하게 말해줘".to_string()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

struct FakeTts;

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, _text: &str, _style: VoiceStyle) -> Result<Vec<u8>> {
        Ok(b"ID3-fake-mp3".to_vec())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

struct DownClassifier;

#[async_trait]
impl EmotionClassifier for DownClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        anyhow::bail!("inference server unavailable")
    }

    fn provider_name(&self) -> &'static str {
        "down"
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    _audio_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Arc::new(LexiconClassifier::default())).await
    }

    async fn start_with(classifier: Arc<dyn EmotionClassifier>) -> Self {
        let audio_dir = tempfile::TempDir::new().unwrap();
        let audio = AudioStore::open(audio_dir.path()).await.unwrap();

        let store = Arc::new(SqliteStore::new(":memory:").await.unwrap());
        store.seed_sample_catalog().await.unwrap();
        let matcher = CatalogMatcher::new(store.clone(), RecommendConfig::default());
        let journal = DiaryJournal::new(store.clone(), classifier, matcher);
        let session = ConversationSession::new(
            Arc::new(MockProvider::with_reply("mock", "차근차근 정리해 봐요.")),
            CompletionParams::default(),
            ModeDetector::keyword(),
            PromptAssembler::default(),
        )
        .with_store(store)
        .with_speech_to_text(Arc::new(FakeStt))
        .with_text_to_speech(Arc::new(FakeTts), audio.clone());

        let state = AppState {
            journal,
            session: Arc::new(session),
            verifier: Arc::new(StaticTokenVerifier::single(TOKEN, "alice@example.com")),
            audio: Some(audio),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _audio_dir: audio_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn write_diary(&self, text: &str) -> i64 {
        let body: Value = self
            .client
            .post(self.url("/diary/text"))
            .bearer_auth(TOKEN)
            .json(&json!({ "text": text }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["diary"]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_analyze_emotion() {
    let server = TestServer::start().await;
    let body: Value = server
        .client
        .post(server.url("/analyze/emotion"))
        .json(&json!({ "text": "오늘 정말 행복했어" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["emotions"][0]["label"], "기쁨");

    let resp = server
        .client
        .post(server.url("/analyze/emotion"))
        .json(&json!({ "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "empty_input");
}

#[tokio::test]
async fn test_classifier_outage_on_diary_write() {
    let server = TestServer::start_with(Arc::new(DownClassifier)).await;
    let resp = server
        .client
        .post(server.url("/diary/text"))
        .bearer_auth(TOKEN)
        .json(&json!({ "text": "오늘은 조금 지쳤어" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "upstream");
    assert_eq!(body["error"]["stage"], "classification");

    let list: Value = server
        .client
        .get(server.url("/diary/list"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_diary_routes_require_token() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/diary/list")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .client
        .get(server.url("/diary/list"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "unauthorized");
}

#[tokio::test]
async fn test_diary_crud_and_recommend() {
    let server = TestServer::start().await;
    let id = server.write_diary("너무 우울하고 외로운 하루").await;

    let list: Value = server
        .client
        .get(server.url("/diary/list"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let recs: Value = server
        .client
        .get(server.url(&format!("/diary/{}/recommend", id)))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(recs["movies"].as_array().unwrap().len() <= 5);

    let resp = server
        .client
        .delete(server.url(&format!("/diary/{}", id)))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .get(server.url(&format!("/diary/{}", id)))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommend_routes() {
    let server = TestServer::start().await;

    let all: Value = server
        .client
        .get(server.url("/recommend?emotion=기쁨"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["emotion"], "기쁨");

    let resp = server
        .client
        .get(server.url("/recommend/podcasts"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let books: Value = server
        .client
        .get(server.url("/recommend/books?limit=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(books.as_array().unwrap().len() <= 1);

    let resp = server
        .client
        .get(server.url("/recommend/grouped?emotion=놀람"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "unknown_bucket");

    let grouped: Value = server
        .client
        .get(server.url("/recommend/grouped?emotion=슬픔"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(grouped["emotion"], "sadness");
    assert!(grouped.get("books").is_some());
}

#[tokio::test]
async fn test_chat_text_inline_history() {
    let server = TestServer::start().await;
    let body: Value = server
        .client
        .post(server.url("/chat/text"))
        .json(&json!({
            "text": "그래서 어떻게 해야 할까",
            "history": [
                {"user_input": "이성적으로 봐줘", "response": "네", "mode": "T"},
                "garbage"
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["mode"], "T");
    assert_eq!(body["response"], "차근차근 정리해 봐요.");
    assert_eq!(body["persisted"], false);
}

#[tokio::test]
async fn test_chat_text_in_diary_is_logged() {
    let server = TestServer::start().await;
    let id = server.write_diary("회사에서 속상한 일이 있었어").await;

    let resp = server
        .client
        .post(server.url("/chat/text"))
        .json(&json!({ "text": "위로해줘", "diary_id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = server
        .client
        .post(server.url("/chat/text"))
        .bearer_auth(TOKEN)
        .json(&json!({ "text": "위로해줘", "diary_id": id, "speak": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["mode"], "F");
    assert_eq!(body["persisted"], true);
    let audio_url = body["audio_url"].as_str().unwrap().to_string();

    let history: Value = server
        .client
        .get(server.url(&format!("/diary/{}/history", id)))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["user_input"], "위로해줘");
    assert_eq!(turns[0]["audio_url"], audio_url.as_str());

    let resp = server.client.get(server.url(&audio_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "audio/mpeg");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"ID3-fake-mp3");
}

#[tokio::test]
async fn test_chat_upload() {
    let server = TestServer::start().await;
    let part = reqwest::multipart::Part::bytes(b"fLaC-data".to_vec())
        .file_name("voice.flac")
        .mime_str("audio/flac")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("history", "[]");

    let body: Value = server
        .client
        .post(server.url("/chat/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["input"], "냉정하게 말해줘");
    assert_eq!(body["mode"], "T");
    assert!(body["audio_url"].as_str().unwrap().starts_with("/audio/"));
}

#[tokio::test]
async fn test_chat_upload_transcription_failure() {
    let server = TestServer::start().await;
    let part = reqwest::multipart::Part::bytes(b"m4a-data".to_vec()).file_name("voice.m4a");
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = server
        .client
        .post(server.url("/chat/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["stage"], "transcription");

    let form = reqwest::multipart::Form::new().text("history", "[]");
    let resp = server
        .client
        .post(server.url("/chat/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audio_rejects_traversal() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/audio/..secret.mp3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
