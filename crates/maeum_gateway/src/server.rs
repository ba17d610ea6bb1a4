use crate::error::ApiError;
use crate::types::{AnalyzeResponse, ChatTextRequest, DeletedResponse, RecommendQuery, TextInput};
use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use maeum_core::{
    AllRecommendations, Category, ConversationHistory, CoreError, GroupedRecommendations,
    IdentityVerifier, Recommendation,
};
use maeum_memory::{Diary, LoggedTurn};
use maeum_reasoning::{ConversationSession, DiaryJournal, JournalEntry, TurnContext, TurnOutcome};
use maeum_voice::{AudioFormat, AudioStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Uploaded recordings larger than this are refused.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub journal: DiaryJournal,
    pub session: Arc<ConversationSession>,
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Where synthesized replies are served from; `None` disables `/audio`.
    pub audio: Option<AudioStore>,
}

/// The user id behind a verified `Authorization: Bearer` token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;

        match state.verifier.verify(token).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(e) => {
                tracing::debug!("Token rejected: {:#}", e);
                Err(ApiError::Unauthorized("Invalid access token".into()))
            }
        }
    }
}

/// Every route of the journaling API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze/emotion", post(analyze_emotion))
        .route("/diary/text", post(write_diary))
        .route("/diary/list", get(list_diaries))
        .route("/diary/:id", get(get_diary).delete(delete_diary))
        .route("/diary/:id/history", get(diary_history))
        .route("/diary/:id/recommend", get(diary_recommend))
        .route("/recommend", get(recommend_all))
        .route("/recommend/grouped", get(recommend_grouped))
        .route("/recommend/:category", get(recommend_category))
        .route("/chat/text", post(chat_text))
        .route("/chat/upload", post(chat_upload))
        .route("/audio/:filename", get(get_audio))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The gateway HTTP server.
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        tracing::info!("Gateway listening on {}", listener.local_addr()?);
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Gateway server error")
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down gateway"),
        Err(e) => {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await
        }
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn analyze_emotion(
    State(state): State<AppState>,
    Json(input): Json<TextInput>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(CoreError::EmptyInput("text").into());
    }
    let emotions = state.journal.analyze(text).await?;
    Ok(Json(AnalyzeResponse {
        text: text.to_string(),
        emotions,
    }))
}

async fn write_diary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<TextInput>,
) -> Result<Json<JournalEntry>, ApiError> {
    if input.text.trim().is_empty() {
        return Err(CoreError::EmptyInput("text").into());
    }
    Ok(Json(state.journal.write(&user, &input.text).await?))
}

async fn list_diaries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Diary>>, ApiError> {
    Ok(Json(state.journal.store().list_diaries(&user).await?))
}

async fn owned_diary(state: &AppState, user: &str, id: i64) -> Result<Diary, ApiError> {
    state
        .journal
        .store()
        .get_diary(user, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Diary {} not found", id)))
}

async fn get_diary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Diary>, ApiError> {
    Ok(Json(owned_diary(&state, &user, id).await?))
}

async fn delete_diary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if !state.journal.store().delete_diary(&user, id).await? {
        return Err(ApiError::NotFound(format!("Diary {} not found", id)));
    }
    Ok(Json(DeletedResponse { id, deleted: true }))
}

/// The diary's full conversation log, oldest first.
async fn diary_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LoggedTurn>>, ApiError> {
    owned_diary(&state, &user, id).await?;
    Ok(Json(state.journal.store().load_log(id, usize::MAX).await?))
}

async fn diary_recommend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AllRecommendations>, ApiError> {
    state
        .journal
        .recommend_for_diary(&user, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Diary {} not found", id)))
}

async fn recommend_all(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Json<AllRecommendations> {
    Json(
        state
            .journal
            .matcher()
            .recommend_all(query.emotion.as_deref())
            .await,
    )
}

async fn recommend_grouped(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<GroupedRecommendations>, ApiError> {
    let bucket = query
        .emotion
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("emotion is required".into()))?;
    Ok(Json(
        state.journal.matcher().recommend_grouped(bucket.trim()).await?,
    ))
}

async fn recommend_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let category =
        Category::parse(&category).ok_or(CoreError::UnknownCategory(category))?;
    let items = state
        .journal
        .matcher()
        .recommend_shaped(category, query.emotion.as_deref(), query.limit)
        .await?;
    Ok(Json(items))
}

/// Diary-bound turns replay the stored log and require the diary's owner;
/// otherwise the client's inline history is used.
async fn turn_context(
    state: &AppState,
    user: Option<AuthUser>,
    diary_id: Option<i64>,
    history: ConversationHistory,
) -> Result<TurnContext, ApiError> {
    let Some(diary_id) = diary_id else {
        return Ok(TurnContext::inline(history));
    };
    let AuthUser(user) = user.ok_or_else(|| {
        ApiError::Unauthorized("A diary conversation requires a bearer token".into())
    })?;
    owned_diary(state, &user, diary_id).await?;
    Ok(TurnContext::for_diary(diary_id))
}

async fn chat_text(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(req): Json<ChatTextRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let ctx = turn_context(&state, user, req.diary_id, req.history).await?;
    let ctx = if req.speak { ctx.speaking() } else { ctx };
    Ok(Json(state.session.turn_text(&req.text, ctx).await?))
}

async fn chat_upload(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<TurnOutcome>, ApiError> {
    let mut audio: Option<(Vec<u8>, AudioFormat)> = None;
    let mut history = ConversationHistory::new();
    let mut diary_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let format = AudioFormat::detect(field.content_type(), field.file_name());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable audio: {}", e)))?;
                audio = Some((bytes.to_vec(), format));
            }
            "history" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable history: {}", e)))?;
                history = ConversationHistory::from_json_str_lenient(&raw);
            }
            "diary_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable diary_id: {}", e)))?;
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ApiError::BadRequest("diary_id must be an integer".into()))?;
                diary_id = Some(id);
            }
            other => tracing::debug!("Ignoring upload field '{}'", other),
        }
    }

    let (bytes, format) = audio.ok_or_else(|| ApiError::BadRequest("file is required".into()))?;
    let ctx = turn_context(&state, user, diary_id, history).await?;
    let outcome = state
        .session
        .turn_audio(&bytes, format, ctx.speaking())
        .await?;
    Ok(Json(outcome))
}

async fn get_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::NotFound(format!("Audio '{}' not found", filename));
    let Some(store) = &state.audio else {
        return Err(not_found());
    };
    // Names that are not plain file names count as missing
    let bytes = match store.load(&filename).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            tracing::debug!("Audio lookup refused: {:#}", e);
            return Err(not_found());
        }
    };
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenVerifier;
    use maeum_core::config::RecommendConfig;
    use maeum_core::LexiconClassifier;
    use maeum_memory::{CatalogMatcher, SqliteStore};
    use maeum_reasoning::llm::CompletionParams;
    use maeum_reasoning::providers::mock::MockProvider;
    use maeum_reasoning::{ModeDetector, PromptAssembler};

    struct DownClassifier;

    #[async_trait]
    impl maeum_core::EmotionClassifier for DownClassifier {
        async fn classify(&self, _text: &str) -> Result<maeum_core::ClassificationResult> {
            anyhow::bail!("classifier returned 503")
        }

        fn provider_name(&self) -> &'static str {
            "down"
        }
    }

    async fn state() -> AppState {
        state_with(Arc::new(LexiconClassifier::default())).await
    }

    async fn state_with(classifier: Arc<dyn maeum_core::EmotionClassifier>) -> AppState {
        let store = Arc::new(SqliteStore::new(":memory:").await.unwrap());
        store.seed_sample_catalog().await.unwrap();
        let matcher = CatalogMatcher::new(store.clone(), RecommendConfig::default());
        let journal = DiaryJournal::new(store.clone(), classifier, matcher);
        let session = ConversationSession::new(
            Arc::new(MockProvider::with_reply("mock", "괜찮아요.")),
            CompletionParams::default(),
            ModeDetector::keyword(),
            PromptAssembler::default(),
        )
        .with_store(store);
        AppState {
            journal,
            session: Arc::new(session),
            verifier: Arc::new(StaticTokenVerifier::single("token", "alice")),
            audio: None,
        }
    }

    fn user() -> AuthUser {
        AuthUser("alice".to_string())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let result = health().await;
        assert_eq!(result, "ok");
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_text() {
        let err = analyze_emotion(
            State(state().await),
            Json(TextInput { text: "  ".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "empty_input");
    }

    #[tokio::test]
    async fn test_classifier_outage_reports_stage() {
        let state = state_with(Arc::new(DownClassifier)).await;
        let input = || {
            Json(TextInput {
                text: "오늘 하루도 버텼다".into(),
            })
        };

        let err = analyze_emotion(State(state.clone()), input()).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
        assert_eq!(err.stage(), Some("classification"));

        let err = write_diary(State(state.clone()), user(), input())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
        assert_eq!(err.stage(), Some("classification"));
        assert!(state.journal.store().list_diaries("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_diary_lifecycle() {
        let state = state().await;
        let Json(entry) = write_diary(
            State(state.clone()),
            user(),
            Json(TextInput {
                text: "오늘은 정말 행복하고 기뻐".into(),
            }),
        )
        .await
        .unwrap();
        let id = entry.diary.id;

        let Json(list) = list_diaries(State(state.clone()), user()).await.unwrap();
        assert_eq!(list.len(), 1);

        let err = get_diary(State(state.clone()), AuthUser("mallory".into()), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);

        let Json(deleted) = delete_diary(State(state.clone()), user(), Path(id))
            .await
            .unwrap();
        assert!(deleted.deleted);
        assert!(delete_diary(State(state), user(), Path(id)).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_category_is_bad_request() {
        let err = recommend_category(
            State(state().await),
            Path("podcasts".to_string()),
            Query(RecommendQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "unknown_category");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grouped_requires_emotion() {
        let err = recommend_grouped(State(state().await), Query(RecommendQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }

    #[tokio::test]
    async fn test_diary_chat_requires_auth() {
        let req = ChatTextRequest {
            text: "안녕".into(),
            diary_id: Some(1),
            history: ConversationHistory::new(),
            speak: false,
        };
        let err = chat_text(State(state().await), None, Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    #[tokio::test]
    async fn test_audio_disabled_is_not_found() {
        match get_audio(State(state().await), Path("x.mp3".into())).await {
            Err(err) => assert_eq!(err.kind(), "not_found"),
            Ok(_) => panic!("audio served without a store"),
        }
    }
}
