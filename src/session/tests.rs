use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::core::category::{category_from_answer, Category};
use crate::core::chat::{ChatLog, ChatTurn, MAX_TURNS};
use crate::core::error::{InputKind, RemoteError, SessionError, StorageError};
use crate::core::service::*;
use crate::core::store::{KeyValueStore, CHAT_HISTORY_KEY, THEME_KEY};
use crate::core::surface::{ApiStatus, ChatSurface};
use crate::core::theme::Theme;
use crate::providers::HttpExpenseService;
use crate::storage::MemoryStore;

#[derive(Debug, Clone, PartialEq)]
enum Drawn {
    Turn(String, Option<Category>),
    Notice(String),
    History(usize),
    Status(ApiStatus),
    Theme(Theme),
    Clear,
}

#[derive(Default)]
struct RecordingSurface {
    drawn: Mutex<Vec<Drawn>>,
}

impl RecordingSurface {
    fn drawn(&self) -> Vec<Drawn> {
        self.drawn.lock().unwrap().clone()
    }

    fn push(&self, d: Drawn) {
        self.drawn.lock().unwrap().push(d);
    }
}

impl ChatSurface for RecordingSurface {
    fn show_turn(&self, turn: &ChatTurn, category: Option<Category>) {
        self.push(Drawn::Turn(turn.question().to_string(), category));
    }
    fn notify(&self, message: &str) {
        self.push(Drawn::Notice(message.to_string()));
    }
    fn show_history(&self, log: &ChatLog) {
        self.push(Drawn::History(log.len()));
    }
    fn show_status(&self, status: ApiStatus) {
        self.push(Drawn::Status(status));
    }
    fn apply_theme(&self, theme: Theme) {
        self.push(Drawn::Theme(theme));
    }
    fn clear(&self) {
        self.push(Drawn::Clear);
    }
}

/// Service stub with canned results and a call counter.
struct StubService {
    categorize: Result<CategorizeResponse, RemoteError>,
    query: Result<QueryResponse, RemoteError>,
    online: bool,
    calls: AtomicUsize,
}

impl StubService {
    fn offline() -> Self {
        Self {
            categorize: Err(RemoteError::Http("connection refused".into())),
            query: Err(RemoteError::Http("connection refused".into())),
            online: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn online(categorize: CategorizeResponse, query: QueryResponse) -> Self {
        Self {
            categorize: Ok(categorize),
            query: Ok(query),
            online: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ExpenseService for StubService {
    async fn categorize(&self, _description: &str) -> Result<CategorizeResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.categorize.clone()
    }
    async fn query(&self, _query: &str) -> Result<QueryResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.query.clone()
    }
    async fn probe(&self) -> bool {
        self.online
    }
    fn base_url(&self) -> &str {
        "http://stub"
    }
}

/// Store that counts writes and can be told to fail them.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_writes: bool,
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StorageError::Database("quota exceeded".into()));
        }
        self.inner.set(key, value).await
    }
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

fn session_with(
    service: StubService,
    store: Arc<CountingStore>,
) -> (ChatSession, Arc<StubService>, Arc<RecordingSurface>) {
    let service = Arc::new(service);
    let surface = Arc::new(RecordingSurface::default());
    let session = ChatSession::new(service.clone(), store, surface.clone());
    (session, service, surface)
}

#[tokio::test]
async fn test_submit_expense_remote_success() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, surface) = session_with(
        StubService::online(
            CategorizeResponse {
                category: Some(Category::Travel),
                message: Some("Using local categorization:".into()),
            },
            QueryResponse::default(),
        ),
        store.clone(),
    );

    let outcome = session.submit_expense("  Hotel in Rome ").await.unwrap();
    assert_eq!(outcome.category, Some(Category::Travel));
    assert_eq!(outcome.turn.question(), "Hotel in Rome");
    assert_eq!(
        outcome.turn.answer(),
        r#"Using local categorization: <span class="category-tag">travel</span>"#
    );
    assert_eq!(session.log().len(), 1);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert!(surface
        .drawn()
        .contains(&Drawn::Turn("Hotel in Rome".into(), Some(Category::Travel))));
}

#[tokio::test]
async fn test_submit_expense_remote_without_category_or_message() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(
        StubService::online(CategorizeResponse::default(), QueryResponse::default()),
        store,
    );

    let outcome = session.submit_expense("Coffee with Sam").await.unwrap();
    assert_eq!(outcome.category, Some(Category::Food));
    assert_eq!(
        outcome.turn.answer(),
        r#"I've categorized this as: <span class="category-tag">food</span>"#
    );
}

#[tokio::test]
async fn test_submit_expense_fallback_matches_classifier() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());

    for (input, expected) in [
        ("Dinner at an Italian restaurant", Category::Food),
        ("Monthly Netflix subscription", Category::Entertainment),
        ("Uber ride to airport", Category::Transportation),
    ] {
        let outcome = session.submit_expense(input).await.unwrap();
        assert_eq!(outcome.category, Some(expected));
        assert_eq!(category_from_answer(outcome.turn.answer()), Some(expected));
        assert!(outcome.turn.answer().starts_with("I've categorized this as:"));
    }
    assert_eq!(session.log().len(), 3);
    assert_eq!(store.writes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_expense_rejected() {
    let store = Arc::new(CountingStore::default());
    let (mut session, svc, surface) = session_with(StubService::offline(), store.clone());

    let err = session.submit_expense("   \t\n").await.unwrap_err();
    assert_eq!(
        err,
        SessionError::EmptyInput {
            kind: InputKind::Expense
        }
    );
    assert!(session.log().is_empty());
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        surface.drawn(),
        vec![Drawn::Notice("Please enter an expense description.".into())]
    );
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());

    let err = session.submit_query("").await.unwrap_err();
    assert_eq!(
        err,
        SessionError::EmptyInput {
            kind: InputKind::Query
        }
    );
    assert!(session.log().is_empty());
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_query_responses() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(
        StubService::online(
            CategorizeResponse::default(),
            QueryResponse {
                response: Some("Track every expense.".into()),
            },
        ),
        store.clone(),
    );
    let outcome = session.submit_query("How do I budget?").await.unwrap();
    assert_eq!(outcome.turn.answer(), "Track every expense.");
    assert_eq!(outcome.category, None);

    let (mut session, _svc, _surface) = session_with(
        StubService::online(
            CategorizeResponse::default(),
            QueryResponse {
                response: Some(String::new()),
            },
        ),
        store,
    );
    let outcome = session.submit_query("?").await.unwrap();
    assert_eq!(outcome.turn.answer(), "I'm not sure how to answer that.");
}

#[tokio::test]
async fn test_submit_query_apologies() {
    let svc = StubService {
        query: Err(RemoteError::Api {
            status: 503,
            message: String::new(),
        }),
        ..StubService::offline()
    };
    assert_eq!(
        answer_query(&svc, "q").await,
        "I'm currently unable to process your query due to connection issues. Please try again later."
    );

    let svc = StubService::offline();
    assert_eq!(
        answer_query(&svc, "q").await,
        "I'm currently unable to process your query. Please check your internet connection and try again."
    );

    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());
    session.submit_query("Is rent a fixed cost?").await.unwrap();
    assert_eq!(session.log().len(), 1);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_log_bounded_through_session() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());

    for i in 0..=MAX_TURNS {
        session.submit_expense(&format!("lunch {i}")).await.unwrap();
    }
    assert_eq!(session.log().len(), MAX_TURNS);
    assert_eq!(session.log().get(0).unwrap().question(), "lunch 1");

    let stored = restore_log(store.as_ref()).await;
    assert_eq!(&stored, session.log());
}

#[tokio::test]
async fn test_failed_write_keeps_memory_log() {
    let store = Arc::new(CountingStore {
        fail_writes: true,
        ..Default::default()
    });
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());

    session.submit_expense("Doctor visit").await.unwrap();
    assert_eq!(session.log().len(), 1);
    assert_eq!(store.get(CHAT_HISTORY_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_restore_round_trip() {
    let store = Arc::new(CountingStore::default());
    let (mut first, _svc, _surface) = session_with(StubService::offline(), store.clone());
    first.submit_expense("Train ticket").await.unwrap();
    first.submit_query("Any tips?").await.unwrap();

    let (mut second, _svc, _surface) = session_with(StubService::offline(), store.clone());
    let restored = second.restore_session().await.clone();
    assert_eq!(&restored, first.log());
    assert_eq!(restored.get(1).unwrap().question(), "Any tips?");
}

#[tokio::test]
async fn test_restore_corrupted_history() {
    let store = Arc::new(CountingStore::default());
    store.set(CHAT_HISTORY_KEY, "{definitely not json").await.unwrap();

    let (mut session, _svc, _surface) = session_with(StubService::offline(), store.clone());
    assert!(session.restore_session().await.is_empty());
    assert_eq!(store.get(CHAT_HISTORY_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_reset_persists_empty_log() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, surface) = session_with(StubService::offline(), store.clone());
    session.submit_expense("Rent for May").await.unwrap();

    session.reset_session().await;
    assert!(session.log().is_empty());
    assert_eq!(store.get(CHAT_HISTORY_KEY).await.unwrap().as_deref(), Some("[]"));
    assert!(restore_log(store.as_ref()).await.is_empty());

    let drawn = surface.drawn();
    assert_eq!(&drawn[drawn.len() - 2..], &[Drawn::Clear, Drawn::History(0)]);
}

#[tokio::test]
async fn test_theme_toggle_and_restore() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, surface) = session_with(StubService::offline(), store.clone());
    assert_eq!(session.theme(), Theme::Dark);

    assert_eq!(session.toggle_theme().await, Theme::Light);
    assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));
    assert!(surface.drawn().contains(&Drawn::Theme(Theme::Light)));

    let (mut other, _svc, _surface) = session_with(StubService::offline(), store.clone());
    assert_eq!(other.restore_theme().await, Theme::Light);

    store.set(THEME_KEY, "neon").await.unwrap();
    let (mut third, _svc, _surface) = session_with(StubService::offline(), store);
    assert_eq!(third.restore_theme().await, Theme::Dark);
}

#[tokio::test]
async fn test_open_history_item() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, surface) = session_with(StubService::offline(), store);
    session.submit_expense("Concert tickets").await.unwrap();
    session.submit_query("What is a budget?").await.unwrap();

    let turn = session.open_history_item(0).unwrap();
    assert_eq!(turn.question(), "Concert tickets");
    assert_eq!(
        surface.drawn().last(),
        Some(&Drawn::Turn(
            "Concert tickets".into(),
            Some(Category::Entertainment)
        ))
    );

    session.open_history_item(1).unwrap();
    assert_eq!(
        surface.drawn().last(),
        Some(&Drawn::Turn("What is a budget?".into(), None))
    );

    assert!(session.open_history_item(7).is_none());
    assert!(matches!(surface.drawn().last(), Some(Drawn::Notice(_))));
}

#[tokio::test]
async fn test_check_status() {
    let store = Arc::new(CountingStore::default());
    let (session, _svc, surface) = session_with(StubService::offline(), store.clone());
    assert_eq!(session.check_status().await, ApiStatus::Offline);
    assert_eq!(
        surface.drawn(),
        vec![
            Drawn::Status(ApiStatus::Checking),
            Drawn::Status(ApiStatus::Offline)
        ]
    );

    let (session, _svc, _surface) = session_with(
        StubService::online(CategorizeResponse::default(), QueryResponse::default()),
        store,
    );
    assert_eq!(session.check_status().await, ApiStatus::Online);
}

#[tokio::test]
async fn test_dispatch_table() {
    let store = Arc::new(CountingStore::default());
    let (mut session, _svc, _surface) = session_with(StubService::offline(), store);

    let outcome = session
        .dispatch(Intent::SubmitExpense("Amazon order".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.category, Some(Category::Shopping));

    let outcome = session
        .dispatch(Intent::SubmitQuery("hello".into()))
        .await
        .unwrap();
    assert!(outcome.is_some());

    assert!(session
        .dispatch(Intent::SubmitQuery(" ".into()))
        .await
        .is_err());

    assert_eq!(session.dispatch(Intent::ToggleTheme).await.unwrap(), None);
    assert_eq!(session.theme(), Theme::Light);
    assert_eq!(session.dispatch(Intent::OpenHistory(0)).await.unwrap(), None);
    assert_eq!(session.dispatch(Intent::CheckStatus).await.unwrap(), None);
    assert_eq!(session.dispatch(Intent::Reset).await.unwrap(), None);
    assert!(session.log().is_empty());
}

#[tokio::test]
async fn test_start_loads_theme_and_history() {
    let store = Arc::new(CountingStore::default());
    let log: ChatLog = std::iter::once(ChatTurn::new("Gym membership", "ok")).collect();
    store
        .set(CHAT_HISTORY_KEY, &log.to_json().unwrap())
        .await
        .unwrap();
    store.set(THEME_KEY, "light").await.unwrap();

    let surface = Arc::new(RecordingSurface::default());
    let session = ChatSession::start(
        Arc::new(StubService::offline()),
        store,
        surface.clone(),
    )
    .await;
    assert_eq!(session.theme(), Theme::Light);
    assert_eq!(session.log(), &log);
    assert_eq!(
        surface.drawn(),
        vec![Drawn::Theme(Theme::Light), Drawn::History(1)]
    );
}

#[tokio::test]
async fn test_http_500_falls_back_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/categorize"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Internal server error",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service =
        Arc::new(HttpExpenseService::new(server.uri(), None, Duration::from_secs(2)).unwrap());
    let store = Arc::new(MemoryStore::new());
    let surface = Arc::new(RecordingSurface::default());
    let mut session = ChatSession::new(service, store.clone(), surface);

    let outcome = session
        .submit_expense("Dinner at an Italian restaurant")
        .await
        .unwrap();
    assert_eq!(outcome.category, Some(Category::Food));
    assert_eq!(session.log().len(), 1);
    assert_eq!(restore_log(store.as_ref()).await.len(), 1);
}
