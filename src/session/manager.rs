use std::sync::Arc;

use crate::core::category::{self, Category};
use crate::core::chat::{ChatLog, ChatTurn};
use crate::core::error::{InputKind, RemoteError, SessionError};
use crate::core::service::ExpenseService;
use crate::core::store::{KeyValueStore, CHAT_HISTORY_KEY, THEME_KEY};
use crate::core::surface::{ApiStatus, ChatSurface};
use crate::core::theme::Theme;
use crate::session::intent::Intent;

const DEFAULT_CATEGORIZE_MESSAGE: &str = "I've categorized this as:";
const DEFAULT_QUERY_RESPONSE: &str = "I'm not sure how to answer that.";
const QUERY_STATUS_APOLOGY: &str =
    "I'm currently unable to process your query due to connection issues. Please try again later.";
const QUERY_NETWORK_APOLOGY: &str =
    "I'm currently unable to process your query. Please check your internet connection and try again.";

/// Result of a successful categorize or query submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub turn: ChatTurn,
    /// Set for categorizations, whether the label came from the service or
    /// the local classifier.
    pub category: Option<Category>,
}

/// The in-memory chat log plus the collaborators it talks to.
pub struct ChatSession {
    id: String,
    service: Arc<dyn ExpenseService>,
    store: Arc<dyn KeyValueStore>,
    surface: Arc<dyn ChatSurface>,
    log: ChatLog,
    theme: Theme,
}

impl ChatSession {
    pub fn new(
        service: Arc<dyn ExpenseService>,
        store: Arc<dyn KeyValueStore>,
        surface: Arc<dyn ChatSurface>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            service,
            store,
            surface,
            log: ChatLog::new(),
            theme: Theme::default(),
        }
    }

    /// Build a session and load the stored theme and history into it.
    pub async fn start(
        service: Arc<dyn ExpenseService>,
        store: Arc<dyn KeyValueStore>,
        surface: Arc<dyn ChatSurface>,
    ) -> Self {
        let mut session = Self::new(service, store, surface);
        session.restore_theme().await;
        session.restore_session().await;
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn service(&self) -> &dyn ExpenseService {
        self.service.as_ref()
    }

    pub async fn dispatch(&mut self, intent: Intent) -> Result<Option<Outcome>, SessionError> {
        match intent {
            Intent::SubmitExpense(text) => self.submit_expense(&text).await.map(Some),
            Intent::SubmitQuery(text) => self.submit_query(&text).await.map(Some),
            Intent::Reset => {
                self.reset_session().await;
                Ok(None)
            }
            Intent::ToggleTheme => {
                self.toggle_theme().await;
                Ok(None)
            }
            Intent::OpenHistory(index) => {
                self.open_history_item(index);
                Ok(None)
            }
            Intent::CheckStatus => {
                self.check_status().await;
                Ok(None)
            }
        }
    }

    pub async fn submit_expense(&mut self, description: &str) -> Result<Outcome, SessionError> {
        let description = self.require_input(description, InputKind::Expense)?;
        let (answer, category) = answer_expense(self.service.as_ref(), &description).await;
        Ok(self.record(ChatTurn::new(description, answer), Some(category)).await)
    }

    pub async fn submit_query(&mut self, query: &str) -> Result<Outcome, SessionError> {
        let query = self.require_input(query, InputKind::Query)?;
        let answer = answer_query(self.service.as_ref(), &query).await;
        Ok(self.record(ChatTurn::new(query, answer), None).await)
    }

    /// Start a new chat: drop every turn and store the empty log.
    pub async fn reset_session(&mut self) {
        self.log = ChatLog::new();
        self.persist_log().await;
        self.surface.clear();
        self.surface.show_history(&self.log);
    }

    /// Replace the in-memory log with whatever storage holds.
    pub async fn restore_session(&mut self) -> &ChatLog {
        self.log = restore_log(self.store.as_ref()).await;
        self.surface.show_history(&self.log);
        &self.log
    }

    pub async fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.surface.apply_theme(self.theme);
        if let Err(e) = self.store.set(THEME_KEY, self.theme.as_str()).await {
            tracing::warn!(session_id = %self.id, error = %e, "failed to save theme");
        }
        self.theme
    }

    pub async fn restore_theme(&mut self) -> Theme {
        match self.store.get(THEME_KEY).await {
            Ok(Some(stored)) => match Theme::from_stored(&stored) {
                Some(theme) => self.theme = theme,
                None => tracing::debug!(value = %stored, "ignoring unknown theme"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read theme"),
        }
        self.surface.apply_theme(self.theme);
        self.theme
    }

    /// Show a past turn again. Out-of-range indexes only notify.
    pub fn open_history_item(&self, index: usize) -> Option<&ChatTurn> {
        match self.log.get(index) {
            Some(turn) => {
                self.surface.clear();
                self.surface
                    .show_turn(turn, category::category_from_answer(turn.answer()));
                Some(turn)
            }
            None => {
                self.surface.notify("No chat at that position.");
                None
            }
        }
    }

    pub async fn check_status(&self) -> ApiStatus {
        self.surface.show_status(ApiStatus::Checking);
        let status = if self.service.probe().await {
            ApiStatus::Online
        } else {
            tracing::warn!(url = %self.service.base_url(), "API status check failed");
            ApiStatus::Offline
        };
        self.surface.show_status(status);
        status
    }

    fn require_input(&self, text: &str, kind: InputKind) -> Result<String, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            let err = SessionError::EmptyInput { kind };
            self.surface.notify(err.notice());
            return Err(err);
        }
        Ok(trimmed.to_string())
    }

    async fn record(&mut self, turn: ChatTurn, category: Option<Category>) -> Outcome {
        self.log.push(turn.clone());
        self.persist_log().await;
        self.surface.show_turn(&turn, category);
        self.surface.show_history(&self.log);
        Outcome { turn, category }
    }

    /// Best effort: a failed write leaves the in-memory log as is.
    async fn persist_log(&self) {
        let json = match self.log.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "failed to serialize chat log");
                return;
            }
        };
        if let Err(e) = self.store.set(CHAT_HISTORY_KEY, &json).await {
            tracing::warn!(session_id = %self.id, error = %e, "failed to save chat history");
        }
    }
}

/// Ask the service for a category, falling back to the local classifier.
/// Returns the answer text (with category markup) and the label.
pub async fn answer_expense(service: &dyn ExpenseService, description: &str) -> (String, Category) {
    match service.categorize(description).await {
        Ok(resp) => {
            let category = resp
                .category
                .unwrap_or_else(|| category::classify(description));
            let message = resp
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORIZE_MESSAGE.to_string());
            (format!("{message} {}", category.tag()), category)
        }
        Err(e) => {
            tracing::warn!(error = %e, "categorize failed, using local categorization");
            let category = category::classify(description);
            (
                format!("{DEFAULT_CATEGORIZE_MESSAGE} {}", category.tag()),
                category,
            )
        }
    }
}

/// Ask the service a question. Failures become a fixed apology.
pub async fn answer_query(service: &dyn ExpenseService, query: &str) -> String {
    match service.query(query).await {
        Ok(resp) => resp
            .response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY_RESPONSE.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "query failed");
            match e {
                RemoteError::Api { .. } => QUERY_STATUS_APOLOGY.to_string(),
                RemoteError::Http(_) | RemoteError::Malformed(_) => {
                    QUERY_NETWORK_APOLOGY.to_string()
                }
            }
        }
    }
}

/// Load the stored chat log. Missing or unreadable data yields an empty
/// log; a value that fails to parse is removed.
pub async fn restore_log(store: &dyn KeyValueStore) -> ChatLog {
    let raw = match store.get(CHAT_HISTORY_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return ChatLog::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read chat history");
            return ChatLog::new();
        }
    };

    match ChatLog::from_json(&raw) {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(error = %e, "discarding corrupted chat history");
            if let Err(e) = store.remove(CHAT_HISTORY_KEY).await {
                tracing::warn!(error = %e, "failed to remove corrupted chat history");
            }
            ChatLog::new()
        }
    }
}
