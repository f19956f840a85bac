use crate::core::category::Category;
use crate::core::chat::{ChatLog, ChatTurn};
use crate::core::theme::Theme;

/// Reachability of the remote service as last probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Checking,
    Online,
    Offline,
}

/// Render targets the chat session draws into.
pub trait ChatSurface: Send + Sync {
    /// Show one exchange in the chat panel.
    fn show_turn(&self, turn: &ChatTurn, category: Option<Category>);

    /// Transient notification, not part of the chat.
    fn notify(&self, message: &str);

    /// Redraw the history list; entries are addressed by their index.
    fn show_history(&self, log: &ChatLog);

    fn show_status(&self, status: ApiStatus);

    fn apply_theme(&self, theme: Theme);

    /// Empty the chat panel back to its welcome state.
    fn clear(&self);
}
