/// A user action the chat session can handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SubmitExpense(String),
    SubmitQuery(String),
    Reset,
    ToggleTheme,
    /// Re-display a turn from the history list by index.
    OpenHistory(usize),
    CheckStatus,
}
