mod intent;
mod manager;

pub use intent::Intent;
pub use manager::{answer_expense, answer_query, restore_log, ChatSession, Outcome};

#[cfg(test)]
mod tests;
