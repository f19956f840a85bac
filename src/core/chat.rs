use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of turns kept in the rolling history.
pub const MAX_TURNS: usize = 10;

/// Characters of the question shown in the history list.
const SHORT_QUESTION_CHARS: usize = 20;

/// One user input and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    question: String,
    answer: String,
    timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// The question is stored trimmed.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question: String = question.into();
        Self {
            question: question.trim().to_string(),
            answer: answer.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Question cut to the history-list width, with an ellipsis if cut.
    pub fn short_question(&self) -> String {
        if self.question.chars().count() > SHORT_QUESTION_CHARS {
            let head: String = self.question.chars().take(SHORT_QUESTION_CHARS).collect();
            format!("{head}...")
        } else {
            self.question.clone()
        }
    }

    /// Local `H:MM` time of the turn.
    pub fn display_time(&self) -> String {
        let local = self.timestamp.with_timezone(&Local);
        format!("{}:{:02}", local.hour(), local.minute())
    }
}

/// Bounded, oldest-first log of chat turns.
///
/// Serialized as a plain JSON array. Deserializing goes through
/// `From<Vec<ChatTurn>>`, so a decoded log is never longer than `MAX_TURNS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ChatTurn>", into = "Vec<ChatTurn>")]
pub struct ChatLog {
    turns: VecDeque<ChatTurn>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, evicting the oldest when the log is full.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > MAX_TURNS {
            self.turns.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChatTurn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored log. Questions are trimmed, blank ones dropped, and
    /// only the newest `MAX_TURNS` survive.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl From<Vec<ChatTurn>> for ChatLog {
    fn from(turns: Vec<ChatTurn>) -> Self {
        let mut log = Self::new();
        for mut turn in turns {
            let question = turn.question.trim();
            if question.is_empty() {
                continue;
            }
            turn.question = question.to_string();
            log.push(turn);
        }
        log
    }
}

impl From<ChatLog> for Vec<ChatTurn> {
    fn from(log: ChatLog) -> Self {
        log.turns.into()
    }
}

impl FromIterator<ChatTurn> for ChatLog {
    fn from_iter<I: IntoIterator<Item = ChatTurn>>(iter: I) -> Self {
        let mut log = Self::new();
        for turn in iter {
            log.push(turn);
        }
        log
    }
}

impl<'a> IntoIterator for &'a ChatLog {
    type Item = &'a ChatTurn;
    type IntoIter = std::collections::vec_deque::Iter<'a, ChatTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
