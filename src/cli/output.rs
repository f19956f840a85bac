use std::io::{self, Write};
use std::sync::Mutex;

use crate::core::category::{self, Category};
use crate::core::chat::{ChatLog, ChatTurn, MAX_TURNS};
use crate::core::surface::{ApiStatus, ChatSurface};
use crate::core::theme::Theme;

/// ANSI colour codes for one theme
#[derive(Clone, Copy)]
struct Palette {
    user: &'static str,
    bot: &'static str,
    accent: &'static str,
    dim: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                user: "36;1",
                bot: "37",
                accent: "33",
                dim: "90",
            },
            Theme::Light => Self {
                user: "34;1",
                bot: "30",
                accent: "35",
                dim: "2",
            },
        }
    }
}

/// How much the terminal surface draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// REPL: turns, history summary, banners
    Interactive,
    /// One-shot text output: the turn only
    OneShot,
    /// Machine-readable output elsewhere; only notices go to stderr
    Silent,
}

pub struct TerminalSurface {
    mode: SurfaceMode,
    theme: Mutex<Theme>,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::with_mode(SurfaceMode::Interactive)
    }

    pub fn with_mode(mode: SurfaceMode) -> Self {
        Self {
            mode,
            theme: Mutex::new(Theme::default()),
        }
    }

    fn palette(&self) -> Palette {
        let theme = self.theme.lock().map(|t| *t).unwrap_or_default();
        Palette::for_theme(theme)
    }

    pub fn print_welcome(&self) {
        let p = self.palette();
        println!("\x1b[1mWelcome to SmartSpend Assistant!\x1b[0m");
        println!("I can help you categorize your expenses or answer questions about expense management.");
        println!(
            "\x1b[{}mTry:\x1b[0m Dinner at an Italian restaurant \x1b[{}m|\x1b[0m Monthly Netflix subscription \x1b[{}m|\x1b[0m Uber ride to airport\n",
            p.dim, p.dim, p.dim
        );
    }

    /// Full history list, addressed by the index `/open` takes.
    pub fn print_history(&self, log: &ChatLog) {
        let p = self.palette();
        if log.is_empty() {
            println!("\x1b[{}mNo history yet\x1b[0m", p.dim);
            return;
        }
        for (i, turn) in log.iter().enumerate() {
            println!(
                "  \x1b[{}m{:>2}.\x1b[0m \x1b[{}m{:>5}\x1b[0m  {}",
                p.accent,
                i + 1,
                p.dim,
                turn.display_time(),
                turn.short_question()
            );
        }
    }

    pub fn print_categories(&self) {
        let p = self.palette();
        for c in Category::ALL {
            let keywords = c.keywords();
            let keywords = if keywords.is_empty() {
                "(default)".to_string()
            } else {
                keywords.join(", ")
            };
            println!(
                "  {} \x1b[1m{:<14}\x1b[0m \x1b[{}m{}\x1b[0m",
                c.icon(),
                c.as_str(),
                p.dim,
                keywords
            );
            println!("     {}", c.description());
        }
    }
}

/// Answer text as shown in the terminal: icon first, markup stripped.
pub fn render_answer(turn: &ChatTurn, category: Option<Category>) -> String {
    let text = category::strip_markup(turn.answer());
    match category {
        Some(c) => format!("{} {text}", c.icon()),
        None => text,
    }
}

impl ChatSurface for TerminalSurface {
    fn show_turn(&self, turn: &ChatTurn, category: Option<Category>) {
        if self.mode == SurfaceMode::Silent {
            return;
        }
        let p = self.palette();
        if self.mode == SurfaceMode::Interactive {
            println!("\x1b[{}mYou:\x1b[0m {}", p.user, turn.question());
            println!("\x1b[{}mBot:\x1b[0m {}", p.bot, render_answer(turn, category));
        } else {
            println!("{}", render_answer(turn, category));
        }
        io::stdout().flush().ok();
    }

    fn notify(&self, message: &str) {
        let p = self.palette();
        eprintln!("\x1b[{}m! {message}\x1b[0m", p.accent);
    }

    fn show_history(&self, log: &ChatLog) {
        if self.mode != SurfaceMode::Interactive {
            return;
        }
        let p = self.palette();
        println!(
            "\x1b[{}m[{}/{} in history · /history to list]\x1b[0m",
            p.dim,
            log.len(),
            MAX_TURNS
        );
    }

    fn show_status(&self, status: ApiStatus) {
        if self.mode == SurfaceMode::Silent {
            return;
        }
        match status {
            ApiStatus::Checking => {
                eprint!("\x1b[90mChecking API connection...\x1b[0m");
                io::stderr().flush().ok();
            }
            ApiStatus::Online => eprintln!("\r\x1b[K\x1b[32m● API online\x1b[0m"),
            ApiStatus::Offline => eprintln!("\r\x1b[K\x1b[31m✖ API offline\x1b[0m"),
        }
    }

    fn apply_theme(&self, theme: Theme) {
        if let Ok(mut current) = self.theme.lock() {
            *current = theme;
        }
    }

    fn clear(&self) {
        if self.mode != SurfaceMode::Interactive {
            return;
        }
        print!("\x1b[2J\x1b[H");
        self.print_welcome();
    }
}
