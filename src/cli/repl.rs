use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;

use super::output::TerminalSurface;
use crate::session::{ChatSession, Intent};

pub async fn run(mut session: ChatSession, surface: Arc<TerminalSurface>) -> Result<()> {
    println!("\x1b[1msmartspend\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("API: \x1b[36m{}\x1b[0m", session.service().base_url());
    println!("Type an expense to categorize it, \x1b[33m/ask\x1b[0m to ask a question, \x1b[33m/help\x1b[0m for commands.\n");

    if session.log().is_empty() {
        surface.print_welcome();
    }
    session.check_status().await;

    loop {
        eprint!("\x1b[32;1mspend>\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                // EOF (Ctrl-D)
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let intent = if input.starts_with('/') {
            match parse_command(input) {
                Command::Intent(intent) => intent,
                Command::History => {
                    surface.print_history(session.log());
                    continue;
                }
                Command::Categories => {
                    surface.print_categories();
                    continue;
                }
                Command::Help => {
                    print_help();
                    continue;
                }
                Command::Exit => {
                    println!("Goodbye!");
                    break;
                }
                Command::Unknown(msg) => {
                    eprintln!("{msg}");
                    continue;
                }
            }
        } else {
            Intent::SubmitExpense(input.to_string())
        };

        let toggles_theme = intent == Intent::ToggleTheme;
        // EmptyInput is already shown as a notice by the session
        let _ = session.dispatch(intent).await;
        if toggles_theme {
            println!("Theme: {}", session.theme().label());
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Intent(Intent),
    History,
    Categories,
    Help,
    Exit,
    Unknown(String),
}

fn parse_command(input: &str) -> Command {
    let (name, rest) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (input, ""),
    };

    match name {
        "/ask" | "/a" => Command::Intent(Intent::SubmitQuery(rest.to_string())),
        "/new" | "/reset" => Command::Intent(Intent::Reset),
        "/theme" => Command::Intent(Intent::ToggleTheme),
        "/status" => Command::Intent(Intent::CheckStatus),
        "/open" | "/o" => match rest.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Intent(Intent::OpenHistory(n - 1)),
            _ => Command::Unknown("Usage: /open <n>  (see /history)".into()),
        },
        "/history" | "/h" => Command::History,
        "/categories" => Command::Categories,
        "/help" => Command::Help,
        "/exit" | "/quit" | "/q" => Command::Exit,
        _ => Command::Unknown(format!(
            "Unknown command: {name}. Type /help for available commands."
        )),
    }
}

fn print_help() {
    println!("\x1b[1mCommands:\x1b[0m");
    println!("  <text>         Categorize an expense");
    println!("  /ask <text>    Ask a question about expenses or budgeting");
    println!("  /new           Start a new chat (clears history)");
    println!("  /history       List recent chats");
    println!("  /open <n>      Show chat n from the history");
    println!("  /theme         Toggle light/dark mode");
    println!("  /status        Check the API connection");
    println!("  /categories    List categories and their keywords");
    println!("  /exit          Exit");
}
