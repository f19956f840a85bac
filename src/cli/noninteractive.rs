use anyhow::Result;

use crate::core::category::{self, strip_markup};
use crate::session::{ChatSession, Intent, Outcome};

pub enum Request {
    Expense(String),
    Query(String),
}

/// Submit one request and print the result. `None` means the input was
/// rejected; the surface has already shown the notice.
pub async fn run(
    mut session: ChatSession,
    request: Request,
    output_format: super::OutputFormat,
) -> Result<Option<Outcome>> {
    let intent = match request {
        Request::Expense(text) => Intent::SubmitExpense(text),
        Request::Query(text) => Intent::SubmitQuery(text),
    };

    let outcome = match session.dispatch(intent).await {
        Ok(Some(outcome)) => outcome,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::debug!(error = %e, "one-shot input rejected");
            return Ok(None);
        }
    };

    if let super::OutputFormat::Json = output_format {
        let output = serde_json::json!({
            "question": outcome.turn.question(),
            "answer": strip_markup(outcome.turn.answer()),
            "category": outcome.category,
            "timestamp": outcome.turn.timestamp(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(Some(outcome))
}

/// Local classification only; never touches the network or storage.
pub fn classify(text: &str, output_format: super::OutputFormat) -> Result<()> {
    let category = category::classify(text);
    match output_format {
        super::OutputFormat::Text => println!("{category}"),
        super::OutputFormat::Json => {
            let output = serde_json::json!({
                "description": text,
                "category": category,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
