//! Chat CLI commands: create, delete, send, check.

use anyhow::Result;
use console::style;
use serde_json::json;

use chatserver_types::chat::{ChatId, UserId};

use super::Output;
use crate::state::AppState;

/// Print a success envelope in JSON mode.
fn print_data(data: serde_json::Value) -> Result<()> {
    let body = json!({ "data": data, "errors": [] });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Create a chat.
///
/// ```bash
/// chatd create --users 7 9
/// ```
pub async fn create_chat(state: &AppState, users: Vec<UserId>, output: Output) -> Result<()> {
    let ctx = state.request_context();
    let member_count = users.len();
    let chat_id = state.chat_handler.create_chat(&ctx, users).await?;

    if output.json {
        return print_data(json!({ "chat_id": chat_id }));
    }
    if !output.quiet {
        println!(
            "  {} Created chat {} with {} member(s)",
            style("✓").green().bold(),
            style(chat_id).cyan(),
            member_count
        );
    }
    Ok(())
}

pub async fn delete_chat(state: &AppState, chat_id: ChatId, output: Output) -> Result<()> {
    let ctx = state.request_context();
    state.chat_handler.delete_chat(&ctx, chat_id).await?;

    if output.json {
        return print_data(json!({ "chat_id": chat_id, "deleted": true }));
    }
    if !output.quiet {
        println!(
            "  {} Deleted chat {}",
            style("✓").green().bold(),
            style(chat_id).cyan()
        );
    }
    Ok(())
}

pub async fn send_message(
    state: &AppState,
    chat_id: ChatId,
    from: UserId,
    text: String,
    output: Output,
) -> Result<()> {
    let ctx = state.request_context();
    state
        .chat_handler
        .send_message(&ctx, chat_id, from, text)
        .await?;

    if output.json {
        return print_data(json!({ "chat_id": chat_id, "from_user": from, "sent": true }));
    }
    if !output.quiet {
        println!(
            "  {} Message from user {} sent to chat {}",
            style("✓").green().bold(),
            style(from).yellow(),
            style(chat_id).cyan()
        );
    }
    Ok(())
}

/// Ping both database pools.
pub async fn check(state: &AppState, output: Output) -> Result<()> {
    let healthy = state.db_pool.ping().await.is_ok();

    if output.json {
        print_data(json!({
            "data_dir": state.data_dir.display().to_string(),
            "database": if healthy { "ok" } else { "unreachable" },
            "healthy": healthy,
        }))?;
    } else if !output.quiet {
        let mark = if healthy {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {mark} Database at {}", style(state.data_dir.display()).dim());
    }

    if healthy {
        Ok(())
    } else {
        anyhow::bail!("database is unreachable")
    }
}
