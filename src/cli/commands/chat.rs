//! Interactive chat command.

use console::style;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::helpers::spinner;
use crate::config::Settings;
use crate::llm::LlmClient;
use crate::services::{ChatRole, ChatSession};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Quit,
    Reset,
    History,
    Empty,
    Message(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    match line.trim() {
        "" => ChatInput::Empty,
        "/quit" | "/exit" => ChatInput::Quit,
        "/reset" => ChatInput::Reset,
        "/history" => ChatInput::History,
        other => ChatInput::Message(other),
    }
}

/// Run a chat loop on stdin until EOF or `/quit`.
pub async fn cmd_chat(settings: &Settings) -> anyhow::Result<()> {
    if !settings.llm.has_credentials() {
        anyhow::bail!(
            "No API key configured for {}. Set GOOGLE_API_KEY or llm.api_key.",
            settings.llm.provider.as_str()
        );
    }

    let client = LlmClient::new(settings.llm.clone())?;
    let mut session = ChatSession::new(settings.llm.get_persona());

    println!(
        "{} Chatting with the astrologer ({}). Commands: /reset, /history, /quit",
        style("→").cyan(),
        settings.llm.model
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Reset => {
                session.clear();
                println!("{} Conversation cleared", style("✓").green());
            }
            ChatInput::History => {
                for turn in session.history() {
                    let who = match turn.role {
                        ChatRole::User => style("You").cyan(),
                        ChatRole::Assistant => style("Astrologer").magenta(),
                    };
                    println!("{} [{}]: {}", who, turn.at.format("%H:%M"), turn.content);
                }
            }
            ChatInput::Message(message) => {
                let pb = spinner("Consulting the stars...");
                let result = session.ask(&client, message).await;
                pb.finish_and_clear();

                match result {
                    Ok(reply) => println!("{} {}", style("Astrologer:").magenta().bold(), reply),
                    Err(e) => eprintln!("{} {}", style("✗").red(), e),
                }
            }
        }
    }

    Ok(())
}
