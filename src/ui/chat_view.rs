use std::time::Duration;

use tokio::sync::mpsc;

use crate::assistant::intents;
use crate::assistant::session::{ChatSession, ConversationMessage, Sender};
use crate::utils::Console;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Back,
    Help,
    /// Zero-based index into the suggestion list.
    Suggestion(usize),
    Text(String),
    Empty,
}

/// `/back` leaves, `/help` lists suggestions, a bare number `n` picks suggestion `n`.
pub fn parse_input(line: &str) -> ChatInput {
    let line = line.trim();
    match line {
        "" => ChatInput::Empty,
        "/back" | "/quit" | "/exit" => ChatInput::Back,
        "/help" | "?" => ChatInput::Help,
        _ => match line.parse::<usize>() {
            Ok(n) if (1..=intents::entries().len()).contains(&n) => ChatInput::Suggestion(n - 1),
            _ => ChatInput::Text(line.to_string()),
        },
    }
}

fn format_message(m: &ConversationMessage) -> String {
    let who = match m.sender {
        Sender::User => "You",
        Sender::Bot => "Assistant",
    };
    format!("[{}] {who}: {}", m.timestamp, m.text)
}

fn print_suggestions() {
    println!("Suggestions:");
    for (i, question) in intents::suggestions().enumerate() {
        println!("  {}. {question}", i + 1);
    }
    println!("Type a question, a suggestion number, or /back to leave.");
}

/// Runs the assistant screen until the user leaves or stdin closes.
pub async fn show_chat(console: &mut Console, reply_delay: Duration) -> std::io::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = ChatSession::with_listener(reply_delay, tx);
    for m in session.messages() {
        println!("{}", format_message(&m));
    }
    print_suggestions();

    loop {
        tokio::select! {
            Some(reply) = rx.recv() => println!("{}", format_message(&reply)),
            line = console.next_line() => {
                let Some(line) = line? else { break };
                let sent = match parse_input(&line) {
                    ChatInput::Back => break,
                    ChatInput::Help => {
                        print_suggestions();
                        None
                    }
                    ChatInput::Suggestion(i) => session.send_suggestion(i),
                    ChatInput::Text(text) => session.send(&text),
                    ChatInput::Empty => None,
                };
                if let Some(m) = sent {
                    if m.sender == Sender::User && m.text != line.trim() {
                        println!("{}", format_message(&m));
                    }
                    println!("Assistant is typing…");
                }
            }
        }
    }

    // Replies still in flight are dropped with the session.
    log::debug!("leaving chat with {} pending replies", session.pending_replies());
    session.close();
    Ok(())
}
