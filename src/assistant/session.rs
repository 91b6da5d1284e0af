use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::intents;

pub const GREETING: &str = "Hi! I'm the DIY Shop assistant. Ask me about orders, payments, delivery or tutorials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    /// Display time, e.g. `03:41 PM`.
    pub timestamp: String,
}

#[derive(Debug, Default)]
struct Transcript {
    messages: Vec<ConversationMessage>,
    next_id: u64,
    closed: bool,
}

impl Transcript {
    fn push(&mut self, sender: Sender, text: String) -> ConversationMessage {
        self.next_id += 1;
        let message = ConversationMessage {
            id: self.next_id,
            sender,
            text,
            timestamp: chrono::Local::now().format("%I:%M %p").to_string(),
        };
        self.messages.push(message.clone());
        message
    }
}

fn lock(transcript: &Mutex<Transcript>) -> MutexGuard<'_, Transcript> {
    transcript.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One chat screen's worth of conversation.
///
/// Every accepted utterance schedules a single delayed reply task owned by the
/// session. Closing or dropping the session aborts those tasks, and the
/// transcript refuses writes once closed, so no reply lands after teardown.
///
/// [`ChatSession::send`] spawns onto the current tokio runtime and must be
/// called from within one.
pub struct ChatSession {
    transcript: Arc<Mutex<Transcript>>,
    pending: Vec<JoinHandle<()>>,
    reply_delay: Duration,
    listener: Option<mpsc::UnboundedSender<ConversationMessage>>,
}

impl ChatSession {
    pub fn new(reply_delay: Duration) -> Self {
        let mut transcript = Transcript::default();
        transcript.push(Sender::Bot, GREETING.to_string());
        Self {
            transcript: Arc::new(Mutex::new(transcript)),
            pending: Vec::new(),
            reply_delay,
            listener: None,
        }
    }

    /// Like [`ChatSession::new`], but bot replies are also forwarded to `listener`.
    pub fn with_listener(reply_delay: Duration, listener: mpsc::UnboundedSender<ConversationMessage>) -> Self {
        let mut session = Self::new(reply_delay);
        session.listener = Some(listener);
        session
    }

    /// Appends the user's message and schedules the assistant's reply.
    ///
    /// Blank input and sends on a closed session are ignored.
    pub fn send(&mut self, text: &str) -> Option<ConversationMessage> {
        let utterance = text.trim();
        if utterance.is_empty() {
            return None;
        }
        let message = {
            let mut transcript = lock(&self.transcript);
            if transcript.closed {
                return None;
            }
            transcript.push(Sender::User, utterance.to_string())
        };

        self.pending.retain(|handle| !handle.is_finished());

        let transcript = Arc::clone(&self.transcript);
        let listener = self.listener.clone();
        let delay = self.reply_delay;
        let utterance = utterance.to_string();
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let reply = intents::resolve(&utterance);
            let mut transcript = lock(&transcript);
            if transcript.closed {
                log::debug!("chat session closed before reply was delivered");
                return;
            }
            let message = transcript.push(Sender::Bot, reply.to_string());
            // Delivered under the lock so `close` can't slip in between append and send.
            if let Some(listener) = listener {
                let _ = listener.send(message);
            }
        }));

        Some(message)
    }

    /// Sends the quick-reply suggestion at `index`, as if the user typed it.
    pub fn send_suggestion(&mut self, index: usize) -> Option<ConversationMessage> {
        let question = intents::entries().get(index)?.question;
        self.send(question)
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        lock(&self.transcript).messages.clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.pending.iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Tears the session down, cancelling every reply that hasn't been delivered.
    pub fn close(&mut self) {
        lock(&self.transcript).closed = true;
        for handle in self.pending.drain(..) {
            handle.abort();
        }
        self.listener = None;
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::intents::{FALLBACK_REPLY, resolve};
    use tokio::sync::mpsc::error::TryRecvError;

    const DELAY: Duration = Duration::from_millis(1000);

    async fn advance(by: Duration) {
        tokio::time::sleep(by).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn starts_with_greeting() {
        let session = ChatSession::new(DELAY);
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].text, GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_delay() {
        let mut session = ChatSession::new(DELAY);
        let sent = session.send("  How do I place an order?  ").unwrap();
        assert_eq!(sent.sender, Sender::User);
        assert_eq!(sent.text, "How do I place an order?");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.pending_replies(), 1);

        advance(Duration::from_millis(999)).await;
        assert_eq!(session.messages().len(), 2);

        advance(Duration::from_millis(2)).await;
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].sender, Sender::Bot);
        assert_eq!(messages[2].text, resolve("How do I place an order?"));
        assert_eq!(session.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_sends_are_ignored() {
        let mut session = ChatSession::new(DELAY);
        assert!(session.send("   ").is_none());
        assert!(session.send("").is_none());
        advance(DELAY * 2).await;
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ids_increase_and_replies_follow_their_trigger() {
        let mut session = ChatSession::new(DELAY);
        session.send("asdkjasdkj");
        advance(DELAY + Duration::from_millis(1)).await;
        session.send("Can I cancel my order?");
        advance(DELAY + Duration::from_millis(1)).await;

        let messages = session.messages();
        let ids: Vec<u64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let senders: Vec<Sender> = messages.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![Sender::Bot, Sender::User, Sender::Bot, Sender::User, Sender::Bot]
        );
        assert_eq!(messages[2].text, FALLBACK_REPLY);
        assert_eq!(messages[4].text, resolve("Can I cancel my order?"));
    }

    #[tokio::test(start_paused = true)]
    async fn listener_receives_bot_replies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::with_listener(DELAY, tx);
        session.send("refund");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        advance(DELAY + Duration::from_millis(1)).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.sender, Sender::Bot);
        assert_eq!(reply.text, resolve("refund"));
    }

    #[tokio::test(start_paused = true)]
    async fn close_before_delay_drops_the_reply() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::with_listener(DELAY, tx);
        session.send("How do I track my order?");
        advance(Duration::from_millis(500)).await;

        session.close();
        advance(DELAY * 3).await;

        assert_eq!(session.messages().len(), 2);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
        assert!(session.send("hello?").is_none());
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_pending_replies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::with_listener(DELAY, tx);
        session.send("payment options");
        session.send("delivery time");
        drop(session);

        advance(DELAY * 3).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn no_reply_reaches_the_listener_after_close() {
        for _ in 0..50 {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut session = ChatSession::with_listener(Duration::from_millis(1), tx);
            for _ in 0..8 {
                session.send("where is my order");
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
            session.close();

            let replies = session.messages().iter().skip(1).filter(|m| m.sender == Sender::Bot).count();
            let mut delivered = 0;
            while rx.recv().await.is_some() {
                delivered += 1;
            }
            assert_eq!(delivered, replies);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_sends_the_question_label() {
        let mut session = ChatSession::new(DELAY);
        let sent = session.send_suggestion(0).unwrap();
        assert_eq!(sent.text, intents::entries()[0].question);
        assert!(session.send_suggestion(999).is_none());
    }
}
