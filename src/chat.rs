//! Knowledge-base conversation state.
//!
//! [`KnowledgeBase`] owns the chat transcript for one session and sequences
//! each question through the backend:
//!
//! 1. [`submit`](KnowledgeBase::submit) refuses blank input and refuses while
//!    an answer is pending. Otherwise it appends the user's message right
//!    away, clears the input, and hands back a [`PendingAsk`].
//! 2. The caller dispatches the pending ask with [`fetch_reply`].
//! 3. [`resolve`](KnowledgeBase::resolve) appends either an assistant message
//!    (with citations) or an error message.
//!
//! The transcript is append-only. The user entry is never rewritten when the
//! answer arrives; the answer is a second, separate entry.

use anyhow::Result;
use serde::Serialize;

use crate::api::{ApiError, Backend};
use crate::config::Config;
use crate::models::Citation;
use crate::render::{self, Palette};
use crate::request::{Request, RequestTicket, Settled};

/// Prompts offered on an empty transcript.
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "What are the payment terms for clients?",
    "What did the CFO say about Q3 projections?",
    "What are the audit procedures?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    /// Only ever non-empty for assistant messages.
    pub sources: Vec<Citation>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, sources: Vec<Citation>) -> Self {
        Self {
            kind: MessageKind::Assistant,
            text: text.into(),
            sources,
        }
    }

    /// Error entry; `description` is prefixed with `"Error: "`.
    pub fn error(description: impl std::fmt::Display) -> Self {
        Self {
            kind: MessageKind::Error,
            text: format!("Error: {}", description),
            sources: Vec::new(),
        }
    }
}

/// Append-only list of messages.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

/// Which backend endpoint answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskMode {
    /// `/api/v1/ask`: retrieval-augmented, with citations.
    #[default]
    Rag,
    /// `/api/v1/chat`: the bare model, no citations.
    Direct,
}

impl AskMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rag" | "ask" => Some(AskMode::Rag),
            "direct" | "chat" => Some(AskMode::Direct),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AskMode::Rag => "rag",
            AskMode::Direct => "direct",
        }
    }
}

/// Normalized answer, whichever endpoint produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    pub text: String,
    pub sources: Vec<Citation>,
}

/// A submitted question awaiting its answer.
#[derive(Debug, Clone)]
pub struct PendingAsk {
    pub ticket: RequestTicket,
    pub question: String,
    pub mode: AskMode,
    pub use_context: Option<bool>,
}

/// Perform the backend call for a pending ask.
pub async fn fetch_reply(backend: &dyn Backend, pending: &PendingAsk) -> Result<Reply, ApiError> {
    match pending.mode {
        AskMode::Rag => {
            let resp = match pending.use_context {
                None => backend.ask(&pending.question).await?,
                Some(flag) => backend.ask_with(&pending.question, Some(flag)).await?,
            };
            Ok(Reply {
                text: resp.answer,
                sources: resp.sources,
            })
        }
        AskMode::Direct => {
            let resp = backend.chat(&pending.question).await?;
            Ok(Reply {
                text: resp.response,
                sources: Vec::new(),
            })
        }
    }
}

/// Conversation state for the knowledge-base page.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    transcript: Transcript,
    input: String,
    mode: AskMode,
    use_context: Option<bool>,
    request: Request<Reply>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: AskMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn mode(&self) -> AskMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AskMode) {
        self.mode = mode;
    }

    /// Pass `use_context` to the RAG endpoint (`None` = backend default).
    pub fn set_use_context(&mut self, use_context: Option<bool>) {
        self.use_context = use_context;
    }

    /// Load suggested question `index` into the input.
    pub fn use_suggestion(&mut self, index: usize) -> bool {
        match SUGGESTED_QUESTIONS.get(index) {
            Some(q) => {
                self.input = (*q).to_string();
                true
            }
            None => false,
        }
    }

    /// True while an answer is outstanding.
    pub fn is_thinking(&self) -> bool {
        self.request.is_pending()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_thinking() && !self.input.trim().is_empty()
    }

    /// Submit the current input.
    ///
    /// Appends the user message and clears the input. Returns `None`, without
    /// touching any state, when the input is blank or an answer is pending.
    pub fn submit(&mut self) -> Option<PendingAsk> {
        let question = self.input.trim();
        if question.is_empty() {
            return None;
        }
        let question = question.to_string();
        let ticket = self.request.trigger()?;

        self.transcript.push(Message::user(question.clone()));
        self.input.clear();

        Some(PendingAsk {
            ticket,
            question,
            mode: self.mode,
            use_context: self.use_context,
        })
    }

    /// Apply the outcome of a pending ask. Stale outcomes append nothing.
    pub fn resolve(&mut self, pending: &PendingAsk, result: Result<Reply, ApiError>) -> Settled {
        let message = match &result {
            Ok(reply) => Message::assistant(reply.text.clone(), reply.sources.clone()),
            Err(e) => Message::error(e),
        };
        let settled = self.request.settle(pending.ticket, result);
        if settled == Settled::Applied {
            if message.kind == MessageKind::Error {
                tracing::warn!(question = %pending.question, "ask failed: {}", message.text);
            }
            self.transcript.push(message);
        }
        settled
    }

    /// Submit and wait for the answer in one step.
    ///
    /// Returns the appended reply (assistant or error), or `None` when the
    /// submission was refused.
    pub async fn ask(&mut self, backend: &dyn Backend) -> Option<&Message> {
        let pending = self.submit()?;
        let result = fetch_reply(backend, &pending).await;
        match self.resolve(&pending, result) {
            Settled::Applied => self.transcript.last(),
            Settled::Stale => None,
        }
    }
}

/// `mdash ask` / `mdash chat`: run one exchange and print the transcript.
pub async fn run_exchange(
    config: &Config,
    backend: &dyn Backend,
    question: &str,
    mode: AskMode,
    use_context: Option<bool>,
    json: bool,
) -> Result<()> {
    let mut kb = KnowledgeBase::with_mode(mode);
    kb.set_use_context(use_context);
    kb.set_input(question);

    let failed = match kb.ask(backend).await {
        None => {
            println!("Nothing to ask.");
            return Ok(());
        }
        Some(reply) => reply.kind == MessageKind::Error,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(kb.transcript())?);
    } else {
        let palette = Palette::from_config(&config.ui);
        print!("{}", render::transcript(&kb, &palette, render::DEFAULT_WIDTH));
    }

    if failed {
        anyhow::bail!("backend request failed");
    }
    Ok(())
}
