//! Turn coordination for one chat session
//!
//! A [`Session`] owns the transcript and the turn state machine:
//!
//! ```text
//! Idle --submit--> AwaitingReply(id) --complete(id, Ok)--> Idle  (+ assistant message)
//!                                    --complete(id, Err)-> Idle  (+ diagnostic)
//!                                    --cancel------------> Idle  (+ diagnostic)
//! ```
//!
//! The transport call itself lives outside the session so the caller decides
//! how it runs: inline via [`run_turn`], or as a spawned task the UI polls.

use crate::error::TransportError;
use crate::message::Message;
use crate::render::{project, LogEntry, Renderer};
use crate::transcript::Transcript;
use crate::transport::ChatTransport;

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingReply(TurnId),
}

/// Why a submission did not start a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Nothing left after trimming
    Empty,
    /// A reply is still outstanding
    Busy,
}

/// A started turn whose request has not been answered yet
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub id: TurnId,
    /// Transcript snapshot to send, ending with the new user message
    pub messages: Vec<Message>,
}

/// Operator-facing record of a turn that produced no reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub turn: TurnId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied,
    Failed(Diagnostic),
    /// The result belonged to a turn that is no longer in flight
    Stale,
}

pub struct Session {
    transcript: Transcript,
    state: TurnState,
    next_turn: TurnId,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::seeded(system_prompt),
            state: TurnState::Idle,
            next_turn: 1,
            diagnostics: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self.state, TurnState::AwaitingReply(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn last_diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostics.last()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        project(&self.transcript)
    }

    pub fn submit(&mut self, raw: &str) -> Result<PendingTurn, Rejected> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(Rejected::Empty);
        }
        if self.is_awaiting_reply() {
            return Err(Rejected::Busy);
        }

        let id = self.next_turn;
        self.next_turn += 1;

        self.transcript.append(Message::user(text));
        self.state = TurnState::AwaitingReply(id);
        log::info!("[turn] #{} started ({} chars)", id, text.chars().count());

        Ok(PendingTurn {
            id,
            messages: self.transcript.all().to_vec(),
        })
    }

    pub fn complete(&mut self, id: TurnId, result: Result<String, TransportError>) -> TurnOutcome {
        if self.state != TurnState::AwaitingReply(id) {
            log::debug!("[turn] #{} result dropped, turn no longer in flight", id);
            return TurnOutcome::Stale;
        }
        self.state = TurnState::Idle;

        match result {
            Ok(reply) => {
                log::info!("[turn] #{} replied ({} chars)", id, reply.chars().count());
                self.transcript.append(Message::assistant(reply));
                TurnOutcome::Replied
            }
            Err(e) => TurnOutcome::Failed(self.record(id, e.to_string())),
        }
    }

    /// Abandons the in-flight turn. The user's message stays in the transcript.
    pub fn cancel(&mut self) -> Option<TurnId> {
        match self.state {
            TurnState::AwaitingReply(id) => {
                self.state = TurnState::Idle;
                self.record(id, "cancelled before a reply arrived".to_string());
                Some(id)
            }
            TurnState::Idle => None,
        }
    }

    fn record(&mut self, turn: TurnId, message: String) -> Diagnostic {
        log::error!("[turn] #{} failed: {}", turn, message);
        let diagnostic = Diagnostic { turn, message };
        self.diagnostics.push(diagnostic.clone());
        diagnostic
    }
}

/// Runs one whole turn inline: submit, render, await the reply, complete, render.
pub async fn run_turn<T, R>(
    session: &mut Session,
    transport: &T,
    renderer: &mut R,
    input: &str,
) -> Result<TurnOutcome, Rejected>
where
    T: ChatTransport + ?Sized,
    R: Renderer + ?Sized,
{
    let pending = session.submit(input)?;
    renderer.render(&session.entries());

    let result = transport.send_turn(&pending.messages).await;
    let outcome = session.complete(pending.id, result);
    if outcome == TurnOutcome::Replied {
        renderer.render(&session.entries());
    }
    Ok(outcome)
}
