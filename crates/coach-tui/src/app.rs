use std::sync::Arc;

use coach_core::{
    ChatTransport, Config, LogEntry, PayloadMode, Rejected, Renderer, Session, TransportError,
    TurnId, TurnOutcome,
};
use tokio::task::JoinHandle;

/// Transport call running in the background for one turn
pub struct ReplyTask {
    pub id: TurnId,
    pub handle: JoinHandle<Result<String, TransportError>>,
}

/// One-line message shown in the footer until the next keypress or turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Notice(String),
    Error(String),
}

/// The visible chat log: a cached projection of the transcript plus scroll state
#[derive(Debug, Default)]
pub struct LogPane {
    pub entries: Vec<LogEntry>,
    pub scroll: u16,
    pub height: u16, // inner height of the log area, set during draw
    /// Rows the log occupies once wrapped, measured during draw
    pub content_lines: u16,
    pub follow: bool,
}

impl Renderer for LogPane {
    fn render(&mut self, entries: &[LogEntry]) {
        self.entries = entries.to_vec();
        self.follow = true;
    }
}

impl LogPane {
    fn max_scroll(&self) -> u16 {
        self.content_lines.saturating_sub(self.height)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = (self.scroll + lines).min(max);
        // Reaching the end re-attaches the view to new entries
        self.follow = self.scroll == max;
    }
}

pub struct App {
    pub should_quit: bool,

    pub session: Session,
    pub transport: Arc<dyn ChatTransport>,
    pub reply_task: Option<ReplyTask>,

    // Prompt input
    pub input: String,
    pub cursor: usize, // character position in input

    pub log: LogPane,
    pub status: Option<Status>,

    // Header info
    pub endpoint: String,
    pub mode: PayloadMode,

    // 0-2 for ellipsis animation
    pub animation_frame: u8,
}

impl App {
    pub fn new(config: &Config, endpoint: &str, transport: Arc<dyn ChatTransport>) -> Self {
        let session = Session::new(config.system_prompt.as_str());
        let mut log = LogPane::default();
        log.render(&session.entries());

        Self {
            should_quit: false,
            session,
            transport,
            reply_task: None,
            input: String::new(),
            cursor: 0,
            log,
            status: None,
            endpoint: endpoint.to_string(),
            mode: config.mode,
            animation_frame: 0,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.session.is_awaiting_reply()
    }

    /// Starts a turn from the input field. Blank input is ignored.
    pub fn submit(&mut self) {
        match self.session.submit(&self.input) {
            Ok(pending) => {
                self.status = None;
                self.log.render(&self.session.entries());

                self.input.clear();
                self.cursor = 0;

                let id = pending.id;
                let messages = pending.messages;
                let transport = Arc::clone(&self.transport);
                let handle = tokio::spawn(async move { transport.send_turn(&messages).await });
                self.reply_task = Some(ReplyTask { id, handle });
            }
            Err(Rejected::Empty) => {}
            Err(Rejected::Busy) => {
                self.status = Some(Status::Notice(
                    "Still waiting for the last reply (Esc to cancel)".to_string(),
                ));
            }
        }
    }

    /// Completes the in-flight turn if its task has finished
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .is_some_and(|task| task.handle.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            let result = match task.handle.await {
                Ok(result) => result,
                Err(e) => Err(TransportError::Aborted(e.to_string())),
            };

            match self.session.complete(task.id, result) {
                TurnOutcome::Replied => self.log.render(&self.session.entries()),
                TurnOutcome::Failed(diagnostic) => {
                    self.status = Some(Status::Error(format!(
                        "Turn #{} failed: {}",
                        diagnostic.turn, diagnostic.message
                    )));
                }
                TurnOutcome::Stale => {}
            }
        }
    }

    pub fn cancel_reply(&mut self) {
        if let Some(task) = self.reply_task.take() {
            task.handle.abort();
            if let Some(id) = self.session.cancel() {
                self.status = Some(Status::Notice(format!("Turn #{} cancelled", id)));
            }
        }
    }

    pub fn tick_animation(&mut self) {
        if self.is_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
