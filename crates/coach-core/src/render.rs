//! Projection of a transcript into displayable log entries

use crate::message::Role;
use crate::transcript::Transcript;

/// One rendered line of the chat log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub role: Role,
    pub icon: &'static str,
    pub text: String,
}

impl LogEntry {
    /// Style class derived from the role ("user", "assistant", "system")
    pub fn class(&self) -> &'static str {
        self.role.as_str()
    }

    /// Icon and text joined the way the log displays them
    pub fn display(&self) -> String {
        format!("{} {}", self.icon, self.text)
    }
}

/// A surface that shows the chat log.
///
/// Every call replaces whatever was shown before and should bring the newest
/// entry into view.
pub trait Renderer {
    fn render(&mut self, entries: &[LogEntry]);
}

pub fn project(transcript: &Transcript) -> Vec<LogEntry> {
    transcript
        .all()
        .iter()
        .map(|msg| LogEntry {
            role: msg.role,
            icon: msg.role.icon(),
            text: msg.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_project_keeps_order_and_roles() {
        let mut transcript = Transcript::seeded("S");
        transcript.append(Message::user("調子どう？"));
        transcript.append(Message::assistant("元気ですか？"));

        let entries = project(&transcript);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].class(), "system");
        assert_eq!(entries[1].display(), "🧑 調子どう？");
        assert_eq!(entries[2].display(), "🤖 元気ですか？");
        assert_eq!(entries[2].class(), "assistant");
    }

    #[test]
    fn test_system_entry_uses_gear() {
        let entries = project(&Transcript::seeded("S"));
        assert_eq!(entries[0].icon, "⚙️");
        assert_eq!(entries[0].text, "S");
    }
}
