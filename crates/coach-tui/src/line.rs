//! Plain line mode: one turn per stdin line, log entries printed to stdout

use std::io::{self, Write};

use anyhow::Result;
use coach_core::{run_turn, ChatTransport, LogEntry, Renderer, Session};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Prints log entries it has not printed yet. A stream can't be redrawn, so
/// "replace the whole log" becomes "append what's new".
pub struct LinePrinter<W: Write> {
    out: W,
    printed: usize,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for LinePrinter<W> {
    fn render(&mut self, entries: &[LogEntry]) {
        for entry in entries.iter().skip(self.printed) {
            if let Err(e) = writeln!(self.out, "{}", entry.display()) {
                log::warn!("[line] Could not write entry: {}", e);
            }
        }
        self.printed = entries.len();
        if let Err(e) = self.out.flush() {
            log::warn!("[line] Could not flush output: {}", e);
        }
    }
}

pub async fn run(system_prompt: &str, transport: &dyn ChatTransport) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_lines(system_prompt, transport, stdin, io::stdout()).await?;
    Ok(())
}

/// One turn per input line; returns the writer once input runs out
pub async fn run_lines<R, W>(
    system_prompt: &str,
    transport: &dyn ChatTransport,
    input: R,
    out: W,
) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::new(system_prompt);
    let mut printer = LinePrinter::new(out);
    printer.render(&session.entries());

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        // Blank lines are rejected and failures are logged by the session
        run_turn(&mut session, transport, &mut printer, &line).await.ok();
    }

    Ok(printer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coach_core::{project, Message, Transcript, TransportError};

    /// Replies with the upper-cased message, failing on "fail"
    struct Shout;

    #[async_trait]
    impl ChatTransport for Shout {
        async fn send_turn(&self, messages: &[Message]) -> Result<String, TransportError> {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            if last == "fail" {
                return Err(TransportError::Status {
                    status: 503,
                    body: "busy".to_string(),
                });
            }
            Ok(last.to_uppercase())
        }
    }

    struct NoFlush(Vec<u8>);

    impl Write for NoFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_printer_only_writes_new_entries() {
        let mut transcript = Transcript::seeded("S");
        let mut printer = LinePrinter::new(Vec::new());
        printer.render(&project(&transcript));

        transcript.append(Message::user("調子どう？"));
        printer.render(&project(&transcript));
        transcript.append(Message::assistant("元気ですか？"));
        printer.render(&project(&transcript));
        printer.render(&project(&transcript));

        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(out, "⚙️ S\n🧑 調子どう？\n🤖 元気ですか？\n");
    }

    #[tokio::test]
    async fn test_lines_skip_blanks_and_survive_failures() {
        let input: &[u8] = b"hi\n   \nfail\nthere\n";
        let out = run_lines("S", &Shout, input, Vec::new()).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "⚙️ S\n🧑 hi\n🤖 HI\n🧑 fail\n🧑 there\n🤖 THERE\n");
    }

    #[test]
    fn test_flush_failure_does_not_lose_entries() {
        let mut printer = LinePrinter::new(NoFlush(Vec::new()));
        let mut transcript = Transcript::seeded("S");
        printer.render(&project(&transcript));
        transcript.append(Message::user("hi"));
        printer.render(&project(&transcript));

        let out = String::from_utf8(printer.into_inner().0).unwrap();
        assert_eq!(out, "⚙️ S\n🧑 hi\n");
    }
}
