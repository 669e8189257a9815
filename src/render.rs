use crate::body::extract_body;
use crate::models::{Message, Thread};
use crate::quotes::strip_quotes;
use crossterm::style::{ContentStyle, Stylize};
use std::io::{self, Write};

const NO_SUBJECT: &str = "(no subject)";

#[derive(Debug, Clone, Copy)]
enum Tone {
    Banner,
    Heading,
    Counter,
    Label,
    Muted,
    Warning,
}

/// Writes search status lines and threads to a terminal-like sink.
pub struct ThreadRenderer<W: Write> {
    out: W,
    rule_width: usize,
    color: bool,
}

impl<W: Write> ThreadRenderer<W> {
    pub fn new(out: W, rule_width: usize, color: bool) -> Self {
        Self {
            out,
            rule_width,
            color,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn search_banner(&mut self, query: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {}\n",
            paint(self.color, "Searching Gmail for:", Tone::Muted),
            paint(self.color, query, Tone::Heading)
        )
    }

    pub fn page_summary(&mut self, page: u32, shown: usize, has_more: bool) -> io::Result<()> {
        let summary = format!("Page {page} · Showing {shown} thread(s)");
        writeln!(self.out, "{}", paint(self.color, &summary, Tone::Muted))?;
        if has_more {
            let hint = format!("More results available (use --page {})", page + 1);
            writeln!(self.out, "{}", paint(self.color, &hint, Tone::Muted))?;
        }
        writeln!(self.out)
    }

    pub fn no_results(&mut self) -> io::Result<()> {
        let text = paint(self.color, "No threads found matching your query.", Tone::Warning);
        writeln!(self.out, "{text}")
    }

    pub fn page_unavailable(&mut self, page: u32, available: u32) -> io::Result<()> {
        let text = format!("No results on page {page}. Only {available} page(s) available.");
        writeln!(self.out, "{}", paint(self.color, &text, Tone::Warning))
    }

    /// Prints the thread subject once, then every message in order with its
    /// quoted history removed. Empty threads print nothing.
    pub fn render_thread(&mut self, thread: &Thread) -> io::Result<()> {
        let Some(first) = thread.messages.first() else {
            return Ok(());
        };

        let subject = match first.header("Subject") {
            "" => NO_SUBJECT,
            s => s,
        };
        let border = "═".repeat(self.rule_width);
        writeln!(self.out, "{}", paint(self.color, &border, Tone::Banner))?;
        writeln!(self.out, "{}", paint(self.color, subject, Tone::Heading))?;
        writeln!(self.out, "{}", paint(self.color, &border, Tone::Banner))?;

        let total = thread.messages.len();
        tracing::debug!(thread = %thread.id, messages = total, "Rendering thread");
        for (i, message) in thread.messages.iter().enumerate() {
            self.render_message(message, i + 1, total)?;
        }

        writeln!(self.out)?;
        self.out.flush()
    }

    fn render_message(&mut self, message: &Message, index: usize, total: usize) -> io::Result<()> {
        let body = strip_quotes(&extract_body(&message.payload));
        tracing::trace!(message = %message.id, chars = body.len(), "Extracted body");
        let rule = paint(self.color, &"─".repeat(self.rule_width), Tone::Muted);

        writeln!(self.out, "\n{rule}")?;
        let counter = format!("Message {index}/{total}");
        writeln!(self.out, "{}", paint(self.color, &counter, Tone::Counter))?;
        writeln!(self.out, "{} {}", paint(self.color, "From:", Tone::Label), message.header("From"))?;
        writeln!(self.out, "{}   {}", paint(self.color, "To:", Tone::Label), message.header("To"))?;
        writeln!(self.out, "{} {}", paint(self.color, "Date:", Tone::Label), message.header("Date"))?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "{}", body.trim())
    }
}

fn paint(color: bool, text: &str, tone: Tone) -> String {
    if !color {
        return text.to_string();
    }

    let style = match tone {
        Tone::Banner => ContentStyle::new().blue(),
        Tone::Heading => ContentStyle::new().bold(),
        Tone::Counter => ContentStyle::new().cyan(),
        Tone::Label => ContentStyle::new().green(),
        Tone::Muted => ContentStyle::new().dim(),
        Tone::Warning => ContentStyle::new().yellow(),
    };
    style.apply(text).to_string()
}
