//! Terminal output for the interactive session
//!
//! In raw mode the terminal does not translate `\n` into a carriage
//! return, so every line ending goes through [`Printer::newline`].

use std::io::{self, Write};

use crate::events::ModeAction;
use crate::modes::{Mode, ModeKind};

pub struct Printer<W: Write> {
    out: W,
    raw: bool,
    /// An assistant reply is being streamed on the current line
    streaming: bool,
}

impl Printer<io::Stdout> {
    pub fn stdout(raw: bool) -> Self {
        Self::new(io::stdout(), raw)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, raw: bool) -> Self {
        Self {
            out,
            raw,
            streaming: false,
        }
    }

    fn newline(&mut self) {
        let ending = if self.raw { "\r\n" } else { "\n" };
        let _ = self.out.write_all(ending.as_bytes());
        let _ = self.out.flush();
    }

    /// Finish a streamed reply, if one is open
    fn end_stream(&mut self) {
        if self.streaming {
            self.streaming = false;
            self.newline();
        }
    }

    pub fn line(&mut self, text: &str) {
        self.end_stream();
        let _ = self.out.write_all(text.as_bytes());
        self.newline();
    }

    pub fn banner(&mut self, mode: &dyn Mode) {
        self.line(&format!(
            "voxterm {} | mode: {}",
            env!("CARGO_PKG_VERSION"),
            mode.kind()
        ));
        self.help(mode);
    }

    pub fn help(&mut self, mode: &dyn Mode) {
        self.line(mode.help());
        if mode.kind() != ModeKind::Text {
            self.line("H for help.");
        }
    }

    pub fn action(&mut self, action: &ModeAction) {
        if !action.is_ignored() {
            self.line(&format!("[{}]", action));
        }
    }

    pub fn error(&mut self, message: &str) {
        self.line(&format!("Error: {}", message));
    }

    pub fn transcript(&mut self, text: &str) {
        self.line(&format!("You: {}", text));
    }

    /// Append a chunk of the assistant's reply to the current line
    pub fn assistant_chunk(&mut self, text: &str) {
        if !self.streaming {
            self.streaming = true;
            let _ = self.out.write_all(b"AI: ");
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    pub fn response_done(&mut self, status: &str) {
        self.line(&format!("[response complete: {}]", status));
    }

    /// Input prompt for line modes
    pub fn prompt(&mut self) {
        self.end_stream();
        let _ = self.out.write_all(b"> ");
        let _ = self.out.flush();
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
