//! Directive parsing.
//!
//! A directive is any inbound text starting with `@`. The command token is the
//! text up to the first space, matched case-insensitively; everything after
//! that space is the argument.

/// Marker that distinguishes a directive from a plain check-in.
pub const DIRECTIVE_MARKER: char = '@';

pub const HELP_MESSAGE: &str = "@sos MSG: send an emergency message to all\n\
                                @ok MSG: send an ok message to all\n\
                                @reset TIME: reset check-in interval\n\
                                @stop: stop check-ins\n\
                                @quit: quit the service (no longer receive updates)";

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Distress: alert everyone with the message
    Sos(String),
    /// Change the check-in interval
    Reset(String),
    /// Pause check-ins until the next message
    Stop,
    /// Tell everyone all is well, and check in with the message
    Ok(String),
    /// Leave the service
    Quit,
    /// Anything else; carries the lowercased token
    Unknown(String),
}

impl Directive {
    /// Parse `text` as a directive. Returns `None` for plain check-ins.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with(DIRECTIVE_MARKER) {
            return None;
        }

        let (token, argument) = match text.split_once(' ') {
            Some((token, argument)) => (token, argument),
            None => (text, ""),
        };

        let directive = match token.to_lowercase().as_str() {
            "@sos" => Self::Sos(argument.to_string()),
            "@reset" => Self::Reset(argument.trim().to_string()),
            "@stop" => Self::Stop,
            "@ok" => Self::Ok(argument.to_string()),
            "@quit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        };
        Some(directive)
    }

    /// Name used in audit logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Sos(_) => "sos",
            Self::Reset(_) => "reset",
            Self::Stop => "stop",
            Self::Ok(_) => "ok",
            Self::Quit => "quit",
            Self::Unknown(_) => "unknown",
        }
    }
}
