use std::fmt;

/// The role a message plays within the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Command,
    Event,
    Timeout,
}

impl MessageKind {
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Command => "command",
            MessageKind::Event => "event",
            MessageKind::Timeout => "timeout",
        }
    }

    /// The kind's name preceded by its indefinite article.
    pub fn indefinite(&self) -> &'static str {
        match self {
            MessageKind::Command => "a command",
            MessageKind::Event => "an event",
            MessageKind::Timeout => "a timeout",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
