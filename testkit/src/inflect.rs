//! Wording that depends on the kind of message being discussed.
//!
//! Templates use placeholders that are replaced according to the kind:
//!
//! | placeholder    | command    | event     | timeout     |
//! |----------------|------------|-----------|-------------|
//! | `a <message>`  | a command  | an event  | a timeout   |
//! | `<message>`    | command    | event     | timeout     |
//! | `<messages>`   | commands   | events    | timeouts    |
//! | `<produce>`    | execute    | record    | schedule    |
//! | `<produced>`   | executed   | recorded  | scheduled   |

use crate::MessageKind;

pub(crate) fn message(kind: MessageKind) -> &'static str {
    kind.name()
}

pub(crate) fn messages(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Command => "commands",
        MessageKind::Event => "events",
        MessageKind::Timeout => "timeouts",
    }
}

pub(crate) fn produce(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Command => "execute",
        MessageKind::Event => "record",
        MessageKind::Timeout => "schedule",
    }
}

pub(crate) fn produced(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Command => "executed",
        MessageKind::Event => "recorded",
        MessageKind::Timeout => "scheduled",
    }
}

/// Replaces the placeholders in `template` for the given kind.
pub(crate) fn inflect(kind: MessageKind, template: &str) -> String {
    template
        .replace("a <message>", kind.indefinite())
        .replace("<messages>", messages(kind))
        .replace("<message>", message(kind))
        .replace("<produced>", produced(kind))
        .replace("<produce>", produce(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_the_kind() {
        assert_eq!(
            inflect(MessageKind::Event, "a <message> was <produced>, <produce> more <messages>"),
            "an event was recorded, record more events"
        );
        assert_eq!(
            inflect(MessageKind::Command, "no <messages> were <produced> at all"),
            "no commands were executed at all"
        );
        assert_eq!(inflect(MessageKind::Timeout, "<produce> a <message>"), "schedule a timeout");
    }
}
