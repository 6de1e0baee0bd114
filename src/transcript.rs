//! Chat transcript types shared between the controller and the UI.
//!
//! Turns are immutable once appended and the transcript is append-only;
//! insertion order is the only ordering guarantee.

/// The author of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// One entry in the conversation transcript
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Backend agent that produced the reply; only set on successful agent turns
    pub agent_id: Option<u32>,
    /// True when this turn surfaces a failure instead of a genuine reply
    pub is_error: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            agent_id: None,
            is_error: false,
        }
    }

    pub fn agent(text: impl Into<String>, agent_id: Option<u32>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            agent_id,
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            agent_id: None,
            is_error: true,
        }
    }
}

/// Display name for a backend agent id. Unknown ids get a default label
/// rather than being rejected.
pub fn agent_name(id: u32) -> &'static str {
    match id {
        1 => "General Agent",
        2 => "SQL Query Generator",
        3 => "Calculator",
        _ => "Unknown Agent",
    }
}

/// Append-only log of conversation turns
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("first"));
        transcript.append(Turn::agent("second", Some(1)));
        transcript.append(Turn::user("third"));

        let texts: Vec<&str> = transcript.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn user_turn_has_no_agent_and_no_error() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.agent_id, None);
        assert!(!turn.is_error);
    }

    #[test]
    fn error_turn_is_agent_flagged() {
        let turn = Turn::error("something broke");
        assert_eq!(turn.role, Role::Agent);
        assert_eq!(turn.agent_id, None);
        assert!(turn.is_error);
    }

    #[test]
    fn agent_names_cover_known_ids_and_default() {
        assert_eq!(agent_name(1), "General Agent");
        assert_eq!(agent_name(2), "SQL Query Generator");
        assert_eq!(agent_name(3), "Calculator");
        assert_eq!(agent_name(42), "Unknown Agent");
    }

    #[test]
    fn turn_text_keeps_newlines_verbatim() {
        let turn = Turn::agent("line one\n  indented line two", None);
        assert_eq!(turn.text, "line one\n  indented line two");
    }
}
