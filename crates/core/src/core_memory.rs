//! Core memory: the bounded context window presented to the model.
//!
//! Two fixed narrative sections (`boot`, `bios`), two editable segments
//! (`persona`, `human`) and an ordered message history. The history is
//! length-capped: appending past the cap evicts from the front, and the
//! evicted messages are handed back so the caller can forward them to the
//! recall tier exactly once.
//!
//! Segment limits are checked, never enforced by truncation.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named, bounded, editable text region of core memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Persona,
    Human,
}

impl Segment {
    /// Every bounded segment, in check order.
    pub const ALL: [Segment; 2] = [Segment::Persona, Segment::Human];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Persona => "persona",
            Segment::Human => "human",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Segment {
    type Err = CoreEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persona" => Ok(Segment::Persona),
            "human" => Ok(Segment::Human),
            other => Err(CoreEditError::UnknownSegment(other.to_string())),
        }
    }
}

/// A requested change to a core memory segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEdit {
    /// Replace an exact substring inside a segment
    ReplaceInSegment {
        segment: Segment,
        old_content: String,
        new_content: String,
    },
    /// Replace a segment wholesale
    ReplaceSegment { segment: Segment, content: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreEditError {
    #[error("unknown segment '{0}', expected 'persona' or 'human'")]
    UnknownSegment(String),

    #[error("content to replace was not found in the {0} segment")]
    ContentNotFound(Segment),

    #[error("content to replace must not be empty")]
    EmptyPattern,
}

/// The agent's working memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreMemory {
    /// Introduces the model to this agent instance
    pub boot: String,

    /// Explains the memory conventions to the model
    pub bios: String,

    /// The agent's personality
    pub persona: String,

    /// What the agent knows about its human
    pub human: String,

    /// Visible message history, oldest first
    #[serde(default)]
    pub history: Vec<Message>,
}

impl CoreMemory {
    pub fn new(
        boot: impl Into<String>,
        bios: impl Into<String>,
        persona: impl Into<String>,
        human: impl Into<String>,
    ) -> Self {
        Self {
            boot: boot.into(),
            bios: bios.into(),
            persona: persona.into(),
            human: human.into(),
            history: Vec::new(),
        }
    }

    /// Append `message` and evict from the front until `history.len() <= max_history`.
    ///
    /// Returns the evicted messages, oldest first. Empty when nothing had to go.
    pub fn append_and_evict(&mut self, message: Message, max_history: usize) -> Vec<Message> {
        self.history.push(message);
        let overflow = self.history.len().saturating_sub(max_history);
        self.history.drain(..overflow).collect()
    }

    /// Whether `segment` is longer than `max_chars` characters.
    pub fn segment_overflow(&self, segment: Segment, max_chars: usize) -> bool {
        self.segment_chars(segment) > max_chars
    }

    pub fn segment(&self, segment: Segment) -> &str {
        match segment {
            Segment::Persona => &self.persona,
            Segment::Human => &self.human,
        }
    }

    /// Character (not byte) length of a segment.
    pub fn segment_chars(&self, segment: Segment) -> usize {
        self.segment(segment).chars().count()
    }

    fn segment_mut(&mut self, segment: Segment) -> &mut String {
        match segment {
            Segment::Persona => &mut self.persona,
            Segment::Human => &mut self.human,
        }
    }

    /// Apply a segment edit in place.
    pub fn apply(&mut self, edit: &CoreEdit) -> Result<(), CoreEditError> {
        match edit {
            CoreEdit::ReplaceInSegment {
                segment,
                old_content,
                new_content,
            } => {
                if old_content.is_empty() {
                    return Err(CoreEditError::EmptyPattern);
                }
                let text = self.segment_mut(*segment);
                if !text.contains(old_content.as_str()) {
                    return Err(CoreEditError::ContentNotFound(*segment));
                }
                *text = text.replacen(old_content.as_str(), new_content, 1);
            }
            CoreEdit::ReplaceSegment { segment, content } => {
                *self.segment_mut(*segment) = content.clone();
            }
        }
        Ok(())
    }

    /// Total characters across every section, history included.
    pub fn total_chars(&self) -> usize {
        self.boot.chars().count()
            + self.bios.chars().count()
            + self.persona.chars().count()
            + self.human.chars().count()
            + self
                .history
                .iter()
                .map(|m| m.content.chars().count())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn append_within_bound_evicts_nothing() {
        let mut core = CoreMemory::default();
        assert!(core.append_and_evict(Message::user("M1"), 3).is_empty());
        assert!(core.append_and_evict(Message::user("M2"), 3).is_empty());
        assert_eq!(core.history.len(), 2);
    }

    #[test]
    fn fourth_message_evicts_the_oldest() {
        let mut core = CoreMemory::default();
        for m in ["M1", "M2", "M3"] {
            assert!(core.append_and_evict(Message::user(m), 3).is_empty());
        }
        let evicted = core.append_and_evict(Message::user("M4"), 3);
        assert_eq!(contents(&evicted), vec!["M1"]);
        assert_eq!(contents(&core.history), vec!["M2", "M3", "M4"]);
    }

    #[test]
    fn shrinking_bound_evicts_oldest_in_order() {
        let mut core = CoreMemory::default();
        for m in ["a", "b", "c", "d", "e"] {
            core.append_and_evict(Message::user(m), 10);
        }
        let evicted = core.append_and_evict(Message::user("f"), 2);
        assert_eq!(contents(&evicted), vec!["a", "b", "c", "d"]);
        assert_eq!(contents(&core.history), vec!["e", "f"]);
    }

    #[test]
    fn history_never_exceeds_bound() {
        let mut core = CoreMemory::default();
        for i in 0..50 {
            let max = i % 7;
            core.append_and_evict(Message::user(i.to_string()), max);
            assert!(core.history.len() <= max);
        }
    }

    #[test]
    fn zero_bound_evicts_the_new_message_too() {
        let mut core = CoreMemory::default();
        let evicted = core.append_and_evict(Message::user("only"), 0);
        assert_eq!(contents(&evicted), vec!["only"]);
        assert!(core.history.is_empty());
    }

    #[test]
    fn segment_overflow_is_a_pure_check() {
        let core = CoreMemory::new("boot", "bios", "ééééé", "short");
        assert!(!core.segment_overflow(Segment::Persona, 5));
        assert!(core.segment_overflow(Segment::Persona, 4));
        assert!(!core.segment_overflow(Segment::Human, 100));
        assert_eq!(core.persona, "ééééé");
    }

    #[test]
    fn replace_in_segment() {
        let mut core = CoreMemory::new("", "", "I like tea.", "Name: Sam");
        core.apply(&CoreEdit::ReplaceInSegment {
            segment: Segment::Persona,
            old_content: "tea".into(),
            new_content: "coffee".into(),
        })
        .unwrap();
        assert_eq!(core.persona, "I like coffee.");
    }

    #[test]
    fn replace_in_segment_requires_a_match() {
        let mut core = CoreMemory::new("", "", "I like tea.", "");
        let err = core
            .apply(&CoreEdit::ReplaceInSegment {
                segment: Segment::Persona,
                old_content: "juice".into(),
                new_content: "water".into(),
            })
            .unwrap_err();
        assert_eq!(err, CoreEditError::ContentNotFound(Segment::Persona));
        assert_eq!(core.persona, "I like tea.");
    }

    #[test]
    fn replace_whole_segment() {
        let mut core = CoreMemory::new("", "", "", "old");
        core.apply(&CoreEdit::ReplaceSegment {
            segment: Segment::Human,
            content: "new".into(),
        })
        .unwrap();
        assert_eq!(core.human, "new");
    }

    #[test]
    fn segment_parses_case_insensitively() {
        assert_eq!("Persona".parse::<Segment>().unwrap(), Segment::Persona);
        assert_eq!(" human ".parse::<Segment>().unwrap(), Segment::Human);
        assert!("boot".parse::<Segment>().is_err());
    }
}
