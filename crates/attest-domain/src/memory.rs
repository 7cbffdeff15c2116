//! Conversation memory for one session

use crate::{Fragment, Verdict};

/// One answered question
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// The question as asked
    pub question: String,

    /// The accepted verdict
    pub verdict: Verdict,

    /// Fragments the verdict was grounded on, in retrieval order
    pub fragments: Vec<Fragment>,

    /// Number of model invocations it took to reach the verdict
    pub attempts: usize,
}

/// Ordered turns of a single session
///
/// Memory only grows through [`ConversationMemory::append`] and only shrinks
/// through [`ConversationMemory::clear`]. The decision engine that owns it is
/// the only writer.
///
/// # Examples
///
/// ```
/// use attest_domain::ConversationMemory;
///
/// let memory = ConversationMemory::new();
/// assert!(memory.is_empty());
/// assert!(memory.recent(3).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VerdictKind;
    use proptest::prelude::*;

    fn turn(i: usize) -> Turn {
        Turn {
            question: format!("question {}", i),
            verdict: Verdict::new(VerdictKind::Yes, "ok", vec![]).unwrap(),
            fragments: vec![],
            attempts: 1,
        }
    }

    #[test]
    fn test_append_and_clear() {
        let mut memory = ConversationMemory::new();
        memory.append(turn(0));
        memory.append(turn(1));
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.turns()[1].question, "question 1");

        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_recent_keeps_order() {
        let mut memory = ConversationMemory::new();
        for i in 0..5 {
            memory.append(turn(i));
        }
        let recent = memory.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "question 3");
        assert_eq!(recent[1].question, "question 4");
    }

    proptest! {
        #[test]
        fn prop_recent_is_bounded_suffix(total in 0usize..20, window in 0usize..10) {
            let mut memory = ConversationMemory::new();
            for i in 0..total {
                memory.append(turn(i));
            }
            let recent = memory.recent(window);
            prop_assert_eq!(recent.len(), total.min(window));
            if let Some(last) = recent.last() {
                prop_assert_eq!(&last.question, &format!("question {}", total - 1));
            }
        }
    }
}
