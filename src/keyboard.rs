use std::collections::HashMap;

use crate::feedback::LetterState;

/// Best-known state per letter across every judged guess of a session.
///
/// Observations never downgrade a letter: once a key is shown `Correct` it
/// stays `Correct` for the rest of the session.
#[derive(Debug, Default, Clone)]
pub struct KeyboardAggregator {
    states: HashMap<char, LetterState>,
}

impl KeyboardAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one judged guess. Returns the letters whose recorded state
    /// changed, in guess order and without duplicates.
    pub fn observe(&mut self, guess: &[char], states: &[LetterState]) -> Vec<(char, LetterState)> {
        let mut changed: Vec<(char, LetterState)> = Vec::new();

        for (&letter, &state) in guess.iter().zip(states) {
            let letter = letter.to_ascii_uppercase();
            let upgrade = match self.states.get(&letter) {
                Some(prior) => state.priority() > prior.priority(),
                None => true,
            };
            if !upgrade {
                continue;
            }
            self.states.insert(letter, state);
            match changed.iter_mut().find(|(l, _)| *l == letter) {
                Some(entry) => entry.1 = state,
                None => changed.push((letter, state)),
            }
        }

        changed
    }

    /// `None` means the letter has not been judged yet.
    pub fn best_state(&self, letter: char) -> Option<LetterState> {
        self.states.get(&letter.to_ascii_uppercase()).copied()
    }

    pub fn snapshot(&self) -> &HashMap<char, LetterState> {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LetterState::{Absent, Correct, Present};

    #[test]
    fn test_unknown_letter() {
        let kb = KeyboardAggregator::new();
        assert_eq!(kb.best_state('A'), None);
    }

    #[test]
    fn test_never_downgrades() {
        let mut kb = KeyboardAggregator::new();
        for state in [Absent, Present, Correct, Absent] {
            kb.observe(&['A'], &[state]);
        }
        assert_eq!(kb.best_state('A'), Some(Correct));
    }

    #[test]
    fn test_equal_priority_is_not_a_change() {
        let mut kb = KeyboardAggregator::new();
        assert_eq!(kb.observe(&['B'], &[Present]), vec![('B', Present)]);
        assert!(kb.observe(&['B'], &[Present]).is_empty());
        assert!(kb.observe(&['B'], &[Absent]).is_empty());
        assert_eq!(kb.best_state('B'), Some(Present));
    }

    #[test]
    fn test_repeated_letter_within_one_guess() {
        let mut kb = KeyboardAggregator::new();
        let changed = kb.observe(
            &['S', 'T', 'E', 'E', 'L'],
            &[Absent, Absent, Present, Correct, Absent],
        );
        assert_eq!(kb.best_state('E'), Some(Correct));
        assert_eq!(
            changed,
            vec![('S', Absent), ('T', Absent), ('E', Correct), ('L', Absent)]
        );
    }

    #[test]
    fn test_lowercase_lookups_share_state() {
        let mut kb = KeyboardAggregator::new();
        kb.observe(&['q'], &[Present]);
        assert_eq!(kb.best_state('Q'), Some(Present));
        assert_eq!(kb.best_state('q'), Some(Present));
        assert_eq!(kb.snapshot().len(), 1);
    }
}
