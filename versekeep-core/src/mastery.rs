//! Mastery detection over a verse's attempt history
//!
//! A verse is mastered once the user has at least [`MIN_ATTEMPTS`] recorded
//! attempts, some window of [`PERFECT_RUN`] consecutive perfect attempts
//! exists, and accuracy from the most recent attempt back through that window
//! is at least [`ACCURACY_THRESHOLD`]. All thresholds are fixed.

/// Minimum recorded attempts before mastery can be considered.
pub const MIN_ATTEMPTS: usize = 5;

/// Required run of consecutive perfect attempts.
pub const PERFECT_RUN: usize = 3;

/// Required accuracy over the attempts up to and including the perfect run.
pub const ACCURACY_THRESHOLD: f64 = 0.95;

/// One recorded attempt at reciting a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub words_correct: i64,
    pub total_words: i64,
}

impl Attempt {
    pub fn is_perfect(&self) -> bool {
        self.total_words > 0 && self.words_correct == self.total_words
    }
}

/// Length of the run of perfect attempts ending at the most recent one.
///
/// `newest_first` is ordered most-recent attempt first.
pub fn perfect_run_length(newest_first: &[Attempt]) -> usize {
    newest_first.iter().take_while(|a| a.is_perfect()).count()
}

/// Whether the attempt history qualifies for mastery.
///
/// Scans from the most recent attempt for the earliest window of
/// [`PERFECT_RUN`] consecutive perfect attempts, then checks accuracy over
/// every attempt from the newest through the end of that window inclusive.
pub fn qualifies(newest_first: &[Attempt]) -> bool {
    if newest_first.len() < MIN_ATTEMPTS {
        return false;
    }

    let window_start = (0..=newest_first.len().saturating_sub(PERFECT_RUN)).find(|&i| {
        newest_first[i..i + PERFECT_RUN]
            .iter()
            .all(Attempt::is_perfect)
    });

    let Some(start) = window_start else {
        return false;
    };

    let scored = &newest_first[..start + PERFECT_RUN];
    let correct: i64 = scored.iter().map(|a| a.words_correct).sum();
    let total: i64 = scored.iter().map(|a| a.total_words).sum();

    total > 0 && correct as f64 / total as f64 >= ACCURACY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(words_correct: i64, total_words: i64) -> Attempt {
        Attempt {
            words_correct,
            total_words,
        }
    }

    /// Convenience: build newest-first history from oldest-first notation.
    fn newest_first(oldest_first: &[(i64, i64)]) -> Vec<Attempt> {
        oldest_first.iter().rev().map(|&(c, t)| a(c, t)).collect()
    }

    #[test]
    fn too_few_attempts_never_qualify() {
        let history = newest_first(&[(5, 5), (5, 5), (5, 5), (5, 5)]);
        assert!(!qualifies(&history));
    }

    #[test]
    fn no_perfect_run_never_qualifies() {
        let history = newest_first(&[(5, 5), (4, 5), (5, 5), (4, 5), (5, 5)]);
        assert!(!qualifies(&history));
    }

    #[test]
    fn boundary_accuracy_scenario() {
        // Oldest to newest: 3/5, 5/5, 5/5, 5/5, 4/5. The perfect run sits one
        // attempt back from the newest; accuracy over the four attempts
        // through the window is 19/20 = 0.95, exactly on the threshold.
        let history = newest_first(&[(3, 5), (5, 5), (5, 5), (5, 5), (4, 5)]);
        assert!(qualifies(&history));
    }

    #[test]
    fn low_accuracy_around_perfect_run_fails() {
        let history = newest_first(&[(0, 5), (5, 5), (5, 5), (5, 5), (1, 5)]);
        assert!(!qualifies(&history));
    }

    #[test]
    fn trailing_perfect_run_qualifies() {
        let history = newest_first(&[(3, 5), (4, 5), (5, 5), (5, 5), (5, 5)]);
        assert!(qualifies(&history));
    }

    #[test]
    fn old_attempts_beyond_window_are_ignored() {
        // Terrible early history must not block mastery once the recent
        // window qualifies on its own.
        let history = newest_first(&[(0, 5), (0, 5), (1, 5), (5, 5), (5, 5), (5, 5)]);
        assert!(qualifies(&history));
    }

    #[test]
    fn perfect_run_length_counts_from_newest() {
        let history = newest_first(&[(3, 5), (5, 5), (5, 5), (5, 5)]);
        assert_eq!(perfect_run_length(&history), 3);

        let broken = newest_first(&[(5, 5), (5, 5), (4, 5)]);
        assert_eq!(perfect_run_length(&broken), 0);
    }

    #[test]
    fn zero_word_attempts_are_not_perfect() {
        assert!(!a(0, 0).is_perfect());
    }
}
