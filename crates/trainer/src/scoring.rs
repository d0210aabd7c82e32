use ledger_domain::Score;

/// Running tally of self-graded answers. `correct <= total` holds after
/// every transition because `correct` only moves together with `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTracker {
    score: Score,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted tally, rejecting one that breaks the invariant.
    pub fn from_score(score: Score) -> Option<Self> {
        score.validate().ok().map(|_| Self { score })
    }

    pub fn mark_correct(&mut self) {
        self.score.correct += 1;
        self.score.total += 1;
    }

    pub fn mark_incorrect(&mut self) {
        self.score.total += 1;
    }

    pub fn reset(&mut self) {
        self.score = Score::default();
    }

    pub fn score(&self) -> Score {
        self.score
    }
}
