use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use ledger_domain::{Clef, Note, ReviewEntry, ReviewSnapshot};

/// Missed notes and the shuffled queue used to drill them again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQueue {
    incorrect_notes: Vec<ReviewEntry>,
    queue: Vec<ReviewEntry>,
    is_review_mode: bool,
    is_review_finished: bool,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the queue from a persisted snapshot, dropping duplicate
    /// missed notes.
    pub fn restore(snapshot: &ReviewSnapshot) -> Self {
        let mut review = Self::new();
        for entry in &snapshot.incorrect_notes {
            review.push_unique(*entry);
        }
        review.queue = snapshot.review_queue.clone();
        review.is_review_mode = snapshot.is_review_mode && !review.queue.is_empty();
        review
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            incorrect_notes: self.incorrect_notes.clone(),
            review_queue: self.queue.clone(),
            is_review_mode: self.is_review_mode,
        }
    }

    pub fn record_miss(&mut self, note: Note, clef: Clef) {
        self.is_review_finished = false;
        if self.push_unique(ReviewEntry::new(note, clef)) {
            debug!(%note, %clef, "recorded missed note");
        }
    }

    pub fn start_review<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ReviewEntry> {
        if self.incorrect_notes.is_empty() {
            return None;
        }
        let mut shuffled = std::mem::take(&mut self.incorrect_notes);
        shuffled.shuffle(rng);
        self.queue = shuffled;
        self.is_review_mode = true;
        self.is_review_finished = false;
        info!(cards = self.queue.len(), "review started");
        self.current()
    }

    /// Drops the current card. Returns the next one, or `None` when the
    /// round is over.
    pub fn advance(&mut self) -> Option<ReviewEntry> {
        if !self.queue.is_empty() {
            self.queue.remove(0);
        }
        if self.queue.is_empty() {
            if self.is_review_mode {
                info!("review finished");
            }
            self.is_review_mode = false;
            self.is_review_finished = true;
            return None;
        }
        self.current()
    }

    /// Moves the current card to the back of the queue.
    pub fn requeue_current(&mut self) -> Option<ReviewEntry> {
        if !self.queue.is_empty() {
            let current = self.queue.remove(0);
            self.queue.push(current);
        }
        self.current()
    }

    /// Leaves review mode, returning unreviewed cards to the missed set.
    pub fn cancel(&mut self) {
        for entry in std::mem::take(&mut self.queue) {
            self.push_unique(entry);
        }
        self.is_review_mode = false;
        self.is_review_finished = false;
        info!(missed = self.incorrect_notes.len(), "review stopped");
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current(&self) -> Option<ReviewEntry> {
        self.queue.first().copied()
    }

    pub fn can_review(&self) -> bool {
        !self.incorrect_notes.is_empty() || self.is_review_mode
    }

    pub fn is_review_mode(&self) -> bool {
        self.is_review_mode
    }

    pub fn is_review_finished(&self) -> bool {
        self.is_review_finished
    }

    pub fn incorrect_notes(&self) -> &[ReviewEntry] {
        &self.incorrect_notes
    }

    pub fn queue(&self) -> &[ReviewEntry] {
        &self.queue
    }

    fn push_unique(&mut self, entry: ReviewEntry) -> bool {
        if self.incorrect_notes.iter().any(|existing| existing.same_card(&entry)) {
            return false;
        }
        self.incorrect_notes.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::{Accidental, NoteName};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn note(name: NoteName, octave: i32) -> Note {
        Note::new(name, octave)
    }

    #[test]
    fn record_miss_deduplicates() {
        let mut review = ReviewQueue::new();
        review.record_miss(note(NoteName::C, 4), Clef::Treble);
        review.record_miss(note(NoteName::C, 4), Clef::Treble);
        review.record_miss(
            note(NoteName::C, 4).with_accidental(Accidental::Sharp),
            Clef::Treble,
        );
        review.record_miss(note(NoteName::C, 4), Clef::Bass);
        assert_eq!(review.incorrect_notes().len(), 2);
        assert!(review.can_review());
    }

    #[test]
    fn start_review_on_empty_set_is_noop() {
        let mut review = ReviewQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(review.start_review(&mut rng), None);
        assert!(!review.is_review_mode());
        assert!(!review.can_review());
    }

    #[test]
    fn review_round_drains_queue() {
        let mut review = ReviewQueue::new();
        let mut rng = StdRng::seed_from_u64(9);
        for name in [NoteName::C, NoteName::E, NoteName::G] {
            review.record_miss(note(name, 4), Clef::Treble);
        }

        let head = review.start_review(&mut rng).unwrap();
        assert!(review.is_review_mode());
        assert!(review.incorrect_notes().is_empty());
        assert_eq!(review.queue().len(), 3);
        assert_eq!(review.current(), Some(head));
        assert!(review.can_review());

        assert!(review.advance().is_some());
        assert!(review.advance().is_some());
        assert_eq!(review.advance(), None);
        assert!(!review.is_review_mode());
        assert!(review.is_review_finished());
        assert!(!review.can_review());
    }

    #[test]
    fn shuffle_keeps_every_card() {
        let mut review = ReviewQueue::new();
        let mut rng = StdRng::seed_from_u64(4);
        for step in 0..12 {
            review.record_miss(Note::from_diatonic_step(step), Clef::Treble);
        }
        review.start_review(&mut rng);
        let mut steps: Vec<i32> = review.queue().iter().map(|e| e.note.diatonic_step()).collect();
        steps.sort_unstable();
        assert_eq!(steps, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn requeue_moves_head_to_tail() {
        let mut review = ReviewQueue::restore(&ReviewSnapshot {
            incorrect_notes: Vec::new(),
            review_queue: vec![
                ReviewEntry::new(note(NoteName::A, 4), Clef::Treble),
                ReviewEntry::new(note(NoteName::B, 4), Clef::Treble),
            ],
            is_review_mode: true,
        });
        let next = review.requeue_current().unwrap();
        assert_eq!(next.note, note(NoteName::B, 4));
        assert_eq!(review.queue()[1].note, note(NoteName::A, 4));
    }

    #[test]
    fn cancel_returns_cards_to_missed_set() {
        let mut review = ReviewQueue::new();
        let mut rng = StdRng::seed_from_u64(2);
        review.record_miss(note(NoteName::D, 4), Clef::Treble);
        review.record_miss(note(NoteName::F, 4), Clef::Treble);
        review.start_review(&mut rng);
        review.advance();
        review.cancel();
        assert!(!review.is_review_mode());
        assert!(!review.is_review_finished());
        assert!(review.queue().is_empty());
        assert_eq!(review.incorrect_notes().len(), 1);
    }

    #[test]
    fn miss_clears_finished_flag() {
        let mut review = ReviewQueue::new();
        let mut rng = StdRng::seed_from_u64(2);
        review.record_miss(note(NoteName::D, 4), Clef::Treble);
        review.start_review(&mut rng);
        review.advance();
        assert!(review.is_review_finished());
        review.record_miss(note(NoteName::D, 4), Clef::Treble);
        assert!(!review.is_review_finished());
    }

    #[test]
    fn restore_drops_empty_review_mode() {
        let review = ReviewQueue::restore(&ReviewSnapshot {
            incorrect_notes: vec![ReviewEntry::new(note(NoteName::D, 4), Clef::Treble)],
            review_queue: Vec::new(),
            is_review_mode: true,
        });
        assert!(!review.is_review_mode());
        assert!(review.can_review());
    }
}
