use serde::{Deserialize, Serialize};

use crate::{clef::Clef, note::Note, score::Score, DomainError};

/// A missed note together with the clef it was shown on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReviewEntry {
    pub note: Note,
    pub clef: Clef,
}

impl ReviewEntry {
    pub fn new(note: Note, clef: Clef) -> Self {
        Self { note, clef }
    }

    /// Two entries are the same card when name, octave and clef match.
    /// Accidentals are ignored.
    pub fn same_card(&self, other: &ReviewEntry) -> bool {
        self.clef == other.clef && self.note.same_pitch_class_and_octave(&other.note)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteSelection {
    pub note: Note,
    pub clef: Clef,
    pub is_answer_revealed: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSnapshot {
    pub incorrect_notes: Vec<ReviewEntry>,
    pub review_queue: Vec<ReviewEntry>,
    pub is_review_mode: bool,
}

/// Everything needed to resume a session where it left off.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub score: Score,
    pub note_selection: NoteSelection,
    pub review: ReviewSnapshot,
}

impl SessionSnapshot {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.score.validate()?;
        let incorrect = &self.review.incorrect_notes;
        for (index, entry) in incorrect.iter().enumerate() {
            if incorrect[..index].iter().any(|prior| prior.same_card(entry)) {
                return Err(DomainError::validation(format!(
                    "duplicate missed note {} on {} clef",
                    entry.note, entry.clef
                )));
            }
        }
        if self.review.is_review_mode && self.review.review_queue.is_empty() {
            return Err(DomainError::validation(
                "review mode requires a non-empty review queue",
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, DomainError> {
        let snapshot: SessionSnapshot = serde_json::from_str(text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
