use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ledger_domain::{Clef, GameSettings, Note};

/// Viewport heights at or below this only fit a few ledger lines.
pub const CONSTRAINED_HEIGHT: f32 = 380.0;
pub const CONSTRAINED_MAX_LEDGER_LINES: u8 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawnNote {
    pub note: Note,
    pub clef: Clef,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoteSelector;

impl NoteSelector {
    pub fn draw<R: Rng + ?Sized>(
        &self,
        settings: &GameSettings,
        height_hint: Option<f32>,
        rng: &mut R,
    ) -> DrawnNote {
        let clef = match settings.clef.fixed() {
            Some(clef) => clef,
            None => {
                if rng.gen_bool(0.5) {
                    Clef::Treble
                } else {
                    Clef::Bass
                }
            }
        };
        let ledger_lines = effective_ledger_lines(settings.max_ledger_lines, height_hint);
        let candidates = candidate_steps(clef, ledger_lines, settings.only_ledger_lines);
        let step = candidates[rng.gen_range(0..candidates.len())];
        let note = Note::from_diatonic_step(step);
        debug!(%note, %clef, step, ledger_lines, "drew note");
        DrawnNote { note, clef }
    }
}

pub fn effective_ledger_lines(max_ledger_lines: u8, height_hint: Option<f32>) -> u8 {
    match height_hint {
        Some(height) if height <= CONSTRAINED_HEIGHT => {
            max_ledger_lines.min(CONSTRAINED_MAX_LEDGER_LINES)
        }
        _ => max_ledger_lines,
    }
}

pub fn sampling_range(clef: Clef, ledger_lines: u8) -> RangeInclusive<i32> {
    clef.extended_range(ledger_lines)
}

/// Steps eligible for a draw. Never empty: when the ledger-only filter
/// removes everything, the two range endpoints are used instead, which
/// weights the draw toward the extremes.
pub fn candidate_steps(clef: Clef, ledger_lines: u8, only_ledger_lines: bool) -> Vec<i32> {
    let range = sampling_range(clef, ledger_lines);
    let (min, max) = (*range.start(), *range.end());
    let steps: Vec<i32> = range
        .filter(|step| !only_ledger_lines || !clef.is_on_staff(*step))
        .collect();
    if steps.is_empty() {
        vec![min, max]
    } else {
        steps
    }
}
