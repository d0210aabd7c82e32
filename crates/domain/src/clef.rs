use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::note::Note;

/// A renderable clef. Review entries and drawn notes always carry one of these.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

/// Clef choice as configured by the player. `Both` is resolved per draw.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClefSetting {
    #[default]
    Treble,
    Bass,
    Both,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StemDirection {
    Up,
    Down,
}

impl Clef {
    /// Diatonic steps of the bottom and top staff lines.
    /// Treble: E4..=F5, bass: G2..=A3.
    pub fn staff_range(self) -> RangeInclusive<i32> {
        match self {
            Clef::Treble => 2..=10,
            Clef::Bass => -10..=-2,
        }
    }

    /// Step of the middle staff line (B4 for treble, D3 for bass).
    pub fn middle_line_step(self) -> i32 {
        match self {
            Clef::Treble => 6,
            Clef::Bass => -6,
        }
    }

    /// Staff range widened by two steps per ledger line on each side.
    pub fn extended_range(self, ledger_lines: u8) -> RangeInclusive<i32> {
        let staff = self.staff_range();
        let extra = 2 * i32::from(ledger_lines);
        (staff.start() - extra)..=(staff.end() + extra)
    }

    pub fn is_on_staff(self, step: i32) -> bool {
        self.staff_range().contains(&step)
    }

    pub fn stem_direction(self, note: &Note) -> StemDirection {
        if note.diatonic_step() < self.middle_line_step() {
            StemDirection::Up
        } else {
            StemDirection::Down
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClefSetting {
    /// The fixed clef, or `None` when a coin flip is needed.
    pub fn fixed(self) -> Option<Clef> {
        match self {
            ClefSetting::Treble => Some(Clef::Treble),
            ClefSetting::Bass => Some(Clef::Bass),
            ClefSetting::Both => None,
        }
    }
}

impl From<Clef> for ClefSetting {
    fn from(clef: Clef) -> Self {
        match clef {
            Clef::Treble => ClefSetting::Treble,
            Clef::Bass => ClefSetting::Bass,
        }
    }
}
