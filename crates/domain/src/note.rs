use std::fmt;

use serde::{Deserialize, Serialize};

/// Natural note names in diatonic order starting from C.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Accidental {
    #[serde(rename = "#")]
    Sharp,
    #[serde(rename = "b")]
    Flat,
}

impl Accidental {
    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }
}

/// Stored documents carry the derived `diatonicStep` next to each note. It
/// is written for readers of the stored format and recomputed on load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "StoredNote", into = "StoredNote")]
pub struct Note {
    pub name: NoteName,
    pub octave: i32,
    pub accidental: Option<Accidental>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNote {
    name: NoteName,
    octave: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accidental: Option<Accidental>,
    #[serde(default, skip_deserializing)]
    diatonic_step: i32,
}

impl From<StoredNote> for Note {
    fn from(stored: StoredNote) -> Self {
        Self {
            name: stored.name,
            octave: stored.octave,
            accidental: stored.accidental,
        }
    }
}

impl From<Note> for StoredNote {
    fn from(note: Note) -> Self {
        Self {
            name: note.name,
            octave: note.octave,
            accidental: note.accidental,
            diatonic_step: note.diatonic_step(),
        }
    }
}

impl Note {
    pub fn new(name: NoteName, octave: i32) -> Self {
        Self {
            name,
            octave,
            accidental: None,
        }
    }

    pub fn with_accidental(mut self, accidental: Accidental) -> Self {
        self.accidental = Some(accidental);
        self
    }

    /// Staff position relative to middle C (C4 = 0), one unit per natural
    /// scale degree. The accidental does not move the position.
    pub fn diatonic_step(&self) -> i32 {
        (self.octave - 4) * 7 + self.name.index()
    }

    pub fn from_diatonic_step(step: i32) -> Self {
        Self::new(NoteName::from_index(step), step.div_euclid(7) + 4)
    }

    /// Identity used when deduplicating missed notes.
    pub fn same_pitch_class_and_octave(&self, other: &Note) -> bool {
        self.name == other.name && self.octave == other.octave
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(accidental) = self.accidental {
            f.write_str(accidental.symbol())?;
        }
        write!(f, "{}", self.octave)
    }
}
