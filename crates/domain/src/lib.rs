pub mod clef;
pub mod error;
pub mod note;
pub mod practice;
pub mod score;
pub mod settings;
pub mod snapshot;

pub use crate::clef::{Clef, ClefSetting, StemDirection};
pub use crate::error::DomainError;
pub use crate::note::{Accidental, Note, NoteName};
pub use crate::practice::PracticeLog;
pub use crate::score::Score;
pub use crate::settings::GameSettings;
pub use crate::snapshot::{NoteSelection, ReviewEntry, ReviewSnapshot, SessionSnapshot};
