pub mod clock;
pub mod controller;
pub mod input;
pub mod persistence;
pub mod practice;
pub mod review;
pub mod scoring;
pub mod selector;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Action, GameController, GameEvent, GameView, Phase};
pub use input::{InputBindings, Key};
pub use persistence::{DebounceConfig, PersistenceStore, GAME_STATE_KEY, PRACTICE_KEY};
pub use practice::PracticeTracker;
pub use review::ReviewQueue;
pub use scoring::ScoreTracker;
pub use selector::{DrawnNote, NoteSelector};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use timer::{CountdownTimer, TimerState};
