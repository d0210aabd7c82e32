use std::io::{self, Write};
use std::ops::RangeInclusive;

use ledger_domain::{Clef, Note, Score, StemDirection};
use ledger_trainer::{GameView, Phase};

const WIDTH: usize = 24;
const NOTE_COL: usize = 12;
const STEM_ROWS: i32 = 3;

/// Text rows of a five-line staff, top row first, with ledger lines and a
/// stemmed note head.
pub fn staff_rows(note: &Note, clef: Clef) -> Vec<String> {
    let staff = clef.staff_range();
    let step = note.diatonic_step();
    let stem = clef.stem_direction(note);
    let (stem_top, stem_bottom) = match stem {
        StemDirection::Up => (step + STEM_ROWS, step),
        StemDirection::Down => (step, step - STEM_ROWS),
    };
    let top = (*staff.end()).max(stem_top) + 1;
    let bottom = (*staff.start()).min(stem_bottom) - 1;

    (bottom..=top)
        .rev()
        .map(|row| {
            let on_line = (row - staff.start()).rem_euclid(2) == 0;
            let in_staff = staff.contains(&row);
            let fill = if on_line && in_staff { '-' } else { ' ' };
            let mut cells = vec![fill; WIDTH];
            if on_line && !in_staff && needs_ledger(row, step, &staff) {
                for cell in &mut cells[NOTE_COL - 2..=NOTE_COL + 2] {
                    *cell = '-';
                }
            }
            match stem {
                StemDirection::Up if row > step && row <= stem_top => cells[NOTE_COL + 1] = '|',
                StemDirection::Down if row < step && row >= stem_bottom => {
                    cells[NOTE_COL - 1] = '|'
                }
                _ => {}
            }
            if row == step {
                cells[NOTE_COL] = 'o';
            }
            cells.into_iter().collect::<String>().trim_end().to_string()
        })
        .collect()
}

fn needs_ledger(row: i32, step: i32, staff: &RangeInclusive<i32>) -> bool {
    (row > *staff.end() && row <= step) || (row < *staff.start() && row >= step)
}

pub fn progress_bar(progress: f32, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

pub fn score_line(score: &Score) -> String {
    match score.accuracy() {
        Some(accuracy) => format!(
            "Score {}/{} ({:.0}%)",
            score.correct,
            score.total,
            accuracy * 100.0
        ),
        None => format!("Score {}/{}", score.correct, score.total),
    }
}

pub fn draw<W: Write>(out: &mut W, view: &GameView) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}   practice: {}m this week, {}m total",
        score_line(&view.score),
        view.practice_week_seconds / 60,
        view.practice_total_seconds / 60
    )?;
    match view.phase {
        Phase::SettingsOpen => {
            writeln!(out, "Settings open. Press Enter (or type `start`) to play.")?;
            return out.flush();
        }
        Phase::Paused => {
            writeln!(
                out,
                "Previous session restored. Press Enter (or type `resume`) to continue."
            )?;
        }
        _ => {}
    }

    let title = match view.clef {
        Clef::Treble => "Treble clef",
        Clef::Bass => "Bass clef",
    };
    writeln!(out, "{title}")?;
    for row in staff_rows(&view.note, view.clef) {
        writeln!(out, "  {row}")?;
    }

    if view.timer_enabled {
        writeln!(
            out,
            "{} {:.1}s",
            progress_bar(view.timer_progress, 20),
            view.time_left.as_secs_f32()
        )?;
    }
    if view.is_review_mode {
        writeln!(out, "Review: {} card(s) left (`skip`, `stop`)", view.review_queue_len)?;
    } else if view.is_review_finished {
        writeln!(out, "Review complete.")?;
    } else if view.can_review {
        writeln!(out, "Missed notes waiting: type `review` to drill them.")?;
    }

    match view.phase {
        Phase::Playing => writeln!(out, "Name the note, then press Enter to reveal.")?,
        Phase::AnswerRevealed => writeln!(
            out,
            "Answer: {}   d = got it, a = missed it",
            view.note
        )?,
        Phase::TimedOut => writeln!(
            out,
            "Time's up! It was {}. Press Enter to continue.",
            view.note
        )?,
        Phase::SettingsOpen | Phase::Paused => {}
    }
    out.flush()
}
