//! Text-quality confidence for engines that report none.
//!
//! ocrs returns recognized lines without scores, so each line is rated from
//! the shape of its text: letter vs. symbol mix, word lengths, whitespace
//! density and runs of repeated characters. Garbled recognition tends to
//! fail several of these at once.

/// Counts gathered in a single pass over a line.
#[derive(Debug, Default)]
struct TextStats {
    chars: usize,
    letters: usize,
    symbols: usize,
    whitespace: usize,
    longest_run: usize,
}

impl TextStats {
    fn collect(text: &str) -> Self {
        let mut stats = Self::default();
        let mut run = 0;
        let mut prev: Option<char> = None;

        for c in text.chars() {
            stats.chars += 1;
            if c.is_alphabetic() {
                stats.letters += 1;
            }
            if c.is_whitespace() {
                stats.whitespace += 1;
            } else if !c.is_alphanumeric() && !c.is_ascii_punctuation() {
                stats.symbols += 1;
            }

            run = if prev == Some(c) && !c.is_whitespace() {
                run + 1
            } else {
                1
            };
            stats.longest_run = stats.longest_run.max(run);
            prev = Some(c);
        }

        stats
    }
}

/// Confidence in [0, 1] for one recognized line.
pub fn line_confidence(text: &str) -> f32 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    // Too short to judge
    if text.chars().count() < 5 {
        return 0.5;
    }

    let stats = TextStats::collect(text);
    let score = 0.40 * character_score(&stats)
        + 0.30 * word_length_score(text)
        + 0.15 * whitespace_score(&stats)
        + 0.15 * repetition_score(&stats);

    score.clamp(0.0, 1.0)
}

/// Penalizes symbol-heavy or letter-poor text.
fn character_score(stats: &TextStats) -> f32 {
    if stats.chars == 0 {
        return 0.0;
    }
    let total = stats.chars as f32;
    let symbol_penalty = 1.0 - (stats.symbols as f32 / total * 10.0).min(1.0);
    let letter_score = (stats.letters as f32 / total * 1.5).min(1.0);
    symbol_penalty * 0.6 + letter_score * 0.4
}

/// Rewards 4-8 character average words, penalizes runs of 1-char "words".
fn word_length_score(text: &str) -> f32 {
    let lengths: Vec<usize> = text.split_whitespace().map(|w| w.chars().count()).collect();
    if lengths.is_empty() {
        return 0.5;
    }

    let average = lengths.iter().sum::<usize>() / lengths.len();
    let base = match average {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let singles = lengths.iter().filter(|l| **l == 1).count() as f32 / lengths.len() as f32;
    base * (1.0 - (singles * 1.5).min(0.5))
}

/// Normal prose is roughly 10-25% whitespace.
fn whitespace_score(stats: &TextStats) -> f32 {
    if stats.chars == 0 {
        return 0.0;
    }
    let percent = (stats.whitespace * 100) / stats.chars;
    match percent {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Long runs like "aaaa" or "####" usually mean the recognizer lost track.
fn repetition_score(stats: &TextStats) -> f32 {
    match stats.longest_run {
        0..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}
