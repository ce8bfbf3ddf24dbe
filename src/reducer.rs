//! Reduce engine observations to a single ranked result.

use crate::engine::TextObservation;
use serde::Serialize;

/// Final text and score for one recognition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecognitionResult {
    /// Observation texts, most confident first, joined by `\n`
    pub combined_text: String,
    /// Mean observation confidence; 0 when there were none
    pub average_confidence: f32,
}

/// Rank observations by confidence and combine them.
///
/// The sort is stable, so equally confident lines keep the engine's order.
pub fn reduce(mut observations: Vec<TextObservation>) -> RecognitionResult {
    observations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let average_confidence = average_confidence(&observations);
    let combined_text = observations
        .into_iter()
        .map(|o| o.text)
        .collect::<Vec<_>>()
        .join("\n");

    RecognitionResult {
        combined_text,
        average_confidence,
    }
}

/// Arithmetic mean of the confidences, 0.0 for an empty slice.
pub fn average_confidence(observations: &[TextObservation]) -> f32 {
    if observations.is_empty() {
        return 0.0;
    }
    observations.iter().map(|o| o.confidence).sum::<f32>() / observations.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(text: &str, confidence: f32) -> TextObservation {
        TextObservation::new(text, confidence)
    }

    #[test]
    fn test_empty_input() {
        let result = reduce(Vec::new());
        assert_eq!(result.combined_text, "");
        assert_eq!(result.average_confidence, 0.0);
    }

    #[test]
    fn test_single_observation_has_no_separator() {
        let result = reduce(vec![obs("only line", 0.8)]);
        assert_eq!(result.combined_text, "only line");
        assert!((result.average_confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_sorted_by_descending_confidence() {
        let result = reduce(vec![obs("low", 0.2), obs("high", 0.9), obs("mid", 0.5)]);
        assert_eq!(result.combined_text, "high\nmid\nlow");
    }

    #[test]
    fn test_ties_keep_original_order() {
        let result = reduce(vec![
            obs("first", 0.5),
            obs("top", 0.7),
            obs("second", 0.5),
            obs("third", 0.5),
        ]);
        assert_eq!(result.combined_text, "top\nfirst\nsecond\nthird");
    }

    #[test]
    fn test_average_confidence() {
        let average = average_confidence(&[obs("a", 0.9), obs("b", 0.3)]);
        assert!((average - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_separator_count_is_n_minus_one() {
        for n in 0usize..6 {
            let observations: Vec<_> = (0..n)
                .map(|i| obs(&format!("line {}", i), i as f32 / 10.0))
                .collect();
            let result = reduce(observations);
            let newlines = result.combined_text.matches('\n').count();
            assert_eq!(newlines, n.saturating_sub(1), "n = {}", n);
        }
    }

    #[test]
    fn test_two_lines_scenario() {
        let result = reduce(vec![obs("Total: 42.00", 0.4), obs("RECEIPT", 0.95)]);
        assert_eq!(result.combined_text, "RECEIPT\nTotal: 42.00");
        assert!((result.average_confidence - 0.675).abs() < 1e-6);
    }
}
