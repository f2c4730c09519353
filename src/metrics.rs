//! Binary classification metrics over predicted and true label slices.

use crate::error::{ModelError, Result};

/// The positive class for tuning and scoring.
pub const POSITIVE_LABEL: f32 = 1.0;

pub fn precision_score(y_true: &[f32], y_pred: &[f32], pos_label: f32) -> Result<f64> {
    let counts = confusion_counts(y_true, y_pred, pos_label)?;
    Ok(ratio(
        counts.true_positives,
        counts.true_positives + counts.false_positives,
    ))
}

pub fn recall_score(y_true: &[f32], y_pred: &[f32], pos_label: f32) -> Result<f64> {
    let counts = confusion_counts(y_true, y_pred, pos_label)?;
    Ok(ratio(
        counts.true_positives,
        counts.true_positives + counts.false_negatives,
    ))
}

/// Harmonic mean of precision and recall. Returns 0.0 when both are zero,
/// mirroring the usual zero-division convention.
pub fn f1_score(y_true: &[f32], y_pred: &[f32], pos_label: f32) -> Result<f64> {
    let counts = confusion_counts(y_true, y_pred, pos_label)?;
    let precision = ratio(
        counts.true_positives,
        counts.true_positives + counts.false_positives,
    );
    let recall = ratio(
        counts.true_positives,
        counts.true_positives + counts.false_negatives,
    );
    if precision + recall == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * precision * recall / (precision + recall))
}

struct ConfusionCounts {
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
}

fn confusion_counts(y_true: &[f32], y_pred: &[f32], pos_label: f32) -> Result<ConfusionCounts> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::ShapeMismatch {
            rows: y_pred.len(),
            labels: y_true.len(),
        });
    }
    let mut counts = ConfusionCounts {
        true_positives: 0,
        false_positives: 0,
        false_negatives: 0,
    };
    for (&truth, &predicted) in y_true.iter().zip(y_pred) {
        match (truth == pos_label, predicted == pos_label) {
            (true, true) => counts.true_positives += 1,
            (false, true) => counts.false_positives += 1,
            (true, false) => counts.false_negatives += 1,
            (false, false) => {}
        }
    }
    Ok(counts)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_one() {
        let labels = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(f1_score(&labels, &labels, POSITIVE_LABEL).unwrap(), 1.0);
    }

    #[test]
    fn mixed_predictions_match_hand_computation() {
        // tp = 1, fp = 1, fn = 1 -> precision = recall = f1 = 0.5
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_pred = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(precision_score(&y_true, &y_pred, POSITIVE_LABEL).unwrap(), 0.5);
        assert_eq!(recall_score(&y_true, &y_pred, POSITIVE_LABEL).unwrap(), 0.5);
        assert_eq!(f1_score(&y_true, &y_pred, POSITIVE_LABEL).unwrap(), 0.5);
    }

    #[test]
    fn no_positive_predictions_yield_zero() {
        let y_true = [1.0, 1.0, 0.0];
        let y_pred = [0.0, 0.0, 0.0];
        assert_eq!(f1_score(&y_true, &y_pred, POSITIVE_LABEL).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(f1_score(&[1.0, 0.0], &[1.0], POSITIVE_LABEL).is_err());
    }
}
