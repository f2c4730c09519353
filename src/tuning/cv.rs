use std::collections::BTreeMap;

use crate::error::{ModelError, Result};

/// Splits sample indices into `n_splits` folds while preserving class
/// proportions. Returns `(train, test)` index pairs, one per fold.
///
/// Fails when any class has fewer members than `n_splits`, since that
/// class could not appear in every test fold.
pub fn stratified_kfold(labels: &[f32], n_splits: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if n_splits < 2 {
        return Err(ModelError::CrossValidation(format!(
            "n_splits must be at least 2, got {n_splits}"
        )));
    }
    if labels.is_empty() {
        return Err(ModelError::CrossValidation(
            "cannot split an empty label vector".into(),
        ));
    }

    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(label.to_bits()).or_default().push(index);
    }
    for (bits, members) in &by_class {
        if members.len() < n_splits {
            return Err(ModelError::CrossValidation(format!(
                "class {} has {} samples, fewer than {} folds",
                f32::from_bits(*bits),
                members.len(),
                n_splits
            )));
        }
    }

    // Round-robin within each class keeps every fold's class mix close to
    // the overall proportions.
    let mut assignments = vec![0usize; labels.len()];
    for members in by_class.values() {
        for (position, &index) in members.iter().enumerate() {
            assignments[index] = position % n_splits;
        }
    }

    let mut folds = Vec::with_capacity(n_splits);
    for fold in 0..n_splits {
        let mut train = Vec::new();
        let mut test = Vec::new();
        for (index, &assigned) in assignments.iter().enumerate() {
            if assigned == fold {
                test.push(index);
            } else {
                train.push(index);
            }
        }
        folds.push((train, test));
    }
    Ok(folds)
}
