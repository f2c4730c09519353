//! Conversions between the tabular Polars surface and the row-major
//! `DataVec` representation the booster consumes.

use gbdt::decision_tree::{Data, DataVec};
use polars::prelude::*;

use crate::error::{ModelError, Result};

/// Flattens a feature frame into row-major `f32` vectors. All columns are
/// cast to `Float32` first; nulls become 0.0.
pub fn feature_rows(features: &DataFrame) -> Result<Vec<Vec<f32>>> {
    let df = features
        .clone()
        .lazy()
        .select([col("*").cast(DataType::Float32)])
        .collect()?;

    let columns = df
        .iter()
        .map(|series| {
            let values = series.f32()?;
            Ok::<Vec<f32>, ModelError>(
                values.into_iter().map(|value| value.unwrap_or(0.0)).collect(),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    // Transpose to the row-major layout the booster expects.
    let n_rows = df.height();
    let n_cols = columns.len();
    let mut rows = Vec::with_capacity(n_rows);
    for row_idx in 0..n_rows {
        let row: Vec<f32> = (0..n_cols).map(|col_idx| columns[col_idx][row_idx]).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Extracts the label vector as `f32`, casting from whatever numeric dtype
/// the caller supplied.
pub fn label_values(labels: &Series) -> Result<Vec<f32>> {
    let cast = labels.cast(&DataType::Float32)?;
    Ok(cast
        .f32()?
        .into_iter()
        .map(|value| value.unwrap_or(0.0))
        .collect())
}

/// Pairs feature rows with labels for fitting. The row counts must agree;
/// this is the only shape check performed on the wrapper's side.
///
/// Class 1 stays 1.0 and class 0 becomes -1.0, the signed-label
/// convention the booster's `LogLikelyhood` loss trains on.
pub fn training_data(rows: &[Vec<f32>], labels: &[f32]) -> Result<DataVec> {
    if rows.len() != labels.len() {
        return Err(ModelError::ShapeMismatch {
            rows: rows.len(),
            labels: labels.len(),
        });
    }
    let mut data = DataVec::with_capacity(rows.len());
    for (row, &label) in rows.iter().zip(labels) {
        let signed = if label == 1.0 { 1.0 } else { -1.0 };
        data.push(Data::new_training_data(row.clone(), 1.0, signed, None));
    }
    Ok(data)
}

pub fn test_data(rows: &[Vec<f32>]) -> DataVec {
    rows.iter()
        .map(|row| Data::new_test_data(row.clone(), None))
        .collect()
}
