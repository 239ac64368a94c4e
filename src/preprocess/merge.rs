use crate::preprocess::error::PreprocessError;
use crate::types::field::GriddedField;
use log::debug;

/// Combines the variables of two fields on the same grid.
///
/// Both fields must have identical axis lengths. Axes come from `first`, and
/// where both fields define a variable the one from `first` is kept.
pub fn merge(first: GriddedField, second: &GriddedField) -> Result<GriddedField, PreprocessError> {
    if first.shape() != second.shape() {
        return Err(PreprocessError::ShapeMismatch {
            left: first.shape(),
            right: second.shape(),
        });
    }
    let mut merged = first;
    for (name, data) in second.variables() {
        if merged.variable(name).is_some() {
            debug!("Keeping first copy of '{}' while merging", name);
            continue;
        }
        merged.insert_variable(name.clone(), data.clone())?;
    }
    Ok(merged)
}
