use super::constants::{RAYLEIGH_FILTER_NAMES, RAYLEIGH_LABEL};
use super::error::ComparisonError;
use super::system::SystemTransmission;

/// Multiply the `sys` series of the named tables into one derived table labelled `label`.
pub fn product_of(
    tables: &[SystemTransmission],
    names: &[&str],
    label: &str,
) -> Result<SystemTransmission, ComparisonError> {
    let mut selected: Vec<&SystemTransmission> = Vec::with_capacity(names.len());
    for name in names {
        match tables.iter().find(|t| t.filename == *name) {
            Some(table) => selected.push(table),
            None => return Err(ComparisonError::MissingComparisonInput(name.to_string())),
        }
    }
    let first = match selected.first() {
        Some(t) => *t,
        None => return Err(ComparisonError::MissingComparisonInput(label.to_string())),
    };
    let mut product = first.sys().to_owned();
    for table in selected.iter().skip(1) {
        if table.grid() != first.grid() {
            return Err(ComparisonError::GridMismatch(
                table.filename.clone(),
                first.filename.clone(),
            ));
        }
        product *= &table.sys();
    }
    Ok(SystemTransmission::from_product(
        first.grid(),
        label,
        product,
    ))
}

/// Build the filter comparison: every table in its given order, followed by the historical
/// Rayleigh (1924) combination of the Hoya V-10 and Wratten 21 filters.
pub fn compare_filters(
    tables: Vec<SystemTransmission>,
) -> Result<Vec<(String, SystemTransmission)>, ComparisonError> {
    let rayleigh = product_of(&tables, &RAYLEIGH_FILTER_NAMES, RAYLEIGH_LABEL)?;
    log::info!(
        "Formed {} from {}",
        RAYLEIGH_LABEL,
        RAYLEIGH_FILTER_NAMES.join(" x ")
    );
    let mut entries: Vec<(String, SystemTransmission)> = tables
        .into_iter()
        .map(|t| (t.filename.clone(), t))
        .collect();
    entries.push((RAYLEIGH_LABEL.to_string(), rayleigh));
    Ok(entries)
}
