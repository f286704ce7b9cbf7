//! Prompt extraction from uploaded CSV files.

use csv::ReaderBuilder;

use crate::error::{MediaError, MediaResult};

/// Extract image prompts from CSV bytes.
///
/// The first column of every row is taken as a prompt. Fields are trimmed
/// and rows with an empty first field are skipped. Order follows the file.
///
/// # Errors
///
/// Returns `InvalidCsv` when the bytes are not readable CSV (including
/// invalid UTF-8) and `NoPrompts` when no row yields a usable prompt.
pub fn parse_prompts(data: &[u8]) -> MediaResult<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut prompts = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MediaError::InvalidCsv(e.to_string()))?;
        if let Some(first) = record.get(0) {
            if !first.is_empty() {
                prompts.push(first.to_string());
            }
        }
    }

    if prompts.is_empty() {
        return Err(MediaError::NoPrompts);
    }

    Ok(prompts)
}
