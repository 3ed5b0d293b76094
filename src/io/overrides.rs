//! Read anchor override files.
//!
//! The file is a JSON array of records:
//! `{"series_name": ..., "anchor_date": "YYYY-MM-DD", "display_start_date"?: ..., "skip"?: bool}`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{AnchorOverride, OverrideSet};
use crate::error::AppError;

/// Read an override JSON file.
pub fn read_overrides_json(path: &Path) -> Result<OverrideSet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open overrides JSON '{}': {e}", path.display())))?;
    let set = parse_overrides(file)?;
    log::info!("loaded {} anchor overrides from '{}'", set.len(), path.display());
    Ok(set)
}

/// Parse override records from any reader.
pub fn parse_overrides<R: Read>(input: R) -> Result<OverrideSet, AppError> {
    let records: Vec<AnchorOverride> =
        serde_json::from_reader(input).map_err(|e| AppError::new(2, format!("Invalid overrides JSON: {e}")))?;
    Ok(OverrideSet::new(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_records_with_defaults() {
        let json = r#"[
            {"series_name": "TikTok", "anchor_date": "2023-01-01"},
            {"series_name": "Threads", "anchor_date": "2023-07-01", "skip": true}
        ]"#;
        let set = parse_overrides(json.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        let tiktok = set.get("TikTok").unwrap();
        assert_eq!(tiktok.anchor_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert!(!tiktok.skip);
        assert!(set.get("Threads").unwrap().skip);
    }

    #[test]
    fn malformed_json_is_input_error() {
        let err = parse_overrides("{not json".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn duplicate_series_is_input_error() {
        let json = r#"[
            {"series_name": "A", "anchor_date": "2023-01-01"},
            {"series_name": "A", "anchor_date": "2023-02-01"}
        ]"#;
        let err = parse_overrides(json.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
