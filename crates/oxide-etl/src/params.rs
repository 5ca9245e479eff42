//! Conversion settings read from a JSON file.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use oxide_etl_core::ConversionParams;

/// Reads [`ConversionParams`] from `path`. Missing keys take their defaults.
pub fn load(path: &Path) -> anyhow::Result<ConversionParams> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read params file {}", path.display()))?;
    let params: ConversionParams = serde_json::from_str(&content)
        .with_context(|| format!("invalid params file {}", path.display()))?;
    debug!(?params, "conversion params loaded");
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"date_format": "%d.%m.%Y", "trim": true}}"#).unwrap();
        let params = load(file.path()).unwrap();
        assert_eq!(params.date_format(), "%d.%m.%Y");
        assert!(params.trim);
        assert_eq!(params.quote, None);
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid params file"));

        let err = load(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read params file"));
    }
}
