use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Request headers loaded from disk.
///
/// Stored as a flat JSON object, applied in file order:
/// ```json
/// {
///   "Accept": "application/json",
///   "Authorization": "Bearer abc123"
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct HeaderConfig {
    entries: Vec<(String, String)>,
}

impl HeaderConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read header file '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid header file '{path}'"))
    }

    /// Parses a JSON object whose values are all strings.
    pub fn from_json(content: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(content)?;
        let entries = object
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(v) => Ok((name, v)),
                other => Err(anyhow::anyhow!(
                    "header '{name}' must be a string, got {other}"
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Appends a header. Later entries win over earlier ones with the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses a `Name: Value` header argument as given on the command line.
pub fn parse_header_arg(arg: &str) -> Result<(String, String)> {
    let (name, value) = arg
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("header '{arg}' is not in 'Name: Value' form"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("header '{arg}' has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_from_json_keeps_file_order() {
        let config = HeaderConfig::from_json(r#"{"X-B": "2", "X-A": "1"}"#).unwrap();
        let pairs: Vec<_> = config.iter().collect();
        assert_eq!(pairs, vec![("X-B", "2"), ("X-A", "1")]);
    }

    #[test]
    fn test_from_json_rejects_non_string_values() {
        assert!(HeaderConfig::from_json(r#"{"X-Retries": 3}"#).is_err());
        assert!(HeaderConfig::from_json(r#"["X-A"]"#).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let path = temp_path("http_utility_test_headers.json");
        fs::write(&path, r#"{"Accept": "application/json"}"#).unwrap();

        let config = HeaderConfig::load(&path).unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.iter().next(), Some(("Accept", "application/json")));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let path = temp_path("http_utility_test_missing_headers.json");
        let _ = fs::remove_file(&path);
        assert!(HeaderConfig::load(&path).is_err());
    }

    #[test]
    fn test_push_appends_after_file_entries() {
        let mut config = HeaderConfig::from_json(r#"{"X-Test": "file"}"#).unwrap();
        config.push("X-Test", "cli");
        let pairs: Vec<_> = config.iter().collect();
        assert_eq!(pairs, vec![("X-Test", "file"), ("X-Test", "cli")]);
    }

    #[test]
    fn test_parse_header_arg() {
        assert_eq!(
            parse_header_arg("X-Test: abc").unwrap(),
            ("X-Test".to_string(), "abc".to_string())
        );
        assert_eq!(
            parse_header_arg("Authorization:Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header_arg("no-colon").is_err());
        assert!(parse_header_arg(": value").is_err());
    }
}
