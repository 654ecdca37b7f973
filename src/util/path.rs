//! Output path parser - minimal subset
//!
//! Supports:
//! - a.b.c (dot notation)
//! - items[0].name (array index)
//! - items.0 (numeric segment as index)
//!
//! Does NOT support: filters, wildcards, slices, unions.

use serde_json::Value;

use crate::error::PlatyError;

/// A parsed output path segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object field access: .field
    Field(String),
    /// Array index access: [0]
    Index(usize),
}

/// Parse an output path into segments
///
/// Examples:
/// - "status.url" → [Field("status"), Field("url")]
/// - "ports[0].name" → [Field("ports"), Index(0), Field("name")]
pub fn parse(path: &str) -> Result<Vec<Segment>, PlatyError> {
    if path.is_empty() {
        return Ok(vec![]);
    }

    let mut segments = Vec::new();

    for part in path.split('.') {
        if part.is_empty() {
            return Err(PlatyError::PathUnsupported {
                path: path.to_string(),
            });
        }

        // Check for array index: field[0] or just [0]
        if let Some(bracket_pos) = part.find('[') {
            let field = &part[..bracket_pos];
            if !field.is_empty() {
                segments.push(Segment::Field(field.to_string()));
            }

            if !part.ends_with(']') {
                return Err(PlatyError::PathUnsupported {
                    path: path.to_string(),
                });
            }

            let index_str = &part[bracket_pos + 1..part.len() - 1];
            let index: usize = index_str.parse().map_err(|_| PlatyError::PathUnsupported {
                path: path.to_string(),
            })?;

            segments.push(Segment::Index(index));
        } else if let Ok(index) = part.parse::<usize>() {
            // Numeric segment treated as array index (e.g., "ports.0")
            segments.push(Segment::Index(index));
        } else {
            segments.push(Segment::Field(part.to_string()));
        }
    }

    Ok(segments)
}

/// Apply parsed segments to a JSON value
///
/// Uses references internally, only clones once at the end.
pub fn apply(value: &Value, segments: &[Segment]) -> Option<Value> {
    let mut current = value;

    for segment in segments {
        current = match segment {
            Segment::Field(name) => current.get(name)?,
            Segment::Index(idx) => current.get(*idx)?,
        };
    }

    Some(current.clone())
}

/// Parse and apply in one step
pub fn resolve(value: &Value, path: &str) -> Result<Option<Value>, PlatyError> {
    let segments = parse(path)?;
    Ok(apply(value, &segments))
}

/// Validate path syntax without resolving
pub fn validate(path: &str) -> Result<(), PlatyError> {
    parse(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_simple_path() {
        let segments = parse("status.url").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Field("status".to_string()),
                Segment::Field("url".to_string()),
            ]
        );
    }

    #[test]
    fn parse_with_array_index() {
        let segments = parse("ports[0].name").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Field("ports".to_string()),
                Segment::Index(0),
                Segment::Field("name".to_string()),
            ]
        );
    }

    #[test]
    fn parse_numeric_segment_as_index() {
        let segments = parse("ports.1").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Field("ports".to_string()), Segment::Index(1)]
        );
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_empty_segment() {
        assert!(parse("a..b").is_err());
    }

    #[test]
    fn parse_rejects_unclosed_bracket() {
        assert!(parse("a[0").is_err());
    }

    #[test]
    fn parse_rejects_wildcard() {
        assert!(parse("a[*]").is_err());
    }

    #[test]
    fn apply_simple() {
        let value = json!({"status": {"url": "http://web.local"}});
        let segments = parse("status.url").unwrap();
        assert_eq!(apply(&value, &segments), Some(json!("http://web.local")));
    }

    #[test]
    fn apply_array_index() {
        let value = json!({"ports": [80, 443]});
        let segments = parse("ports[1]").unwrap();
        assert_eq!(apply(&value, &segments), Some(json!(443)));
    }

    #[test]
    fn apply_missing_field_is_none() {
        let value = json!({"a": 1});
        let segments = parse("b").unwrap();
        assert_eq!(apply(&value, &segments), None);
    }

    #[test]
    fn resolve_root_returns_whole_value() {
        let value = json!({"a": 1});
        assert_eq!(resolve(&value, "").unwrap(), Some(value));
    }

    #[test]
    fn validate_accepts_permissive_field_names() {
        assert!(validate("some-field.sub_field").is_ok());
        assert!(validate("123abc").is_ok());
    }
}
