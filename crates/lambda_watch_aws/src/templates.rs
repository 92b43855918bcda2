//! Event templates: JSON files with `{{ name }}` placeholders.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read event template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },
    #[error("rendered event is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Replaces every placeholder with its variable. Strings are inserted raw,
/// other values as their JSON text, and unknown names render as nothing.
pub fn render_template(template: &str, variables: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0usize;

    while let Some(open) = rest.find(OPEN) {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + OPEN.len()..];
        let close = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unterminated {
                offset: consumed + open,
            })?;

        let name = after_open[..close].trim();
        match variables.get(name) {
            Some(Value::String(text)) => rendered.push_str(text),
            Some(value) => rendered.push_str(&value.to_string()),
            None => {}
        }

        let advance = open + OPEN.len() + close + CLOSE.len();
        consumed += advance;
        rest = &rest[advance..];
    }

    rendered.push_str(rest);
    Ok(rendered)
}

pub fn load_event_template(path: &Path, variables: &Map<String, Value>) -> Result<Value, TemplateError> {
    let template = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rendered = render_template(&template, variables)?;
    serde_json::from_str(&rendered).map_err(|source| TemplateError::InvalidJson { source })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn variables() -> Map<String, Value> {
        let Value::Object(map) = json!({"bucket": "uploads-dev", "retries": 3}) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn substitutes_strings_and_numbers() {
        let rendered = render_template(
            r#"{"bucket": "{{bucket}}", "retries": {{ retries }}}"#,
            &variables(),
        )
        .expect("template should render");

        assert_eq!(rendered, r#"{"bucket": "uploads-dev", "retries": 3}"#);
    }

    #[test]
    fn unknown_variables_render_empty() {
        let rendered =
            render_template(r#"{"key": "{{missing}}"}"#, &variables()).expect("template should render");

        assert_eq!(rendered, r#"{"key": ""}"#);
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let error = render_template(r#"{"key": "{{bucket"}"#, &variables())
            .expect_err("template should fail");

        assert!(matches!(error, TemplateError::Unterminated { offset: 9 }));
    }

    #[test]
    fn loads_and_parses_template_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s3-put.json");
        fs::write(
            &path,
            r#"{"Records": [{"s3": {"bucket": {"name": "{{bucket}}"}}}]}"#,
        )
        .expect("write template");

        let event = load_event_template(&path, &variables()).expect("template should load");

        assert_eq!(event["Records"][0]["s3"]["bucket"]["name"], json!("uploads-dev"));
    }

    #[test]
    fn invalid_rendered_json_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"retries": {{missing}}}"#).expect("write template");

        let error = load_event_template(&path, &variables()).expect_err("template should fail");

        assert!(matches!(error, TemplateError::InvalidJson { .. }));
    }
}
