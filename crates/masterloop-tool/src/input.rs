//! Input and output helpers.

use std::fs;
use std::path::Path;

use masterloop_core::DeviceTemplate;
use tracing::debug;

use crate::error::{ToolError, ToolResult};

/// Read a binary payload, or hex text when `hex` is set.
pub fn read_payload(path: &Path, hex: bool) -> ToolResult<Vec<u8>> {
    if hex {
        let text = fs::read_to_string(path).map_err(|e| ToolError::io(path, e))?;
        return parse_hex(&text);
    }
    fs::read(path).map_err(|e| ToolError::io(path, e))
}

/// Parse hex text, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> ToolResult<Vec<u8>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(digits)?)
}

/// Read a text file.
pub fn read_text(path: &Path) -> ToolResult<String> {
    fs::read_to_string(path).map_err(|e| ToolError::io(path, e))
}

/// Write a payload to `path`.
pub fn write_payload(path: &Path, data: &[u8]) -> ToolResult<()> {
    fs::write(path, data).map_err(|e| ToolError::io(path, e))?;
    debug!(path = %path.display(), bytes = data.len(), "wrote payload");
    Ok(())
}

/// Load a device template, choosing the parser by file extension.
pub fn load_template(path: &Path) -> ToolResult<DeviceTemplate> {
    let text = read_text(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_template(&text, &extension)
}

/// Parse a device template from YAML or JSON text.
pub fn parse_template(text: &str, extension: &str) -> ToolResult<DeviceTemplate> {
    let template: DeviceTemplate = match extension {
        "yaml" | "yml" => serde_yaml::from_str(text)?,
        "json" => serde_json::from_str(text)?,
        other => return Err(ToolError::UnsupportedTemplateFormat(other.to_string())),
    };
    debug!(
        template = %template.id,
        observations = template.observations.len(),
        "loaded device template"
    );
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use masterloop_core::DataType;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x01 02\n0a FF").unwrap(), vec![0x01, 0x02, 0x0A, 0xFF]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(parse_hex("0g"), Err(ToolError::Hex(_))));
    }

    #[test]
    fn test_parse_template_formats() {
        let yaml = "id: A\nobservations:\n  - id: 1\n    dataType: integer\n";
        let json = r#"{"id":"A","observations":[{"id":1,"dataType":"integer"}]}"#;
        let from_yaml = parse_template(yaml, "yml").unwrap();
        let from_json = parse_template(json, "json").unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.observation_type(1), Some(DataType::Integer));
    }

    #[test]
    fn test_parse_template_unknown_extension() {
        assert!(matches!(
            parse_template("", "toml"),
            Err(ToolError::UnsupportedTemplateFormat(ext)) if ext == "toml"
        ));
    }
}
