// file: src/parser/frontmatter.rs
// description: YAML frontmatter extraction from markdown documents
// reference: https://docs.rs/yaml-rust

use crate::error::{RagError, Result};
use std::collections::HashMap;
use yaml_rust::{Yaml, YamlLoader};

pub struct FrontmatterParser;

#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    pub fields: HashMap<String, String>,
}

impl Frontmatter {
    pub fn title(&self) -> Option<String> {
        self.fields
            .get("title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl FrontmatterParser {
    pub fn new() -> Self {
        Self
    }

    /// Splits a leading `---` block from the body. Returns `None` when the
    /// content has no frontmatter.
    pub fn extract(&self, file: &str, content: &str) -> Result<Option<(Frontmatter, String)>> {
        let Some(rest) = content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))
        else {
            return Ok(None);
        };

        let Some(end) = find_closing_fence(rest) else {
            return Ok(None);
        };

        let yaml_content = &rest[..end.start];
        let remaining_content = rest[end.end..].trim_start_matches(['\r', '\n']);

        let docs = YamlLoader::load_from_str(yaml_content).map_err(|e| RagError::Parse {
            file: file.to_string(),
            message: format!("YAML frontmatter error: {}", e),
        })?;

        let mut fields = HashMap::new();

        if let Some(Yaml::Hash(hash)) = docs.first() {
            for (key, value) in hash {
                let Yaml::String(k) = key else { continue };
                let v = match value {
                    Yaml::String(s) => s.clone(),
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r.clone(),
                    Yaml::Boolean(b) => b.to_string(),
                    other => format!("{:?}", other),
                };
                fields.insert(k.clone(), v);
            }
        }

        Ok(Some((Frontmatter { fields }, remaining_content.to_string())))
    }
}

fn find_closing_fence(rest: &str) -> Option<std::ops::Range<usize>> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(offset..offset + line.len());
        }
        offset += line.len();
    }
    None
}

impl Default for FrontmatterParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_extraction() {
        let parser = FrontmatterParser::new();
        let content = "---\ntitle: What I Worked On\nyear: 2021\n---\n\n# Content";

        let (frontmatter, remaining) = parser.extract("essay.md", content).unwrap().unwrap();
        assert_eq!(frontmatter.title(), Some("What I Worked On".to_string()));
        assert_eq!(frontmatter.fields.get("year"), Some(&"2021".to_string()));
        assert_eq!(remaining, "# Content");
    }

    #[test]
    fn test_horizontal_rule_in_body_is_kept() {
        let parser = FrontmatterParser::new();
        let content = "---\ntitle: T\n---\nabove\n\n---\n\nbelow";

        let (_, remaining) = parser.extract("essay.md", content).unwrap().unwrap();
        assert!(remaining.contains("---"));
        assert!(remaining.contains("below"));
    }

    #[test]
    fn test_no_frontmatter() {
        let parser = FrontmatterParser::new();
        assert!(parser.extract("a.md", "# Just a heading").unwrap().is_none());
        assert!(parser.extract("a.md", "---\nunterminated").unwrap().is_none());
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let parser = FrontmatterParser::new();
        let err = parser.extract("bad.md", "---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, RagError::Parse { .. }));
    }
}
