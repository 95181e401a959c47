// file: src/parser/markdown.rs
// description: heading extraction with pulldown-cmark
// reference: https://docs.rs/pulldown-cmark

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

pub struct MarkdownParser;

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u32,
    pub text: String,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn headings(&self, content: &str) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut current: Option<(u32, String)> = None;

        for event in Parser::new(content) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some((level as u32, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = current.take() {
                        headings.push(Heading {
                            level,
                            text: text.trim().to_string(),
                        });
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, ref mut heading_text)) = current {
                        heading_text.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        headings
    }

    /// First top-level heading, used as the document title when the
    /// frontmatter has none.
    pub fn title(&self, content: &str) -> Option<String> {
        self.headings(content)
            .into_iter()
            .find(|h| h.level == 1 && !h.text.is_empty())
            .map(|h| h.text)
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings() {
        let parser = MarkdownParser::new();
        let headings = parser.headings("# Title\n\nSome text.\n\n## Early `years`\n");

        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].text, "Early years");
    }

    #[test]
    fn test_title_skips_lower_levels() {
        let parser = MarkdownParser::new();
        assert_eq!(
            parser.title("## Intro\n\n# What I Worked On\n"),
            Some("What I Worked On".to_string())
        );
        assert_eq!(parser.title("plain text only"), None);
    }
}
