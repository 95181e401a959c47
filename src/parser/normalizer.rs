// file: src/parser/normalizer.rs
// description: Markdown normalization before chunking
// reference: Markdown specification

pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Canonical heading and list markers, trailing whitespace removed, runs
    /// of blank lines collapsed to one. Fenced code is left untouched.
    pub fn normalize(&self, content: &str) -> String {
        let mut result: Vec<String> = Vec::new();
        let mut in_code_block = false;
        let mut blank_run = 0;

        for line in content.lines() {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                blank_run = 0;
                result.push(line.trim_end().to_string());
                continue;
            }

            if in_code_block {
                result.push(line.to_string());
                continue;
            }

            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
                result.push(String::new());
                continue;
            }
            blank_run = 0;

            result.push(self.normalize_line(line));
        }

        result.join("\n")
    }

    fn normalize_line(&self, line: &str) -> String {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|&c| c == '#').count();
            let text = trimmed.trim_start_matches('#').trim();

            if !text.is_empty() && level <= 6 {
                return format!("{} {}", "#".repeat(level), text);
            }
            return line.to_string();
        }

        if let Some(stripped) = trimmed
            .strip_prefix("* ")
            .or_else(|| trimmed.strip_prefix("- "))
            .or_else(|| trimmed.strip_prefix("+ "))
        {
            let indent = line.len() - trimmed.len();
            return format!("{}- {}", " ".repeat(indent), stripped.trim());
        }

        line.to_string()
    }
}

impl Default for MarkdownNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_normalization() {
        let normalizer = MarkdownNormalizer::new();
        let normalized = normalizer.normalize("#Title\n##  Subtitle  ");

        assert_eq!(normalized, "# Title\n## Subtitle");
    }

    #[test]
    fn test_list_normalization() {
        let normalizer = MarkdownNormalizer::new();
        let normalized = normalizer.normalize("* Item 1\n+ Item 2\n  - Item 3");

        assert_eq!(normalized, "- Item 1\n- Item 2\n  - Item 3");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let normalizer = MarkdownNormalizer::new();
        let normalized = normalizer.normalize("Line 1\n\n\n\n\nLine 2");

        assert_eq!(normalized, "Line 1\n\nLine 2");
    }

    #[test]
    fn test_code_blocks_untouched() {
        let normalizer = MarkdownNormalizer::new();
        let content = "```sh\n#comment\n* not a list\n```";

        assert_eq!(normalizer.normalize(content), content);
    }
}
