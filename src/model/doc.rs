//! Documentation comment blocks.
//!
//! Doc comments (`/** ... */`, `/*! ... */`, `///`, `//!`) are kept verbatim
//! and scanned for tag lines (`@brief`, `@param`, `@return`, ...). Anything
//! else inside the block is treated as free text.

use serde::{Deserialize, Serialize};

/// A documentation block attached to the declaration that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocComment {
    /// The comment text with every line trimmed, `None` when the block was
    /// not written in the source (IR authored by other tools).
    pub verbatim: Option<String>,
    /// Structured view of the tag lines.
    pub annotations: DocAnnotations,
}

/// Tag lines extracted from a doc block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocAnnotations {
    pub brief: Option<String>,
    pub details: Option<String>,
    pub params: Vec<ParamDoc>,
    pub returns: Option<String>,
    /// Every other tag (`@aggregation`, `@interface`, `@author`, ...).
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDoc {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocTag {
    pub name: String,
    pub text: String,
}

/// Tag marking a member or type as an aggregation part.
pub const AGGREGATION_TAG: &str = "aggregation";
/// Tag marking a class as an interface.
pub const INTERFACE_TAG: &str = "interface";
/// Tag marking the file-level documentation block.
pub const FILE_TAG: &str = "file";

impl DocComment {
    /// Parse a raw comment as it appears in the source.
    pub fn parse(raw: &str) -> Self {
        let verbatim = normalize_lines(raw);
        let annotations = DocAnnotations::parse(&verbatim);
        Self {
            verbatim: Some(verbatim),
            annotations,
        }
    }

    /// A doc block known only through its annotations.
    pub fn from_annotations(annotations: DocAnnotations) -> Self {
        Self {
            verbatim: None,
            annotations,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.annotations.has_tag(name)
    }
}

impl DocAnnotations {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Scan normalized comment lines for tags.
    fn parse(normalized: &str) -> Self {
        let mut out = DocAnnotations::default();
        let mut current = Target::None;

        for line in normalized.lines().map(strip_markers) {
            if line.is_empty() {
                current = Target::None;
                continue;
            }
            match split_tag(line) {
                Some((tag, rest)) => current = out.start_tag(tag, rest),
                None => {
                    if matches!(current, Target::None) {
                        current = if out.brief.is_none() {
                            Target::Brief
                        } else {
                            Target::Details
                        };
                    }
                    out.append(&current, line);
                }
            }
        }
        out
    }

    fn start_tag(&mut self, tag: &str, rest: &str) -> Target {
        match tag {
            "brief" | "short" => {
                self.brief = non_empty(rest);
                Target::Brief
            }
            "details" => {
                self.details = non_empty(rest);
                Target::Details
            }
            "param" => {
                let rest = rest
                    .strip_prefix("[in]")
                    .or_else(|| rest.strip_prefix("[out]"))
                    .or_else(|| rest.strip_prefix("[in,out]"))
                    .unwrap_or(rest)
                    .trim_start();
                let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                self.params.push(ParamDoc {
                    name: name.to_string(),
                    text: text.trim().to_string(),
                });
                Target::Param
            }
            "return" | "returns" | "retval" => {
                self.returns = non_empty(rest);
                Target::Returns
            }
            _ => {
                self.tags.push(DocTag {
                    name: tag.to_string(),
                    text: rest.to_string(),
                });
                Target::Tag
            }
        }
    }

    fn append(&mut self, target: &Target, line: &str) {
        let slot = match target {
            Target::Brief => &mut self.brief,
            Target::Details => &mut self.details,
            Target::Returns => &mut self.returns,
            Target::Param => {
                if let Some(param) = self.params.last_mut() {
                    push_text(&mut param.text, line);
                }
                return;
            }
            Target::Tag => {
                if let Some(tag) = self.tags.last_mut() {
                    push_text(&mut tag.text, line);
                }
                return;
            }
            Target::None => return,
        };
        match slot {
            Some(text) => push_text(text, line),
            None => *slot = Some(line.to_string()),
        }
    }
}

enum Target {
    None,
    Brief,
    Details,
    Param,
    Returns,
    Tag,
}

/// Trim every line of a raw comment.
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check whether a comment is a documentation comment rather than a plain one.
pub fn is_doc_comment(text: &str) -> bool {
    if text.starts_with("///<") || text.starts_with("/**<") || text.starts_with("//!<") {
        return false;
    }
    (text.starts_with("/**") && text != "/**/") || text.starts_with("/*!")
        || (text.starts_with("///") && !text.starts_with("////"))
        || text.starts_with("//!")
}

/// Whether a comment uses line syntax (`///`), which merges with neighbours.
pub fn is_line_doc(text: &str) -> bool {
    text.starts_with("///") || text.starts_with("//!")
}

fn strip_markers(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("/**")
        .or_else(|| line.strip_prefix("/*!"))
        .or_else(|| line.strip_prefix("///"))
        .or_else(|| line.strip_prefix("//!"))
        .unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line).trim();
    line.strip_prefix('*').unwrap_or(line).trim()
}

fn split_tag(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix('@').or_else(|| line.strip_prefix('\\'))?;
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    if end == 0 {
        return None;
    }
    Some((&body[..end], body[end..].trim()))
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn push_text(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brief_and_params() {
        let doc = DocComment::parse(
            "/**\n     * @brief Sets the name\n     * @param name new value\n     * @return nothing\n     */",
        );
        assert_eq!(doc.annotations.brief.as_deref(), Some("Sets the name"));
        assert_eq!(doc.annotations.params.len(), 1);
        assert_eq!(doc.annotations.params[0].name, "name");
        assert_eq!(doc.annotations.params[0].text, "new value");
        assert_eq!(doc.annotations.returns.as_deref(), Some("nothing"));
        assert_eq!(
            doc.verbatim.as_deref(),
            Some("/**\n* @brief Sets the name\n* @param name new value\n* @return nothing\n*/")
        );
    }

    #[test]
    fn test_parse_free_text_becomes_brief() {
        let doc = DocComment::parse("/// A wheel.\n/// Second line.");
        assert_eq!(
            doc.annotations.brief.as_deref(),
            Some("A wheel. Second line.")
        );
    }

    #[test]
    fn test_parse_custom_tags() {
        let doc = DocComment::parse("/** @aggregation\n * @author someone */");
        assert!(doc.has_tag(AGGREGATION_TAG));
        assert!(doc.has_tag("author"));
        assert!(!doc.has_tag(INTERFACE_TAG));
    }

    #[test]
    fn test_backslash_tags() {
        let doc = DocComment::parse("/*! \\brief Short */");
        assert_eq!(doc.annotations.brief.as_deref(), Some("Short"));
    }

    #[test]
    fn test_is_doc_comment() {
        assert!(is_doc_comment("/** doc */"));
        assert!(is_doc_comment("/// doc"));
        assert!(!is_doc_comment("// plain"));
        assert!(!is_doc_comment("/* plain */"));
        assert!(!is_doc_comment("/**/"));
        assert!(!is_doc_comment("///< trailing"));
    }
}
