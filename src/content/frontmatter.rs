//! Front-matter parsing
//!
//! Posts open with a YAML block fenced by `---` lines, or with a JSON object
//! (optionally fenced by `;;;`). Anything else is treated as body text.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Accept `tags: rust` as well as `tags: [rust, web]`
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(tag) => vec![tag],
        OneOrMany::Many(tags) => tags,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

/// Front-matter block of a post, as written by the author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub slug: Option<String>,
    pub featured: bool,
    pub draft: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Split a document into (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if content.starts_with("---") {
            return Ok(Self::parse_yaml(content));
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end) = rest.find("\n---") else {
            return (FrontMatter::default(), content);
        };

        let yaml = &rest[..end];
        let body = rest[end + 4..].trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return (FrontMatter::default(), body);
        }

        // A thematic break followed by prose is not front-matter
        if !yaml.lines().any(looks_like_yaml_key) {
            return (FrontMatter::default(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml) {
            Ok(fm) => (fm, body),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                (FrontMatter::default(), content)
            }
        }
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        let (json, body) = if let Some(rest) = content.strip_prefix(";;;") {
            let end = rest
                .find(";;;")
                .ok_or_else(|| anyhow!("Unterminated ;;; front-matter"))?;
            (&rest[..end], &rest[end + 3..])
        } else {
            let end = matching_brace(content).ok_or_else(|| anyhow!("Invalid JSON front-matter"))?;
            (&content[..end], &content[end..])
        };

        let fm: FrontMatter = serde_json::from_str(json)
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;

        Ok((fm, body.trim_start_matches(['\n', '\r'])))
    }
}

/// `key: value` or `key:` with a plain identifier key (not `https:`)
fn looks_like_yaml_key(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return false;
    }
    let Some((key, value)) = line.split_once(':') else {
        return false;
    };
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp")
        && (value.is_empty() || value.starts_with(' '))
}

/// Byte offset just past the brace closing the object that opens `s`
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
