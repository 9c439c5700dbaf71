//! The captured unit: solution text plus problem metadata.
//!
//! Metadata is best-effort; every field degrades to a default. Only the
//! solution text is required, and that is checked by the orchestrator before
//! anything touches the network.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_TIER: &str = "Unknown";
pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_LANGUAGE: &str = "unknown";

/// What the page data provider could read. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub difficulty_tier: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub language_id: Option<String>,
    #[serde(default)]
    pub source_url: String,
}

/// One save attempt's worth of data. Created fresh per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedArtifact {
    pub title: String,
    pub difficulty_tier: String,
    pub description_html: String,
    pub tags: Vec<String>,
    pub language_id: String,
    pub source_url: String,
    pub solution_text: String,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Language label as the host shows it ("Language Python") to a lower-case id.
fn normalize_language(raw: Option<String>) -> String {
    present(raw.map(|l| l.replacen("Language", "", 1)))
        .map(|l| l.to_lowercase())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

impl CapturedArtifact {
    /// Combine provider metadata with the editor contents, applying defaults.
    pub fn from_parts(meta: ArtifactMetadata, solution_text: String) -> Self {
        Self {
            title: present(meta.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            difficulty_tier: present(meta.difficulty_tier)
                .unwrap_or_else(|| DEFAULT_TIER.to_string()),
            // Markup is kept verbatim; only a blank value falls back.
            description_html: meta
                .description_html
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            tags: meta
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            language_id: normalize_language(meta.language_id),
            source_url: meta.source_url,
            solution_text,
        }
    }

    pub fn has_solution(&self) -> bool {
        !self.solution_text.is_empty()
    }

    /// Contents of the companion description file.
    pub fn render_readme(&self) -> String {
        format!(
            "# {}\n\n**Kyu:** {}\n\n**Description:**\n\n{}\n\n**Tags:** {}\n\n[Original problem]({})",
            self.title,
            self.difficulty_tier,
            html_to_text(&self.description_html),
            self.tags.join(", "),
            self.source_url
        )
    }
}

/// Text content of an HTML fragment: tags dropped, common entities decoded.
/// `<script>` and `<style>` bodies are skipped entirely.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&decode_entities(&rest[..open]));
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            // Unterminated tag: the remainder is text.
            out.push_str(&decode_entities(after));
            return out;
        };
        let tag = after[1..close].trim().to_ascii_lowercase();
        rest = &after[close + 1..];

        for raw in ["script", "style"] {
            if tag == raw || tag.starts_with(&format!("{} ", raw)) {
                let end = format!("</{}", raw);
                rest = match rest.to_ascii_lowercase().find(&end) {
                    Some(i) => {
                        let tail = &rest[i..];
                        tail.find('>').map(|j| &tail[j + 1..]).unwrap_or("")
                    }
                    None => "",
                };
            }
        }
    }
    out.push_str(&decode_entities(rest));
    out
}

/// Named references that show up in kata descriptions.
fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201a}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bdquo" => '\u{201e}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "plusmn" => '\u{b1}',
        "times" => '\u{d7}',
        "divide" => '\u{f7}',
        "minus" => '\u{2212}',
        "le" => '\u{2264}',
        "ge" => '\u{2265}',
        "ne" => '\u{2260}',
        "asymp" => '\u{2248}',
        "infin" => '\u{221e}',
        "sum" => '\u{2211}',
        "radic" => '\u{221a}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        "uarr" => '\u{2191}',
        "darr" => '\u{2193}',
        "harr" => '\u{2194}',
        "sup2" => '\u{b2}',
        "sup3" => '\u{b3}',
        "frac12" => '\u{bd}',
        "frac14" => '\u{bc}',
        "frac34" => '\u{be}',
        "euro" => '\u{20ac}',
        "pound" => '\u{a3}',
        "yen" => '\u{a5}',
        "cent" => '\u{a2}',
        "sect" => '\u{a7}',
        "para" => '\u{b6}',
        "alpha" => '\u{3b1}',
        "beta" => '\u{3b2}',
        "gamma" => '\u{3b3}',
        "delta" => '\u{3b4}',
        "lambda" => '\u{3bb}',
        "mu" => '\u{3bc}',
        "pi" => '\u{3c0}',
        "sigma" => '\u{3c3}',
        "theta" => '\u{3b8}',
        "Delta" => '\u{394}',
        "Sigma" => '\u{3a3}',
        "eacute" => '\u{e9}',
        "egrave" => '\u{e8}',
        "agrave" => '\u{e0}',
        "ccedil" => '\u{e7}',
        "ouml" => '\u{f6}',
        "uuml" => '\u{fc}',
        "auml" => '\u{e4}',
        "szlig" => '\u{df}',
        "ntilde" => '\u{f1}',
        _ => return None,
    };
    Some(c)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').filter(|&end| end <= 10).and_then(|end| {
            let ch = match &after[1..end] {
                num if num.starts_with("#x") || num.starts_with("#X") => {
                    u32::from_str_radix(&num[2..], 16).ok().and_then(char::from_u32)
                }
                num if num.starts_with('#') => num[1..].parse().ok().and_then(char::from_u32),
                name => named_entity(name),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
