//! Language id -> solution file extension.

use std::collections::BTreeMap;

/// Built-in table of known language ids.
const BUILTIN: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("python", "py"),
    ("java", "java"),
    ("c#", "cs"),
    ("ruby", "rb"),
    ("typescript", "ts"),
    ("go", "go"),
    ("c++", "cpp"),
];

/// Extension lookup: built-in entries plus configured extras (extras win).
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    extra: BTreeMap<String, String>,
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds configured entries. Keys are matched lower-cased; a leading `.` on
    /// the extension is dropped.
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Self {
        let extra = extra
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().trim_start_matches('.').to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        Self { extra }
    }

    /// Extension for `language_id`, or `None` when the id is not mapped.
    pub fn extension(&self, language_id: &str) -> Option<&str> {
        if let Some(ext) = self.extra.get(language_id) {
            return Some(ext.as_str());
        }
        BUILTIN
            .iter()
            .find(|(id, _)| *id == language_id)
            .map(|(_, ext)| *ext)
    }
}
