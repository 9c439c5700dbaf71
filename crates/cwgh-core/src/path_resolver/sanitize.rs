//! Repository-safe path segments.

/// Unit word carried by difficulty labels ("4 kyu").
pub const TIER_UNIT: &str = "kyu";

/// Sanitizes a title into a single filesystem- and URL-safe segment.
///
/// - Replaces every character outside `[A-Za-z0-9]` with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing underscores
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_underscore = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_underscore = false;
        } else {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        }
    }

    out.trim_matches('_').to_string()
}

/// Strips the rank unit word (first occurrence, any case) and surrounding whitespace.
pub fn sanitize_tier(tier: &str) -> String {
    let lower = tier.to_ascii_lowercase();
    let stripped = match lower.find(TIER_UNIT) {
        Some(at) => {
            let head = tier[..at].trim_end();
            let tail = tier[at + TIER_UNIT.len()..].trim_start();
            format!("{}{}", head, tail)
        }
        None => tier.to_string(),
    };
    stripped.trim().to_string()
}
