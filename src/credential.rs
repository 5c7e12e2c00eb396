use once_cell::sync::Lazy;
use regex::Regex;

static PROVIDER_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"gsk_[a-zA-Z0-9]{50,}").unwrap());

/// Resolve the credential to hand to the generation provider.
///
/// Resolution is two steps: keep only the first comma-delimited candidate, then
/// look for a token with the provider's key shape inside it. When no such token
/// exists the trimmed candidate is used as-is, which may be empty. An empty or
/// bogus credential is not rejected here; the provider reports it as unauthorized.
pub fn resolve(raw: &str) -> String {
    let candidate = first_candidate(raw);
    let resolved = match PROVIDER_KEY_RE.find(candidate) {
        Some(m) => m.as_str().to_string(),
        None => candidate.trim().to_string(),
    };
    tracing::debug!("resolved credential: {}", preview(&resolved));
    resolved
}

/// Pick the override when it carries anything, the process default otherwise.
pub fn resolve_with_default(header: Option<&str>, default: &str) -> String {
    match header {
        Some(value) if !value.is_empty() => resolve(value),
        _ => resolve(default),
    }
}

fn first_candidate(raw: &str) -> &str {
    raw.split(',').next().unwrap_or("")
}

/// Length plus a four character prefix, never the full value.
pub fn preview(key: &str) -> String {
    if key.is_empty() {
        return "len=0".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("len={}, prefix={}…", key.len(), prefix)
}
