//! Flag-safe token conversion and the names derived from it.

const SEPARATOR: char = '-';
const FALLBACK_RESOURCE: &str = "misc";

/// Converts `camelCase`, `PascalCase` and `snake_case` input to a lowercase
/// dash-separated token. A dash goes between an ASCII lowercase letter or
/// digit and a following ASCII uppercase letter; underscores become dashes;
/// leading and trailing dashes are trimmed. Applying it twice is a no-op.
pub fn safe_kebab(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev: Option<char> = None;
    for ch in input.chars() {
        if ch.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push(SEPARATOR);
        }
        if ch == '_' {
            out.push(SEPARATOR);
        } else {
            out.extend(ch.to_lowercase());
        }
        prev = Some(ch);
    }
    out.trim_matches(SEPARATOR).to_string()
}

/// Picks the subcommand group for an operation: the first tag, else the
/// segment after `api/v{N}`, else the first path segment, else `misc`.
pub fn resource_name(path: &str, tags: &[String]) -> String {
    let name = match tags.first() {
        Some(tag) => safe_kebab(tag),
        None => {
            let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            match parts.as_slice() {
                ["api", version, resource, ..] if is_version_segment(version) => {
                    safe_kebab(resource)
                }
                [first, ..] => safe_kebab(first),
                [] => String::new(),
            }
        }
    };
    if name.is_empty() {
        return FALLBACK_RESOURCE.to_string();
    }
    name
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// Name of an operation: its `operationId` when present, otherwise the
/// method joined to the path with braces dropped and slashes as dashes.
pub fn operation_name(operation_id: Option<&str>, method: &str, path: &str) -> String {
    if let Some(op_id) = operation_id.filter(|id| !id.is_empty()) {
        return safe_kebab(op_id);
    }
    let cleaned: String = path
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .map(|c| if c == '/' { SEPARATOR } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(SEPARATOR);
    safe_kebab(&format!("{method}-{cleaned}"))
}
