//! Shell-style `$NAME` / `${NAME}` expansion.

/// Expands environment variable references using the process environment.
///
/// Unset variables expand to the empty string.
#[must_use]
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expands `$NAME` and `${NAME}` references through `lookup`.
///
/// A `$` that is not followed by a name is kept as is, and so is an
/// unterminated `${`.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(close) = braced.find('}') {
                out.push_str(&lookup(&braced[..close]).unwrap_or_default());
                rest = &braced[close + 1..];
            } else {
                out.push('$');
                rest = after;
            }
            continue;
        }

        let len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
