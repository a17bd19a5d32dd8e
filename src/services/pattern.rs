use log::debug;
use regex::Regex;

/// A compiled shell-style glob (`*`, `?`, everything else literal).
///
/// The whole file name must match; matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    /// Compile `pattern`. Fails only if the translated expression is rejected by the regex engine.
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&translate(pattern))?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.regex.is_match(filename)
    }
}

/// Match a single file name against a glob. Malformed patterns never match.
pub fn matches(filename: &str, pattern: &str) -> bool {
    match GlobPattern::compile(pattern) {
        Ok(glob) => glob.is_match(filename),
        Err(e) => {
            debug!("Rejecting malformed pattern '{}': {}", pattern, e);
            false
        }
    }
}

fn translate(pattern: &str) -> String {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => {
                let mut buf = [0u8; 4];
                expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    expr.push('$');
    expr
}
