use crate::error::Error;

/// Characters with a meaning in the query syntax.
const RESERVED: &[char] = &[
    '"', ':', '*', '~', '?', '!', '%', '&', '(', ')', ',', '<', '>', '[', ']', '^', '{', '}', ' ',
    '\r', '\n', '\t', '\x0c',
];

/// Escape a value for use in a search query.
///
/// Double quotes can't be escaped reliably, so they are dropped. All other reserved characters
/// are prefixed with a backslash.
pub fn escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars().filter(|c| *c != '"') {
        if RESERVED.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Render a float without trailing zeros, independent of any locale.
pub fn format_float(value: f64) -> Result<String, Error> {
    if value.is_finite() {
        Ok(format!("{value}"))
    } else {
        Err(Error::InvalidParameter(format!(
            "Non-finite number '{value}' can't be searched for"
        )))
    }
}

/// Quote a phrase. Embedded double quotes are dropped, and so are trailing backslashes, which
/// would escape the closing quote.
pub(crate) fn quote_phrase(phrase: &str) -> String {
    format!("\"{}\"", phrase.replace('"', "").trim_end_matches('\\'))
}

/// Make text safe to be placed inside an SQL string literal.
pub(crate) fn quote_sql(text: &str) -> String {
    text.replace('\'', "''")
}
