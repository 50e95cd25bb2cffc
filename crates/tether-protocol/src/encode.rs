//! Request line encoding for daemon exchanges.
//!
//! A request is one line built by joining tokens with single spaces. Within
//! each token the characters `"`, `\` and `'` gain a preceding backslash;
//! tokens containing whitespace are additionally wrapped in double quotes.
//! Encoding is pure and total with no length limit, so a request is never
//! bounded by the caller's argv size.

/// Characters escaped with a preceding backslash in every token.
const ESCAPE_CHARS: &[char] = &['"', '\\', '\''];

/// Builds one request line from `tokens`.
///
/// A raw newline inside a token would break line framing, so newlines are
/// escaped the same way as the quote characters; the receiving line buffer
/// resolves the escape back to a literal newline.
#[must_use]
pub fn encode_request<I, T>(tokens: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut line = String::new();
    for raw in tokens {
        let token = raw.as_ref();
        if !line.is_empty() {
            line.push(' ');
        }
        let quoted = token.chars().any(char::is_whitespace);
        if quoted {
            line.push('"');
        }
        for character in token.chars() {
            if character == '\n' || ESCAPE_CHARS.contains(&character) {
                line.push('\\');
            }
            line.push(character);
        }
        if quoted {
            line.push('"');
        }
    }
    line
}

/// Splits an encoded request line back into its tokens.
///
/// This is the inverse the daemon applies: backslash escapes are resolved,
/// double quotes toggle whether a space separates tokens, and runs of
/// unquoted spaces collapse into one separator.
#[must_use]
pub fn decode_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut characters = line.chars();
    while let Some(character) = characters.next() {
        match character {
            '\\' => {
                in_token = true;
                if let Some(escaped) = characters.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            ' ' if !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            other => {
                current.push(other);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
