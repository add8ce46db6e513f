use std::collections::HashSet;

/// Split a path or filename into lowercase search tokens.
///
/// Whitespace and `- _ . / \ ( ) [ ] { }` end the current token. An
/// uppercase letter after a non-uppercase one also ends it and starts a new
/// token, which splits camelCase names: `MyFile.txt` gives `my`, `file`, `txt`.
/// A run of uppercase letters stays one token, except that its last letter
/// starts a new token when a lowercase letter follows (`HTTPServer` gives
/// `http`, `server`). Empty tokens are never produced.
pub fn tokenize(input: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    let mut prev = CharType::Separator;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        let kind = classify_char(ch);
        match kind {
            CharType::Separator => {
                flush(&mut tokens, &mut current);
            }
            CharType::Upper => {
                let next_is_lower = chars.peek().is_some_and(|c| c.is_lowercase());
                if prev != CharType::Upper || next_is_lower {
                    flush(&mut tokens, &mut current);
                }
                current.extend(ch.to_lowercase());
            }
            CharType::Other => {
                current.extend(ch.to_lowercase());
            }
        }
        prev = kind;
    }

    flush(&mut tokens, &mut current);
    tokens
}

/// Join a token set into the space-delimited blob stored in the index.
/// Tokens are sorted so the blob is stable across runs.
pub fn tokens_to_blob(tokens: &HashSet<String>) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CharType {
    Separator,
    Upper,
    Other,
}

fn classify_char(ch: char) -> CharType {
    if ch.is_whitespace() || is_hard_separator(ch) {
        CharType::Separator
    } else if ch.is_uppercase() {
        CharType::Upper
    } else {
        CharType::Other
    }
}

fn is_hard_separator(ch: char) -> bool {
    matches!(
        ch,
        '-' | '_' | '.' | '/' | '\\' | '(' | ')' | '[' | ']' | '{' | '}'
    )
}

fn flush(tokens: &mut HashSet<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.insert(std::mem::take(current));
    }
}
