//! Splits the parameter part of a message into parameter groups.
//!
//! A *group* is one user-supplied parameter. Groups are separated by
//! whitespace; items inside a group are separated by commas:
//!
//! ```text
//! a b c        -> [[a], [b], [c]]
//! a, b, c      -> [[a, b, c]]
//! "a b" c      -> [["a b"], [c]]
//! ```
//!
//! Double quotes keep whitespace and commas literal. Inside quotes `\"` stands
//! for a quote and `\\` for a backslash. A quote that is never closed runs to
//! the end of the input.

use std::iter::Peekable;
use std::str::Chars;

/// Tokenizes `input` into parameter groups. Blank input yields no groups.
pub fn tokenize(input: &str) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let mut group = Vec::new();
        loop {
            match chars.peek() {
                Some('"') => {
                    chars.next();
                    group.push(read_quoted(&mut chars));
                }
                // Empty item between commas, consumed below.
                Some(',') => {}
                Some(_) => {
                    let word = read_bare(&mut chars);
                    if !word.is_empty() {
                        group.push(word);
                    }
                }
                None => break,
            }

            let mut lookahead = chars.clone();
            skip_whitespace(&mut lookahead);
            if lookahead.peek() != Some(&',') {
                break;
            }
            lookahead.next();
            skip_whitespace(&mut lookahead);
            chars = lookahead;
        }

        if !group.is_empty() {
            groups.push(group);
        }
    }

    groups
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(ch) = chars.next_if(|c| !c.is_whitespace() && *c != ',') {
        word.push(ch);
    }
    word
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut quoted = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => match chars.next_if(|c| *c == '"' || *c == '\\') {
                Some(escaped) => quoted.push(escaped),
                None => quoted.push('\\'),
            },
            _ => quoted.push(ch),
        }
    }
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_words() {
        assert_eq!(tokenize("a b c"), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_tokenize_comma_list() {
        assert_eq!(tokenize("a, b, c"), vec![vec!["a", "b", "c"]]);
        assert_eq!(tokenize("a,b ,c"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(tokenize(r#""a b" c"#), vec![vec!["a b"], vec!["c"]]);
        assert_eq!(tokenize(r#""x, y", z"#), vec![vec!["x, y", "z"]]);
    }

    #[test]
    fn test_tokenize_mixed_tokenize() {
        assert_eq!(
            tokenize(r#"1 2, 3 "four five""#),
            vec![vec!["1"], vec!["2", "3"], vec!["four five"]]
        );
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_tokenize_escaped_quote() {
        assert_eq!(tokenize(r#""say \"hi\"" x"#), vec![vec![r#"say "hi""#], vec!["x"]]);
        assert_eq!(tokenize(r#""a\\b" "c\d""#), vec![vec![r"a\b"], vec![r"c\d"]]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert_eq!(tokenize(r#"a "b c, d"#), vec![vec!["a"], vec!["b c, d"]]);
    }

    #[test]
    fn test_tokenize_empty_quotes() {
        assert_eq!(tokenize(r#""" x"#), vec![vec![""], vec!["x"]]);
    }

    #[test]
    fn test_tokenize_stray_commas() {
        assert_eq!(tokenize("a,,b"), vec![vec!["a", "b"]]);
        assert_eq!(tokenize("a, b,"), vec![vec!["a", "b"]]);
        assert_eq!(tokenize(", a"), vec![vec!["a"]]);
        assert!(tokenize(",").is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("✔ ❌, ü"), vec![vec!["✔"], vec!["❌", "ü"]]);
    }
}
