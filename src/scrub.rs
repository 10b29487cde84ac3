//! Comment and string blanking.
//!
//! Downstream scanners (block decomposition, symbol extraction, the lint
//! walks) operate on "scrubbed" text in which comment bodies and string
//! interiors are replaced by spaces. Blanking keeps every byte offset and
//! every line break of the original, so positions computed on scrubbed text
//! are valid in the raw document.

#[derive(PartialEq)]
enum State {
    Normal,
    LineComment,
    Literal { delimiter: char },
}

/// Blanks `//...` and `#...` end-of-line comments (markers included) and the
/// interiors of `"..."`, `'...'` and `` `...` `` literals, keeping the quote
/// delimiters themselves. Output has the same byte length and line count as
/// the input.
///
/// Quote literals end at an unescaped closing delimiter; a line break also
/// terminates `"` and `'` literals (unterminated, best effort), while
/// backtick templates stay open across lines. Never fails on malformed
/// input.
pub fn scrub(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = State::Normal;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '/' if chars.peek() == Some(&'/') => {
                    state = State::LineComment;
                    blank(&mut out, c);
                }
                '#' => {
                    state = State::LineComment;
                    blank(&mut out, c);
                }
                '"' | '\'' | '`' => {
                    state = State::Literal { delimiter: c };
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    out.push('\n');
                } else {
                    blank(&mut out, c);
                }
            }
            State::Literal { delimiter } => match c {
                '\\' => {
                    // Escape: blank the backslash and whatever it escapes.
                    blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        if escaped == '\n' {
                            out.push('\n');
                        } else {
                            blank(&mut out, escaped);
                        }
                    }
                }
                '\n' => {
                    if delimiter != '`' {
                        state = State::Normal;
                    }
                    out.push('\n');
                }
                _ if c == delimiter => {
                    state = State::Normal;
                    out.push(c);
                }
                _ => blank(&mut out, c),
            },
        }
    }
    out
}

/// One space per UTF-8 byte, so byte offsets stay aligned.
fn blank(out: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        out.push(' ');
    }
}
