//! HTML re-indentation shared by both markup adapters.
//!
//! Block elements go on their own line, two spaces per depth. A block whose
//! content is only text and inline elements stays on a single line. Text
//! whitespace is collapsed. `script`, `style`, `pre` and `textarea` bodies
//! are copied verbatim. Running the printer on its own output is a no-op.

use crate::utils::html::{is_inline_element, is_verbatim_element, is_void_element};

const INDENT: &str = "  ";

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    /// `<!DOCTYPE ...>`, `<?xml ...?>`
    Declaration(&'a str),
    Comment(&'a str),
    Start { name: String, raw: &'a str },
    End { name: String },
    Text(&'a str),
    /// Body of a verbatim element
    Raw(&'a str),
}

/// Reformat `html`. Output ends with a newline unless empty.
pub fn prettify(html: &str) -> String {
    let tokens = tokenize(html);
    let mut printer = Printer::default();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Declaration(raw) => printer.own_line(&collapse_tag(raw)),
            Token::Comment(raw) => printer.own_line(raw.trim()),
            Token::Text(text) => printer.text(text),
            Token::Raw(raw) => printer.line.push_str(raw),
            Token::Start { name, raw } => {
                let tag = collapse_tag(raw);
                if is_verbatim_element(name) && !raw.ends_with("/>") {
                    printer.flush();
                    printer.line.push_str(&tag);
                } else if is_inline_element(name) {
                    printer.inline(&tag);
                } else if is_void_element(name) || raw.ends_with("/>") {
                    printer.own_line(&tag);
                } else if let Some(end) = flow_end(&tokens, i, name) {
                    let body = render_flow(&tokens[i + 1..end]);
                    printer.own_line(&format!("{tag}{body}</{name}>"));
                    i = end;
                } else {
                    printer.own_line(&tag);
                    printer.depth += 1;
                }
            }
            Token::End { name } => {
                if is_verbatim_element(name) {
                    printer.line.push_str(&format!("</{name}>"));
                    printer.flush();
                } else if is_inline_element(name) {
                    printer.inline(&format!("</{name}>"));
                } else {
                    printer.flush();
                    printer.depth = printer.depth.saturating_sub(1);
                    printer.own_line(&format!("</{name}>"));
                }
            }
        }
        i += 1;
    }

    printer.flush();
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    line: String,
    depth: usize,
    pending_space: bool,
}

impl Printer {
    fn flush(&mut self) {
        let line = self.line.trim_end();
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.line.clear();
        self.pending_space = false;
    }

    fn own_line(&mut self, content: &str) {
        self.flush();
        self.line.push_str(content);
        self.flush();
    }

    fn inline(&mut self, content: &str) {
        if self.pending_space && !self.line.is_empty() {
            self.line.push(' ');
        }
        self.pending_space = false;
        self.line.push_str(content);
    }

    fn text(&mut self, text: &str) {
        let collapsed = collapse_text(text);
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        if !collapsed.is_empty() {
            self.inline(&collapsed);
            self.pending_space = text.ends_with(char::is_whitespace);
        }
    }
}

/// Index of the end tag closing `tokens[open]` if only text and inline
/// elements come before it.
fn flow_end(tokens: &[Token<'_>], open: usize, name: &str) -> Option<usize> {
    for (k, token) in tokens.iter().enumerate().skip(open + 1) {
        match token {
            Token::Text(_) => {}
            Token::Start { name: n, .. } if is_inline_element(n) => {}
            Token::End { name: n } if n == name => return Some(k),
            Token::End { name: n } if is_inline_element(n) => {}
            _ => return None,
        }
    }
    None
}

/// Single-line rendering of text and inline tags.
fn render_flow(tokens: &[Token<'_>]) -> String {
    let mut printer = Printer::default();
    for token in tokens {
        match token {
            Token::Text(text) => printer.text(text),
            Token::Start { raw, .. } => printer.inline(&collapse_tag(raw)),
            Token::End { name } => printer.inline(&format!("</{name}>")),
            _ => {}
        }
    }
    printer.line.trim_end().to_owned()
}

fn collapse_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace runs outside quoted attribute values.
fn collapse_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    let mut space = false;
    for c in raw.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => space = true,
            None => {
                if space && c != '>' && !out.is_empty() {
                    out.push(' ');
                }
                space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

// ============================================================================
// Tokenizer
// ============================================================================

fn tokenize(src: &str) -> Vec<Token<'_>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < src.len() {
        if !starts_construct(bytes, i) {
            let end = next_construct(bytes, i + 1);
            tokens.push(Token::Text(&src[i..end]));
            i = end;
            continue;
        }

        let rest = &src[i..];
        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map_or(src.len(), |p| i + 4 + p + 3);
            tokens.push(Token::Comment(&src[i..end]));
            i = end;
            continue;
        }

        let Some(close) = tag_end(bytes, i) else {
            tokens.push(Token::Text(&src[i..]));
            break;
        };
        let raw = &src[i..=close];

        if rest.starts_with("<!") || rest.starts_with("<?") {
            tokens.push(Token::Declaration(raw));
            i = close + 1;
        } else if rest.starts_with("</") {
            tokens.push(Token::End {
                name: tag_name(&raw[2..]),
            });
            i = close + 1;
        } else {
            let name = tag_name(&raw[1..]);
            let verbatim = is_verbatim_element(&name) && !raw.ends_with("/>");
            tokens.push(Token::Start {
                name: name.clone(),
                raw,
            });
            i = close + 1;
            if verbatim {
                let body_end = find_closing(src, i, &name);
                if body_end > i {
                    tokens.push(Token::Raw(&src[i..body_end]));
                }
                i = body_end;
            }
        }
    }
    tokens
}

/// `<` followed by a letter, `/x`, `!` or `?`.
fn starts_construct(bytes: &[u8], i: usize) -> bool {
    if bytes[i] != b'<' {
        return false;
    }
    match bytes.get(i + 1) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'!' || *b == b'?' => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic),
        _ => false,
    }
}

fn next_construct(bytes: &[u8], from: usize) -> usize {
    (from..bytes.len())
        .find(|&j| starts_construct(bytes, j))
        .unwrap_or(bytes.len())
}

/// Index of the `>` ending the tag at `start`, honoring quoted values.
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote = None;
    for (j, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(j),
            None => {}
        }
    }
    None
}

fn tag_name(after_bracket: &str) -> String {
    after_bracket
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Start of `</name` (case-insensitive) at or after `from`, or end of input.
fn find_closing(src: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    let haystack = src[from..].to_ascii_lowercase();
    haystack.find(&needle).map_or(src.len(), |p| from + p)
}
