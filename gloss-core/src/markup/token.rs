//! Splits markup into tags and text runs without rewriting a single byte

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Tag(Tag<'a>),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    /// Void element or explicit `/>`
    SelfClosing,
    Close,
    /// Comments, doctypes, processing instructions
    Other,
}

/// A tag exactly as it appears in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    raw: &'a str,
}

impl<'a> Tag<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn kind(&self) -> TagKind {
        if self.raw.starts_with("</") {
            TagKind::Close
        } else if self.raw.starts_with("<!") || self.raw.starts_with("<?") {
            TagKind::Other
        } else if self.raw.ends_with("/>") || self.is_void() {
            TagKind::SelfClosing
        } else {
            TagKind::Open
        }
    }

    /// Element name as written (case preserved)
    pub fn name(&self) -> Option<&'a str> {
        let body = self
            .raw
            .strip_prefix("</")
            .or_else(|| self.raw.strip_prefix('<'))?;
        let len = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
            .unwrap_or(body.len());
        (len > 0).then(|| &body[..len])
    }

    pub fn is_void(&self) -> bool {
        self.name()
            .is_some_and(|name| VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name)))
    }

    /// Raw (still entity-encoded) value of an attribute; `Some("")` for bare attributes
    pub fn attr(&self, wanted: &str) -> Option<&'a str> {
        self.attributes()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    fn attributes(&self) -> Attributes<'a> {
        let name_len = self.name().map(str::len).unwrap_or(0);
        let start = if self.raw.starts_with("</") { 2 } else { 1 } + name_len;
        let end = self.raw.len().saturating_sub(1).max(start);
        Attributes {
            rest: self.raw.get(start..end).unwrap_or(""),
        }
    }
}

struct Attributes<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self
            .rest
            .trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        let after_name = rest[name_len..].trim_start();

        let Some(value_src) = after_name.strip_prefix('=') else {
            self.rest = after_name;
            return Some((name, ""));
        };
        let value_src = value_src.trim_start();

        let (value, remaining) = match value_src.as_bytes().first() {
            Some(&q @ (b'"' | b'\'')) => {
                let body = &value_src[1..];
                match body.find(q as char) {
                    Some(close) => (&body[..close], &body[close + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let len = value_src
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(value_src.len());
                (&value_src[..len], &value_src[len..])
            }
        };
        self.rest = remaining;
        Some((name, value))
    }
}

/// Iterator over `(offset, token)` pairs covering the whole input
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

pub fn tokenize(src: &str) -> Tokens<'_> {
    Tokens { src, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let rest = self.src.get(start..).filter(|r| !r.is_empty())?;

        if let Some(len) = tag_len(rest) {
            self.pos += len;
            return Some((start, Token::Tag(Tag::new(&rest[..len]))));
        }

        // A text run always holds at least its first character
        let mut end = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        while end < rest.len() {
            match rest[end..].find('<') {
                None => end = rest.len(),
                Some(i) => {
                    end += i;
                    if tag_len(&rest[end..]).is_some() {
                        break;
                    }
                    end += 1;
                }
            }
        }

        self.pos += end;
        Some((start, Token::Text(&rest[..end])))
    }
}

/// Length of the tag at the start of `s`, if `s` starts with one
fn tag_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    if s.starts_with("<!--") {
        return s[4..].find("-->").map(|i| 4 + i + 3);
    }

    let opener = *bytes.get(1)?;
    let starts_name = |b: Option<&u8>| b.is_some_and(|b| b.is_ascii_alphabetic());
    let valid = match opener {
        b'/' => starts_name(bytes.get(2)),
        b'!' | b'?' => true,
        _ => opener.is_ascii_alphabetic(),
    };
    if !valid {
        return None;
    }

    // Quotes only count when they open an attribute value
    let mut quote: Option<u8> = None;
    let mut prev = opener;
    for (i, &b) in bytes.iter().enumerate().skip(2) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' if prev == b'=' => quote = Some(b),
                b'>' => return Some(i + 1),
                b'<' => return None,
                _ => {}
            },
        }
        if !b.is_ascii_whitespace() {
            prev = b;
        }
    }
    None
}
