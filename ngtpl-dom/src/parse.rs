use crate::{Attr, Document, DomError, NodeId, is_void};

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("markup contains no nodes")]
    Empty,
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl Document {
    /// Parse `markup` and return its first top-level node, detached.
    ///
    /// Leading and trailing whitespace is trimmed first so it never turns into
    /// a top-level text node.
    pub fn parse_element(&self, markup: &str) -> Result<NodeId, MarkupError> {
        self.parse_fragment(markup)?
            .into_iter()
            .next()
            .ok_or(MarkupError::Empty)
    }

    /// Parse `markup` into detached top-level nodes.
    ///
    /// Minimal hand-rolled HTML-ish parser with support for:
    /// - nested elements, void elements (`<img>`) and self-closing tags (`<input/>`)
    /// - quoted, unquoted and valueless attributes; names may carry directive
    ///   punctuation such as `*ngif`, `[class.x]` or `#name`
    /// - comments and doctype declarations (skipped)
    /// - basic character references in text and attribute values
    ///
    /// Tag and attribute names are lowercased, as an HTML parser would.
    pub fn parse_fragment(&self, markup: &str) -> Result<Vec<NodeId>, MarkupError> {
        let input = markup.trim();
        let bytes = input.as_bytes();
        let mut i = 0usize;
        let mut stack: Vec<(NodeId, String)> = Vec::new();
        let mut roots: Vec<NodeId> = Vec::new();

        while i < bytes.len() {
            if starts_with(bytes, i, b"<!--") {
                i = match find(bytes, i + 4, b"-->") {
                    Some(end) => end + 3,
                    None => bytes.len(),
                };
                continue;
            }
            if starts_with(bytes, i, b"<!") {
                i = match find(bytes, i, b">") {
                    Some(end) => end + 1,
                    None => bytes.len(),
                };
                continue;
            }
            if starts_with(bytes, i, b"</") && is_name_start(bytes.get(i + 2).copied()) {
                i += 2;
                let tag = read_tag_name(bytes, &mut i);
                if let Some(end) = find(bytes, i, b">") {
                    i = end + 1;
                } else {
                    i = bytes.len();
                }
                // pop until matching tag; stray closing tags are ignored
                match stack.iter().rposition(|(_, t)| *t == tag) {
                    Some(pos) => stack.truncate(pos),
                    None => tracing::trace!(%tag, "ignoring stray closing tag"),
                }
                continue;
            }
            if bytes[i] == b'<' && is_name_start(bytes.get(i + 1).copied()) {
                // opening or self-closing tag
                i += 1;
                let tag = read_tag_name(bytes, &mut i);
                let mut attrs: Vec<Attr> = Vec::new();
                let mut self_closing = false;

                loop {
                    skip_ws(bytes, &mut i);
                    if i >= bytes.len() {
                        break;
                    }
                    match bytes[i] {
                        b'/' => {
                            self_closing = true;
                            i += 1;
                        }
                        b'>' => {
                            i += 1;
                            break;
                        }
                        _ => {
                            self_closing = false;
                            match read_attribute(input, &mut i) {
                                Some(attr) => {
                                    if !attrs.iter().any(|a| a.name == attr.name) {
                                        attrs.push(attr);
                                    }
                                }
                                // skip unknown token
                                None => i += 1,
                            }
                        }
                    }
                }

                let el = self.create_element(tag.clone());
                self.set_attrs(el, attrs);
                self.attach(&stack, &mut roots, el)?;
                if !self_closing && !is_void(&tag) {
                    stack.push((el, tag));
                }
                continue;
            }

            // text until the next tag
            let start = i;
            i += 1;
            while i < bytes.len() && !starts_markup(bytes, i) {
                i += 1;
            }
            let raw = &input[start..i];
            let t = self.create_text(decode_entities(raw));
            self.attach(&stack, &mut roots, t)?;
        }

        if let Some((_, tag)) = stack.first() {
            tracing::debug!(%tag, open = stack.len(), "closing unterminated elements at end of input");
        }

        // Trim root whitespace-only text nodes
        roots.retain(|n| match self.text(*n) {
            Some(t) => !t.trim().is_empty(),
            None => true,
        });

        Ok(roots)
    }

    fn attach(
        &self,
        stack: &[(NodeId, String)],
        roots: &mut Vec<NodeId>,
        node: NodeId,
    ) -> Result<(), DomError> {
        match stack.last() {
            Some((parent, _)) => self.append_child(*parent, node),
            None => {
                roots.push(node);
                Ok(())
            }
        }
    }
}

fn starts_with(bytes: &[u8], i: usize, pat: &[u8]) -> bool {
    bytes.len() >= i + pat.len() && &bytes[i..i + pat.len()] == pat
}

fn find(bytes: &[u8], from: usize, pat: &[u8]) -> Option<usize> {
    (from..bytes.len()).find(|&k| starts_with(bytes, k, pat))
}

fn is_name_start(b: Option<u8>) -> bool {
    b.is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_markup(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'<'
        && (is_name_start(bytes.get(i + 1).copied())
            || starts_with(bytes, i, b"<!")
            || (starts_with(bytes, i, b"</") && is_name_start(bytes.get(i + 2).copied())))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_tag_name(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b':' {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).to_ascii_lowercase()
}

fn is_attr_name_byte(c: u8) -> bool {
    !(c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/' | b'"' | b'\''))
}

fn read_attribute(input: &str, i: &mut usize) -> Option<Attr> {
    let bytes = input.as_bytes();
    let name_start = *i;
    while *i < bytes.len() && is_attr_name_byte(bytes[*i]) {
        *i += 1;
    }
    if *i == name_start {
        return None;
    }
    let name = input[name_start..*i].to_ascii_lowercase();

    let mut lookahead = *i;
    skip_ws(bytes, &mut lookahead);
    let mut value = String::new();
    if lookahead < bytes.len() && bytes[lookahead] == b'=' {
        *i = lookahead + 1;
        skip_ws(bytes, i);
        value = read_value(input, i);
    }

    Some(Attr {
        name,
        value: decode_entities(&value),
    })
}

fn read_value(input: &str, i: &mut usize) -> String {
    let bytes = input.as_bytes();
    if *i >= bytes.len() {
        return String::new();
    }
    let quote = bytes[*i];
    if quote == b'"' || quote == b'\'' {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        let s = input[start..*i].to_string();
        if *i < bytes.len() {
            *i += 1;
        } // consume closing quote
        s
    } else {
        let start = *i;
        while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
            *i += 1;
        }
        input[start..*i].to_string()
    }
}

/// Decode named (`&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`) and
/// numeric character references. Unknown references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let ch = match &tail[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                name => numeric_reference(name),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn numeric_reference(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
