//! Support for Java `.properties` resource bundles.
//!
//! Decoding follows the `java.util.Properties` line grammar: `#`/`!`
//! comments, `=`/`:`/whitespace separators, backslash line continuation and
//! `\uXXXX` escapes. Comments and separators are kept as entry metadata so a
//! rewritten file still looks like the one the user edited.

use std::collections::HashSet;

use tracing::warn;

use crate::{
    codec::Charset,
    error::Error,
    traits::ResourceCodec,
    types::{Entry, EntryMetadata, ResourceDocument},
};

const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

/// Codec for `.properties` files in one charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertiesCodec {
    pub charset: Charset,
}

impl PropertiesCodec {
    pub fn new(charset: Charset) -> Self {
        PropertiesCodec { charset }
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String, Error> {
        match self.charset {
            // encoding_rs treats the ISO-8859-1 label as windows-1252, so
            // map bytes to code points directly.
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Utf8 => {
                if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes)
                    && encoding != encoding_rs::UTF_8
                {
                    let (text, had_errors) =
                        encoding.decode_without_bom_handling(&bytes[bom_len..]);
                    if had_errors {
                        return Err(Error::format_error(1, format!("invalid {}", encoding.name())));
                    }
                    return Ok(text.into_owned());
                }
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                match std::str::from_utf8(bytes) {
                    Ok(text) => Ok(text.to_string()),
                    Err(e) => {
                        let line = bytes[..e.valid_up_to()]
                            .iter()
                            .filter(|&&b| b == b'\n')
                            .count()
                            + 1;
                        Err(Error::format_error(line, "invalid UTF-8 byte sequence"))
                    }
                }
            }
        }
    }
}

impl ResourceCodec for PropertiesCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ResourceDocument, Error> {
        let text = self.bytes_to_string(bytes)?;
        self.decode_str(&text)
    }

    fn decode_str(&self, text: &str) -> Result<ResourceDocument, Error> {
        parse(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    fn encode(&self, document: &ResourceDocument) -> Result<Vec<u8>, Error> {
        let latin1 = self.charset == Charset::Latin1;
        let mut out = String::new();

        for entry in document.entries() {
            for line in &entry.metadata.leading {
                push_comment_line(&mut out, line, latin1);
            }
            out.push_str(&escape(&entry.key, true, latin1));
            out.push_str(separator_for(&entry.metadata));
            out.push_str(&escape(&entry.value, false, latin1));
            out.push('\n');
        }
        for line in document.trailer() {
            push_comment_line(&mut out, line, latin1);
        }

        Ok(match self.charset {
            Charset::Utf8 => out.into_bytes(),
            // escape() leaves nothing above U+00FF behind
            Charset::Latin1 => out.chars().map(|c| c as u32 as u8).collect(),
        })
    }
}

fn parse(text: &str) -> Result<ResourceDocument, Error> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    if normalized.is_empty() || normalized.ends_with('\n') {
        lines.pop();
    }

    let mut entries: Vec<Entry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line_no = i + 1;
        let content = lines[i].trim_start_matches(WHITESPACE);
        if content.is_empty() || content.starts_with('#') || content.starts_with('!') {
            pending.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let mut logical = content.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            i += 1;
            let Some(next) = lines.get(i) else {
                return Err(Error::format_error(
                    line_no,
                    "unterminated escape sequence at end of input",
                ));
            };
            logical.push_str(next.trim_start_matches(WHITESPACE));
        }
        i += 1;

        let (raw_key, separator, raw_value) = split_key_value(&logical);
        let key = unescape(raw_key, line_no)?;
        let value = unescape(raw_value, line_no)?;

        if !seen.insert(key.clone()) {
            warn!(key = %key, line = line_no, "duplicate key ignored, first occurrence wins");
            continue;
        }

        entries.push(Entry {
            key,
            value,
            metadata: EntryMetadata {
                leading: std::mem::take(&mut pending),
                separator: Some(separator.to_string()),
            },
        });
    }

    Ok(ResourceDocument::from_parts(entries, pending))
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line into raw key, separator and raw value.
fn split_key_value(line: &str) -> (&str, &str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || WHITESPACE.contains(&c) {
            key_end = idx;
            break;
        }
    }

    let rest = &line[key_end..];
    let after_ws = rest.trim_start_matches(WHITESPACE);
    let after_sep = match after_ws.strip_prefix(['=', ':']) {
        Some(stripped) => stripped.trim_start_matches(WHITESPACE),
        None => after_ws,
    };
    let sep_len = rest.len() - after_sep.len();
    (&line[..key_end], &rest[..sep_len], after_sep)
}

fn unescape(raw: &str, line: usize) -> Result<String, Error> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut buf = [0u16; 2];

    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let Some(escaped) = chars.next() else {
            return Err(Error::format_error(line, "unterminated escape sequence"));
        };
        match escaped {
            't' => units.push(u16::from(b'\t')),
            'n' => units.push(u16::from(b'\n')),
            'r' => units.push(u16::from(b'\r')),
            'f' => units.push(0x0c),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    return Err(Error::format_error(line, "malformed \\uxxxx encoding"));
                }
                let unit = u16::from_str_radix(&hex, 16)
                    .map_err(|_| Error::format_error(line, "malformed \\uxxxx encoding"))?;
                units.push(unit);
            }
            other => units.extend_from_slice(other.encode_utf16(&mut buf)),
        }
    }

    String::from_utf16(&units)
        .map_err(|_| Error::format_error(line, "unpaired surrogate in \\u escape"))
}

fn escape(text: &str, is_key: bool, latin1: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            // A leading '=' or ':' in a value would be read as the separator.
            '=' | ':' if is_key || idx == 0 => {
                out.push('\\');
                out.push(c);
            }
            '#' | '!' if is_key && idx == 0 => {
                out.push('\\');
                out.push(c);
            }
            c if c < ' ' || c == '\x7f' || c == '\u{feff}' || (latin1 && c > '\u{ff}') => {
                push_unicode_escape(&mut out, c)
            }
            c => out.push(c),
        }
    }
    out
}

fn push_unicode_escape(out: &mut String, c: char) {
    let mut buf = [0u16; 2];
    for unit in c.encode_utf16(&mut buf) {
        out.push_str(&format!("\\u{:04X}", unit));
    }
}

fn push_comment_line(out: &mut String, line: &str, latin1: bool) {
    for c in line.chars() {
        if latin1 && c > '\u{ff}' {
            push_unicode_escape(out, c);
        } else {
            out.push(c);
        }
    }
    out.push('\n');
}

fn separator_for(metadata: &EntryMetadata) -> &str {
    match metadata.separator.as_deref() {
        Some(sep) if is_valid_separator(sep) => sep,
        _ => "=",
    }
}

fn is_valid_separator(sep: &str) -> bool {
    let core = sep.trim_matches(WHITESPACE);
    matches!(core, "=" | ":") || (core.is_empty() && !sep.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode(text: &str) -> ResourceDocument {
        PropertiesCodec::new(Charset::Utf8).decode_str(text).unwrap()
    }

    fn encode(doc: &ResourceDocument, charset: Charset) -> String {
        let bytes = PropertiesCodec::new(charset).encode(doc).unwrap();
        bytes.iter().map(|&b| b as char).collect::<String>()
    }

    #[test]
    fn test_parse_separators() {
        let doc = decode(indoc! {"
            a=1
            b = 2
            c:3
            d 4
            e\t:  5
            f
        "});
        assert_eq!(
            doc.pairs(),
            vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5"), ("f", "")]
        );
    }

    #[test]
    fn test_parse_comments_attach_to_next_entry() {
        let doc = decode(indoc! {"
            # header
            ! bang comment

            greeting=Hello
            # trailing
        "});
        let entry = doc.get("greeting").unwrap();
        assert_eq!(
            entry.metadata.leading,
            vec!["# header".to_string(), "! bang comment".to_string(), String::new()]
        );
        assert_eq!(doc.trailer(), &["# trailing".to_string()]);
    }

    #[test]
    fn test_parse_escapes() {
        let doc = decode("key\\ with\\=odd\\:chars = tab\\there\\nnew \\u00e9\\u4e2d\\\\\n");
        assert_eq!(doc.value("key with=odd:chars"), Some("tab\there\nnew é中\\"));
    }

    #[test]
    fn test_parse_surrogate_pair_escape() {
        let doc = decode("emoji=\\uD83D\\uDE00\n");
        assert_eq!(doc.value("emoji"), Some("😀"));
    }

    #[test]
    fn test_parse_line_continuation() {
        let doc = decode(indoc! {"
            fruits = apple, banana, \\
                     pear, \\
                     cherry
            next = x
        "});
        assert_eq!(doc.value("fruits"), Some("apple, banana, pear, cherry"));
        assert_eq!(doc.value("next"), Some("x"));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let doc = decode("path = C:\\\\\nnext = y\n");
        assert_eq!(doc.value("path"), Some("C:\\"));
        assert_eq!(doc.value("next"), Some("y"));
    }

    #[test]
    fn test_malformed_unicode_escape_is_format_error() {
        let err = PropertiesCodec::default()
            .decode_str("ok=1\nbad=\\u12G4\n")
            .unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_truncated_unicode_escape_is_format_error() {
        let err = PropertiesCodec::default().decode_str("bad=\\u12").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
    }

    #[test]
    fn test_dangling_continuation_is_format_error() {
        let err = PropertiesCodec::default().decode_str("a=1\nb=2\\").unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_key_first_occurrence_wins() {
        let doc = decode("a=first\nb=2\na=second\n");
        assert_eq!(doc.pairs(), vec![("a", "first"), ("b", "2")]);
    }

    #[test]
    fn test_crlf_and_bom() {
        let codec = PropertiesCodec::new(Charset::Utf8);
        let doc = codec.decode(b"\xEF\xBB\xBFa=1\r\nb=2\r\n").unwrap();
        assert_eq!(doc.pairs(), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_utf16_bom_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "k=é\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let doc = PropertiesCodec::new(Charset::Utf8).decode(&bytes).unwrap();
        assert_eq!(doc.value("k"), Some("é"));
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let err = PropertiesCodec::new(Charset::Utf8)
            .decode(b"a=1\nb=\xff\n")
            .unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }));
    }

    #[test]
    fn test_latin1_decode_maps_bytes_directly() {
        let doc = PropertiesCodec::new(Charset::Latin1)
            .decode(b"caf\xe9=\x80\n")
            .unwrap();
        assert_eq!(doc.value("café"), Some("\u{80}"));
    }

    #[test]
    fn test_encode_latin1_escapes_non_latin1() {
        let doc = ResourceDocument::from_pairs([("hello", "你好 é")]);
        let text = encode(&doc, Charset::Latin1);
        assert_eq!(text, "hello=\\u4F60\\u597D \u{e9}\n");
    }

    #[test]
    fn test_encode_utf8_keeps_unicode() {
        let doc = ResourceDocument::from_pairs([("hello", "你好")]);
        let bytes = PropertiesCodec::new(Charset::Utf8).encode(&doc).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "hello=你好\n");
    }

    #[test]
    fn test_encode_escapes_key_and_leading_space() {
        let doc = ResourceDocument::from_pairs([("a key=x", " leading"), ("#hash", "v:w")]);
        let text = encode(&doc, Charset::Utf8);
        assert_eq!(text, "a\\ key\\=x=\\ leading\n\\#hash=v:w\n");
        assert_eq!(decode(&text).pairs(), doc.pairs());
    }

    #[test]
    fn test_leading_separator_char_in_value_survives_whitespace_separator() {
        let original = "eq \\=sign\ncolon \\:x\ntab\t\\=y\nmid a=b\n";
        let doc = decode(original);
        assert_eq!(
            doc.pairs(),
            vec![("eq", "=sign"), ("colon", ":x"), ("tab", "=y"), ("mid", "a=b")]
        );

        let text = encode(&doc, Charset::Utf8);

        assert_eq!(text, original);
        assert_eq!(decode(&text).pairs(), doc.pairs());
    }

    #[test]
    fn test_encode_preserves_comments_and_separator() {
        let original = indoc! {"
            # Greetings
            greeting = Hello

            farewell:Bye
            # end
        "};
        let doc = decode(original);
        assert_eq!(encode(&doc, Charset::Utf8), original);
    }

    #[test]
    fn test_roundtrip_multiline_value() {
        let doc = decode("multi = one\\\n    two\nx=line1\\nline2\n");
        let again = decode(&encode(&doc, Charset::Utf8));
        assert_eq!(again.pairs(), doc.pairs());
        assert_eq!(again.value("multi"), Some("onetwo"));
    }

    #[test]
    fn test_read_and_write_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("labels_fr.properties");
        let codec = PropertiesCodec::new(Charset::Latin1);
        let doc = ResourceDocument::from_pairs([("title", "Déjà vu"), ("snow", "❄")]);

        codec.write_to(&doc, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, b"title=D\xe9j\xe0 vu\nsnow=\\u2744\n".to_vec());
        assert_eq!(codec.read_from(&path).unwrap().pairs(), doc.pairs());
    }

    #[test]
    fn test_empty_input_has_no_entries_or_trailer() {
        let doc = decode("");
        assert!(doc.is_empty());
        assert!(doc.trailer().is_empty());
    }
}
