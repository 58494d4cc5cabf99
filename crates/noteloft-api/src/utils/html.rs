//! HTML entity decoding for note content.
//!
//! Editors submit note bodies with HTML-encoded entities; content is stored
//! decoded.

/// Decode the common named entities and numeric character references.
pub fn decode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let rest = &input[i..];
        let Some(end) = rest.find(';').filter(|&end| end <= 10) else {
            out.push(c);
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix('#')
                .and_then(|num| {
                    if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        num.parse().ok()
                    }
                })
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                // skip past the consumed entity
                for _ in 0..end {
                    chars.next();
                }
            }
            None => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entities() {
        assert_eq!(
            decode_html_entities("a &amp; b &lt;tag&gt; &quot;q&quot;"),
            "a & b <tag> \"q\""
        );
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_html_entities("&#65;&#x42;"), "AB");
    }

    #[test]
    fn test_unknown_entities_pass_through() {
        assert_eq!(decode_html_entities("&unknown; &"), "&unknown; &");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(decode_html_entities("no entities here"), "no entities here");
    }
}
