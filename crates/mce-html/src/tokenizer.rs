//! Tolerant HTML tokenizer.
//!
//! Never fails: anything that does not look like markup is returned as
//! text, unterminated comments and raw text swallow the rest of the input.

use std::sync::LazyLock;

use regex::Regex;

/// Attribute inside a start tag: `name`, `name=value`, `name="value"` or `name='value'`.
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#)
        .expect("invalid attribute regex")
});

/// Start tag name at the beginning of the tag body.
static TAG_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9:_.-]*").expect("invalid tag name regex"));

/// One lexical unit of HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Character data, still entity-encoded.
    Text(String),
    /// Contents of `script`/`style`, never entity-decoded.
    RawText(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    /// Comment body. CDATA sections surface as `[CDATA[...]]` comments.
    Comment(String),
    ProcessingInstruction(String),
    Doctype(String),
}

/// Split markup into tokens.
pub fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(offset) = html[pos..].find('<') {
        let lt = pos + offset;

        let Some((token, end)) = markup_at(html, lt) else {
            // A lone `<` is text.
            pos = lt + 1;
            continue;
        };

        if text_start < lt {
            tokens.push(Token::Text(html[text_start..lt].to_owned()));
        }
        pos = end;

        if let Token::StartTag {
            name,
            self_closing: false,
            ..
        } = &token
        {
            if matches!(name.as_str(), "script" | "style") {
                let name = name.clone();
                tokens.push(token);
                let (raw, after) = raw_text(html, end, &name);
                if !raw.is_empty() {
                    tokens.push(Token::RawText(raw.to_owned()));
                }
                pos = after;
                text_start = pos;
                continue;
            }
        }

        tokens.push(token);
        text_start = pos;
    }

    if text_start < html.len() {
        tokens.push(Token::Text(html[text_start..].to_owned()));
    }
    tokens
}

/// Recognize markup starting at `lt`, returning the token and the index after it.
fn markup_at(html: &str, lt: usize) -> Option<(Token, usize)> {
    let rest = &html[lt..];

    if let Some(body) = rest.strip_prefix("<!--") {
        return Some(match body.find("-->") {
            Some(close) => (Token::Comment(body[..close].to_owned()), lt + 4 + close + 3),
            None => (Token::Comment(body.to_owned()), html.len()),
        });
    }

    if starts_with_ignore_case(rest, "<![CDATA[") {
        let body = &rest[9..];
        return Some(match body.find("]]>") {
            Some(close) => (
                Token::Comment(format!("[CDATA[{}]]", &body[..close])),
                lt + 9 + close + 3,
            ),
            None => (Token::Comment(format!("[CDATA[{body}]]")), html.len()),
        });
    }

    if let Some(body) = rest.strip_prefix("<!") {
        let (content, close) = match body.find('>') {
            Some(i) => (&body[..i], lt + 2 + i + 1),
            None => (body, html.len()),
        };
        if starts_with_ignore_case(content, "doctype") {
            return Some((Token::Doctype(content[7..].trim().to_owned()), close));
        }
        return Some((Token::Comment(content.to_owned()), close));
    }

    if let Some(body) = rest.strip_prefix("<?") {
        return Some(match body.find("?>") {
            Some(close) => (
                Token::ProcessingInstruction(body[..close].to_owned()),
                lt + 2 + close + 2,
            ),
            None => {
                let close = body.find('>').unwrap_or(body.len());
                (
                    Token::ProcessingInstruction(body[..close].to_owned()),
                    (lt + 2 + close + 1).min(html.len()),
                )
            }
        });
    }

    if let Some(body) = rest.strip_prefix("</") {
        let name = TAG_NAME_PATTERN.find(body)?;
        let close = body.find('>').map_or(html.len(), |i| lt + 2 + i + 1);
        return Some((Token::EndTag(name.as_str().to_ascii_lowercase()), close));
    }

    let body = &rest[1..];
    let name = TAG_NAME_PATTERN.find(body)?;
    let tag_end = find_tag_end(body);
    let inner = &body[name.end()..tag_end.unwrap_or(body.len())];
    let self_closing = inner.trim_end().ends_with('/');
    let end = tag_end.map_or(html.len(), |i| lt + 1 + i + 1);

    Some((
        Token::StartTag {
            name: name.as_str().to_ascii_lowercase(),
            attributes: parse_attributes(inner),
            self_closing,
        },
        end,
    ))
}

/// Index of the `>` closing a tag body, skipping quoted attribute values.
fn find_tag_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in body.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attributes(inner: &str) -> Vec<(String, Option<String>)> {
    ATTRIBUTE_PATTERN
        .captures_iter(inner)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_owned());
            (name, value)
        })
        .collect()
}

/// Raw text up to the matching close tag (case-insensitive).
fn raw_text<'a>(html: &'a str, start: usize, name: &str) -> (&'a str, usize) {
    let needle = format!("</{name}");
    let haystack = html[start..].to_ascii_lowercase();
    match haystack.find(&needle) {
        Some(offset) => (&html[start..start + offset], start + offset),
        None => (&html[start..], html.len()),
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn start(name: &str, attributes: &[(&str, Option<&str>)]) -> Token {
        Token::StartTag {
            name: name.to_owned(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.map(str::to_owned)))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn test_simple_markup() {
        assert_eq!(
            tokenize("<p class=\"a\">Hi <b>there</b></p>"),
            vec![
                start("p", &[("class", Some("a"))]),
                Token::Text("Hi ".to_owned()),
                start("b", &[]),
                Token::Text("there".to_owned()),
                Token::EndTag("b".to_owned()),
                Token::EndTag("p".to_owned()),
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        assert_eq!(
            tokenize("<input type=checkbox checked value='a > b' DATA-X=\"1\">"),
            vec![start(
                "input",
                &[
                    ("type", Some("checkbox")),
                    ("checked", None),
                    ("value", Some("a > b")),
                    ("data-x", Some("1")),
                ]
            )]
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(
            tokenize("<br/>"),
            vec![Token::StartTag {
                name: "br".to_owned(),
                attributes: vec![],
                self_closing: true,
            }]
        );
    }

    #[test]
    fn test_comment_cdata_pi_doctype() {
        assert_eq!(
            tokenize("<!DOCTYPE html><!--c--><![CDATA[x<y]]><?xml:namespace prefix=o?>"),
            vec![
                Token::Doctype("html".to_owned()),
                Token::Comment("c".to_owned()),
                Token::Comment("[CDATA[x<y]]".to_owned()),
                Token::ProcessingInstruction("xml:namespace prefix=o".to_owned()),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_swallows_rest() {
        assert_eq!(
            tokenize("a<!-- b <p>c"),
            vec![
                Token::Text("a".to_owned()),
                Token::Comment(" b <p>c".to_owned()),
            ]
        );
    }

    #[test]
    fn test_script_is_raw_text() {
        assert_eq!(
            tokenize("<script>if (a < b) { x = '</p>'; }</SCRIPT>"),
            vec![
                start("script", &[]),
                Token::RawText("if (a < b) { x = '</p>'; }".to_owned()),
                Token::EndTag("script".to_owned()),
            ]
        );
    }

    #[test]
    fn test_lone_lt_is_text() {
        assert_eq!(
            tokenize("1 < 2 <3"),
            vec![Token::Text("1 < 2 <3".to_owned())]
        );
    }
}
