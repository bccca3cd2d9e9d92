//! Whitelisting scanner for the inline markup carried in block text fields.
//!
//! Paragraph and header blocks store their text as constrained HTML (the
//! legacy editor's inline toolbar output). This scanner re-emits only the
//! whitelisted inline tags, keeps the text of everything else, and rebuilds
//! anchors from scratch with a validated `href` — no attribute from the
//! stored markup survives untouched.

use pulldown_cmark_escape::StrWrite;

use crate::safe_href;

/// Inline tags re-emitted as-is (no attributes).
const ALLOWED: &[&str] = &["b", "strong", "i", "em", "u", "s", "code", "mark"];

pub(crate) fn write_inline<W: StrWrite>(writer: &mut W, html: &str) -> Result<(), W::Error> {
    let mut open_stack: Vec<&'static str> = Vec::new();
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        writer.write_str(&rest[..lt])?;
        let after = &rest[lt + 1..];

        // Only `</x` or `<x` with an ASCII-alpha name is markup; a bare `<`
        // (e.g. "5 < 6") is text.
        let looks_like_tag = after
            .strip_prefix('/')
            .unwrap_or(after)
            .starts_with(|c: char| c.is_ascii_alphabetic());
        if !looks_like_tag {
            writer.write_str("&lt;")?;
            rest = after;
            continue;
        }

        let Some(gt) = after.find('>') else {
            writer.write_str("&lt;")?;
            rest = after;
            continue;
        };
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let closing = tag.starts_with('/');
        let body = tag.strip_prefix('/').unwrap_or(tag);
        let name: String = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if closing {
            if let Some(pos) = open_stack.iter().rposition(|open| *open == name) {
                // Close anything the stored markup left open inside.
                while open_stack.len() > pos {
                    let unclosed = open_stack.pop().expect("stack nonempty");
                    write_close(writer, unclosed)?;
                }
            }
            continue;
        }

        if name == "br" {
            writer.write_str("<br>")?;
        } else if name == "a" {
            let href = extract_href(body).map(safe_href).unwrap_or_default();
            writer.write_str("<a href=\"")?;
            pulldown_cmark_escape::escape_href(&mut *writer, href)?;
            writer.write_str("\" target=\"_blank\" rel=\"noopener noreferrer\">")?;
            open_stack.push("a");
        } else if let Some(allowed) = ALLOWED.iter().find(|t| **t == name) {
            writer.write_str("<")?;
            writer.write_str(allowed)?;
            writer.write_str(">")?;
            open_stack.push(allowed);
        }
        // Disallowed tags contribute nothing; their text content flows on.
    }

    writer.write_str(rest)?;
    while let Some(unclosed) = open_stack.pop() {
        write_close(writer, unclosed)?;
    }
    Ok(())
}

fn write_close<W: StrWrite>(writer: &mut W, name: &str) -> Result<(), W::Error> {
    writer.write_str("</")?;
    writer.write_str(name)?;
    writer.write_str(">")
}

/// Pull the quoted `href` value out of an anchor tag body.
fn extract_href(tag_body: &str) -> Option<&str> {
    let lower = tag_body.to_ascii_lowercase();
    let at = lower.find("href")?;
    let after_name = tag_body[at + 4..].trim_start();
    let after_eq = after_name.strip_prefix('=')?.trim_start();
    let quote = after_eq.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &after_eq[1..];
    let end = value.find(quote)?;
    Some(&value[..end])
}
