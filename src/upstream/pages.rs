// HTML page scraping - text of selector matches, one line per element

use crate::cache::Fingerprint;
use crate::config::HtmlSource;
use crate::error::{GatewayError, Result};
use lol_html::{element, rewrite_str, text, RewriteStrSettings, Selector};
use std::cell::RefCell;
use std::rc::Rc;

/// Fingerprint for a page request: the page name plus every query pair.
pub fn page_fingerprint(source: &HtmlSource, query: &[(String, String)]) -> Fingerprint {
    let page = std::iter::once(("@page".to_string(), source.name.clone()));
    Fingerprint::build(page.chain(query.iter().cloned()))
}

/// Extract the text of every element matching `selector`.
///
/// Each match becomes one line with whitespace collapsed; matches with no
/// text are dropped.
pub fn extract_text(html: &str, selector: &str) -> Result<String> {
    // element!/text! unwrap the parsed selector, so reject bad ones first
    selector
        .parse::<Selector>()
        .map_err(|e| GatewayError::Config(format!("invalid selector {:?}: {}", selector, e)))?;

    let blocks: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(selector, {
                    let blocks = Rc::clone(&blocks);
                    move |_el| {
                        blocks.borrow_mut().push(String::new());
                        Ok(())
                    }
                }),
                text!(selector, {
                    let blocks = Rc::clone(&blocks);
                    move |chunk| {
                        if let Some(current) = blocks.borrow_mut().last_mut() {
                            current.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| GatewayError::Parse(format!("html: {}", e)))?;

    let lines: Vec<String> = blocks
        .borrow()
        .iter()
        .map(|block| normalize_ws(&decode_entities(block)))
        .filter(|line| !line.is_empty())
        .collect();

    Ok(lines.join("\n"))
}

/// Decode common named entities plus any decimal or hex character reference.
/// Unknown or malformed references are kept verbatim.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "nbsp" => Some(' '),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => None,
    }
}

/// Collapse runs of whitespace into a single space and trim.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
