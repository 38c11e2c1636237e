//! Pure derivations applied while normalizing remote entries.

use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use url::Url;

/// Deterministic entry id: hex SHA-256 of the remote native id.
pub fn stable_id(remote_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(remote_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Lowercase, hyphen-joined tokens of `text`.
///
/// Any non-alphanumeric character separates tokens, as does a
/// lowercase-to-uppercase transition (`camelCase` -> `camel-case`).
pub fn kebab_case(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

/// Slug for a title, falling back to `fallback` when the title is missing
/// or has no usable characters.
pub fn slug(title: Option<&str>, fallback: &str) -> String {
    let slug = title.map(kebab_case).unwrap_or_default();
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Visible text of an HTML fragment.
pub fn inner_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// Text of the first `<p>` in `html`, or an empty string.
pub fn first_paragraph(html: &str) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .next()
        .map(|p| p.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Scheme and host (plus non-default port) of `link`.
pub fn link_origin(link: &str) -> Option<Url> {
    let url = Url::parse(link)
        .map_err(|e| tracing::debug!("Entry link {} is not a URL: {}", link, e))
        .ok()?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Url::parse(&origin.ascii_serialization()).ok()
}

/// First `<img src>` in `html`, resolved against `origin` when possible.
///
/// Resolution failures fall back to the raw `src` value.
pub fn featured_image(html: &str, origin: Option<&Url>) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    let fragment = Html::parse_fragment(html);
    let src = fragment
        .select(&selector)
        .next()?
        .value()
        .attr("src")?
        .trim();

    if src.is_empty() {
        return None;
    }

    let resolved = match origin {
        Some(base) => base.join(src).map(|u| u.to_string()),
        None => Url::parse(src).map(|u| u.to_string()),
    };

    match resolved {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Could not resolve image src {}: {}", src, e);
            Some(src.to_string())
        }
    }
}
