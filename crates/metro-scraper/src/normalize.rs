//! Text clean-up applied to raw card fields.

/// Thousands separator used in rendered ruble prices (`"1 299"`).
pub const PRICE_GROUP_SEPARATOR: char = '\u{a0}';

/// Strips the non-breaking-space thousands separator and surrounding
/// whitespace from a rendered price: `"1\u{a0}299"` becomes `"1299"`.
#[must_use]
pub fn normalize_price(raw: &str) -> String {
    raw.replace(PRICE_GROUP_SEPARATOR, "").trim().to_string()
}

/// Joins the site base URL and a card's relative href byte-for-byte.
///
/// No URL normalization happens: `"https://a.ru/" + "/p/1"` yields a double
/// slash, which the site tolerates.
#[must_use]
pub fn build_link(site_url: &str, href: &str) -> String {
    let mut link = String::with_capacity(site_url.len() + href.len());
    link.push_str(site_url);
    link.push_str(href);
    link
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
