//! Explicit recipient targeting in message bodies.
//!
//! Channel convention: a leading `@name` or `name:` token addresses the
//! message to `name`. The marker is stripped before the body is learned.

/// Result of addressing parsing: the explicit addressee, if any, and the
/// residual body with the marker token removed and whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    pub addressee: Option<&'a str>,
    pub body: &'a str,
}

/// Extract explicit targeting from the first whitespace-delimited token.
///
/// An empty body, or a body consisting solely of the marker token, is a
/// valid (if content-free) message with an empty residual body.
pub fn parse(body: &str) -> Directive<'_> {
    let body = body.trim();
    let first = body.split_whitespace().next().unwrap_or("");

    let (addressee, rest) = if let Some(name) = first.strip_prefix('@') {
        (Some(name), &body[first.len()..])
    } else if let Some(name) = first.strip_suffix(':') {
        (Some(name), &body[first.len()..])
    } else {
        (None, body)
    };

    Directive {
        addressee,
        body: rest.trim(),
    }
}
