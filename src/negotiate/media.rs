//! Media type records used by content negotiation.
//!
//! These are plain structured values: [`ContentType`] describes the concrete
//! representation attached to an actual body, [`ContentTypeRange`] describes a
//! possibly-wildcarded set of acceptable representations, and [`AcceptSpec`] /
//! [`CharsetSpec`] hold the parsed, quality-weighted preferences of a client's
//! `Accept` and `Accept-Charset` headers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The charset assumed when neither the client nor the marshaller names one.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// Wildcard token in media ranges and charset specs.
pub const WILDCARD: &str = "*";

/// Error produced when a media type string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid media type: {input}")]
pub struct MediaTypeError {
    input: String,
}

/// A concrete (media-type, subtype, optional charset) triple.
///
/// Media type and subtype are normalized to lowercase, the charset to
/// uppercase, so equality and hashing are case-insensitive with respect to
/// the wire form.
///
/// # Examples
///
/// ```
/// use manifold::negotiate::ContentType;
///
/// let ct: ContentType = "Text/XML; charset=utf-8".parse().unwrap();
/// assert_eq!(ct.to_string(), "text/xml; charset=UTF-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
    media_type: String,
    subtype: String,
    charset: Option<String>,
}

impl ContentType {
    /// Creates a content type without a charset.
    pub fn new(media_type: impl AsRef<str>, subtype: impl AsRef<str>) -> Self {
        Self {
            media_type: media_type.as_ref().to_ascii_lowercase(),
            subtype: subtype.as_ref().to_ascii_lowercase(),
            charset: None,
        }
    }

    /// Creates a content type with an explicit charset.
    pub fn with_charset(
        media_type: impl AsRef<str>,
        subtype: impl AsRef<str>,
        charset: impl AsRef<str>,
    ) -> Self {
        Self {
            charset: Some(charset.as_ref().to_ascii_uppercase()),
            ..Self::new(media_type, subtype)
        }
    }

    /// Returns a copy of this content type with the given charset filled in.
    pub fn charset_resolved(&self, charset: &str) -> Self {
        Self {
            media_type: self.media_type.clone(),
            subtype: self.subtype.clone(),
            charset: Some(charset.to_ascii_uppercase()),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Returns the charset, if one is declared.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        if let Some(cs) = &self.charset {
            write!(f, "; charset={cs}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media_type, subtype, charset) = split_media_type(s).ok_or(MediaTypeError {
            input: s.to_owned(),
        })?;
        match charset {
            Some(cs) => Ok(Self::with_charset(media_type, subtype, cs)),
            None => Ok(Self::new(media_type, subtype)),
        }
    }
}

/// A possibly-wildcarded (media-type, subtype, charset) descriptor of
/// acceptable content.
///
/// `*` is allowed for the media type (which implies any subtype) and for the
/// subtype. An absent charset means "don't care"; a `*` charset is
/// equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentTypeRange {
    media_type: String,
    subtype: String,
    charset: Option<String>,
}

impl ContentTypeRange {
    /// Creates a range matching any charset.
    pub fn new(media_type: impl AsRef<str>, subtype: impl AsRef<str>) -> Self {
        Self {
            media_type: media_type.as_ref().to_ascii_lowercase(),
            subtype: subtype.as_ref().to_ascii_lowercase(),
            charset: None,
        }
    }

    /// Creates a range constrained to a specific charset.
    pub fn with_charset(
        media_type: impl AsRef<str>,
        subtype: impl AsRef<str>,
        charset: impl AsRef<str>,
    ) -> Self {
        Self {
            charset: Some(charset.as_ref().to_ascii_uppercase()),
            ..Self::new(media_type, subtype)
        }
    }

    /// The `*/*` range.
    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Component-wise equality-or-wildcard match against a concrete
    /// [`ContentType`].
    ///
    /// The charset matches when the range leaves it unspecified, declares the
    /// wildcard, or names exactly the charset carried by `content_type`. A
    /// range that names a charset does not match a content type that carries
    /// none.
    pub fn matches(&self, content_type: &ContentType) -> bool {
        let media_ok = self.media_type == WILDCARD || self.media_type == content_type.media_type;
        let subtype_ok = self.subtype == WILDCARD || self.subtype == content_type.subtype;
        let charset_ok = match self.charset.as_deref() {
            None => true,
            Some(WILDCARD) => true,
            Some(cs) => content_type.charset.as_deref() == Some(cs),
        };
        media_ok && subtype_ok && charset_ok
    }
}

impl fmt::Display for ContentTypeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        if let Some(cs) = &self.charset {
            write!(f, "; charset={cs}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentTypeRange {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media_type, subtype, charset) = split_media_type(s).ok_or(MediaTypeError {
            input: s.to_owned(),
        })?;
        match charset {
            Some(cs) => Ok(Self::with_charset(media_type, subtype, cs)),
            None => Ok(Self::new(media_type, subtype)),
        }
    }
}

// Splits "type/subtype; charset=CS; ..." into its components. A lone "*"
// is accepted as shorthand for "*/*".
fn split_media_type(s: &str) -> Option<(&str, &str, Option<&str>)> {
    let mut parts = s.split(';').map(str::trim);
    let type_part = parts.next()?;

    let (media_type, subtype) = if type_part == WILDCARD {
        (WILDCARD, WILDCARD)
    } else {
        let (m, sub) = type_part.split_once('/')?;
        if m.is_empty() || sub.is_empty() {
            return None;
        }
        (m, sub)
    };

    let charset = parts.find_map(|p| {
        let (key, value) = p.split_once('=')?;
        key.trim().eq_ignore_ascii_case("charset").then(|| value.trim())
    });

    Some((media_type, subtype, charset))
}

// Extracts the q parameter from the parameter list of one header entry,
// defaulting to 1.0 and clamping into [0, 1].
fn parse_quality<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    for p in params {
        if let Some((key, value)) = p.split_once('=') {
            if key.trim().eq_ignore_ascii_case("q") {
                return value.trim().parse::<f32>().map_or(1.0, |q| q.clamp(0.0, 1.0));
            }
        }
    }
    1.0
}

/// One parsed `Accept` entry: a range plus its quality weight.
#[derive(Debug, Clone)]
pub struct AcceptEntry {
    pub range: ContentTypeRange,
    pub quality: f32,
}

/// The ordered, quality-weighted media ranges of an `Accept` header.
///
/// An empty spec means "anything is acceptable".
#[derive(Debug, Clone, Default)]
pub struct AcceptSpec {
    entries: Vec<AcceptEntry>,
}

impl AcceptSpec {
    /// Leniently parses a comma-separated `Accept` header value.
    ///
    /// Entries that do not form a media range are skipped; a missing or
    /// malformed `q` parameter defaults to 1.0.
    pub fn parse(header: &str) -> Self {
        let entries = header
            .split(',')
            .filter_map(|entry| {
                let entry = entry.trim();
                if entry.is_empty() {
                    return None;
                }
                let range: ContentTypeRange = entry.parse().ok()?;
                let quality = parse_quality(entry.split(';').skip(1).map(str::trim));
                Some(AcceptEntry { range, quality })
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AcceptEntry] {
        &self.entries
    }

    /// Quality weight the client assigns to the media type and subtype of
    /// `content_type`, ignoring charsets.
    ///
    /// The most specific matching entry decides (exact beats `type/*` beats
    /// `*/*`); among equally specific entries the highest quality applies.
    /// Returns 1.0 for an empty spec and 0.0 when nothing matches.
    pub fn media_quality(&self, content_type: &ContentType) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }

        let mut best: Option<(u8, f32)> = None;
        for entry in &self.entries {
            let range = &entry.range;
            let specificity = if range.media_type() == WILDCARD {
                0
            } else if range.media_type() != content_type.media_type() {
                continue;
            } else if range.subtype() == WILDCARD {
                1
            } else if range.subtype() == content_type.subtype() {
                2
            } else {
                continue;
            };

            let better = match best {
                None => true,
                Some((s, q)) => specificity > s || (specificity == s && entry.quality > q),
            };
            if better {
                best = Some((specificity, entry.quality));
            }
        }

        best.map_or(0.0, |(_, q)| q)
    }
}

/// One parsed `Accept-Charset` entry.
#[derive(Debug, Clone)]
pub struct CharsetEntry {
    pub charset: String,
    pub quality: f32,
}

/// The ordered, quality-weighted charsets of an `Accept-Charset` header.
///
/// An empty spec means any charset is acceptable, with [`DEFAULT_CHARSET`]
/// preferred when the marshaller leaves the charset open.
#[derive(Debug, Clone, Default)]
pub struct CharsetSpec {
    entries: Vec<CharsetEntry>,
}

impl CharsetSpec {
    /// Leniently parses a comma-separated `Accept-Charset` header value.
    pub fn parse(header: &str) -> Self {
        let entries = header
            .split(',')
            .filter_map(|entry| {
                let entry = entry.trim();
                let name = entry.split(';').next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let quality = parse_quality(entry.split(';').skip(1).map(str::trim));
                Some(CharsetEntry {
                    charset: name.to_ascii_uppercase(),
                    quality,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CharsetEntry] {
        &self.entries
    }

    /// Quality weight the client assigns to `charset`. An exact entry beats
    /// the wildcard; an empty spec accepts everything at 1.0.
    pub fn quality(&self, charset: &str) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }

        let mut best: Option<(u8, f32)> = None;
        for entry in &self.entries {
            let specificity = if entry.charset == WILDCARD {
                0
            } else if entry.charset.eq_ignore_ascii_case(charset) {
                1
            } else {
                continue;
            };
            let better = match best {
                None => true,
                Some((s, q)) => specificity > s || (specificity == s && entry.quality > q),
            };
            if better {
                best = Some((specificity, entry.quality));
            }
        }

        best.map_or(0.0, |(_, q)| q)
    }

    /// The charset to fill in when the marshaller leaves it unspecified:
    /// the highest-quality accepted charset, the wildcard resolving to
    /// [`DEFAULT_CHARSET`]. `None` when every entry has quality zero.
    pub fn preferred(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for entry in &self.entries {
            if entry.quality <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, q)| entry.quality > q) {
                best = Some((&entry.charset, entry.quality));
            }
        }
        best.map(|(cs, q)| if cs == WILDCARD { (DEFAULT_CHARSET, q) } else { (cs, q) })
    }
}
