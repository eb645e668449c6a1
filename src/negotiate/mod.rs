//! Content negotiation — select a decoder for inbound bytes and an encoder
//! plus charset for outbound bytes.
//!
//! The two entry points are [`select_decoder`] and [`select_encoder`]. Both
//! are pure functions over declared capability lists: they hold no state, are
//! idempotent, and are safe to call concurrently without synchronization.
//! Candidates are identified by index into the caller's ordered sequence, so
//! the algorithms stay independent of any particular codec representation.

use std::fmt;

pub mod media;

pub use media::{
    AcceptEntry, AcceptSpec, CharsetEntry, CharsetSpec, ContentType, ContentTypeRange,
    DEFAULT_CHARSET, MediaTypeError, WILDCARD,
};

/// A structured, non-fatal reason a handler declined to produce a response.
///
/// Rejections are ordinary values, never panics: they travel back through the
/// dispatch fold, are deduplicated into a set, and are surfaced to the client
/// only when no handler ultimately produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The handler needed a request body and none was supplied.
    EntityExpected,
    /// No decoder matched the request's `Content-Type`. Carries the union of
    /// the ranges the candidate decoders would have accepted, in the order
    /// they were encountered.
    UnsupportedRequestContentType(Vec<ContentTypeRange>),
    /// No encoder/charset combination satisfied `Accept`/`Accept-Charset`.
    /// Carries every content type the candidate encoders can produce, in
    /// declaration order.
    UnacceptedResponseContentType(Vec<ContentType>),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityExpected => f.write_str("request entity expected but not supplied"),
            Self::UnsupportedRequestContentType(ranges) => {
                write!(f, "unsupported request content type; accepted: {}", join(ranges))
            }
            Self::UnacceptedResponseContentType(types) => {
                write!(f, "unaccepted response content type; producible: {}", join(types))
            }
        }
    }
}

pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The outcome of [`select_encoder`]: which marshaller won, which of its
/// declared content types was chosen, and that content type with its charset
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSelection {
    /// Index of the winning marshaller in the caller's sequence.
    pub marshaller: usize,
    /// Index of the chosen content type within that marshaller's declarations.
    pub variant: usize,
    /// The chosen content type, always carrying an explicit charset.
    pub content_type: ContentType,
}

/// Selects the decoder for a request body with the given `Content-Type`.
///
/// `unmarshallers` is an ordered sequence of capability lists, one per
/// candidate decoder, each a non-empty ordered sequence of acceptable ranges.
/// The first decoder with any matching range wins; within a decoder, ranges
/// are tried in declaration order.
///
/// # Errors
///
/// When nothing matches, returns
/// [`Rejection::UnsupportedRequestContentType`] carrying the deduplicated
/// union of every candidate's acceptable ranges, in encountered order — this
/// is exactly what callers report back to the client.
///
/// A missing body is not this function's concern; callers must check for one
/// first and fail with [`Rejection::EntityExpected`] instead.
pub fn select_decoder(
    content_type: &ContentType,
    unmarshallers: &[&[ContentTypeRange]],
) -> Result<usize, Rejection> {
    for (index, ranges) in unmarshallers.iter().enumerate() {
        if ranges.iter().any(|range| range.matches(content_type)) {
            return Ok(index);
        }
    }

    let mut acceptable: Vec<ContentTypeRange> = Vec::new();
    for ranges in unmarshallers {
        for range in *ranges {
            if !acceptable.contains(range) {
                acceptable.push(range.clone());
            }
        }
    }
    Err(Rejection::UnsupportedRequestContentType(acceptable))
}

/// Selects the encoder and concrete content type for a response, honoring the
/// client's `Accept` and `Accept-Charset` preferences.
///
/// `marshallers` is an ordered sequence of capability lists, one per
/// candidate encoder, each a non-empty ordered sequence of producible content
/// types. Every (marshaller, content type) pair is scored as the product of
/// its media quality (per [`AcceptSpec::media_quality`]) and its charset
/// quality; the highest score wins, with ties broken by marshaller
/// declaration order and then content type declaration order.
///
/// A producible type without an explicit charset has one resolved for it:
/// [`DEFAULT_CHARSET`] when `Accept-Charset` is absent, otherwise the
/// client's preferred charset. The returned content type therefore always
/// carries an explicit charset.
///
/// # Errors
///
/// When no pair scores above zero, returns
/// [`Rejection::UnacceptedResponseContentType`] carrying every producible
/// content type across all marshallers in declaration order.
pub fn select_encoder(
    accept: &AcceptSpec,
    accept_charset: &CharsetSpec,
    marshallers: &[&[ContentType]],
) -> Result<EncoderSelection, Rejection> {
    let mut best: Option<(f32, EncoderSelection)> = None;

    for (mi, types) in marshallers.iter().enumerate() {
        for (vi, produced) in types.iter().enumerate() {
            let media_quality = accept.media_quality(produced);
            if media_quality <= 0.0 {
                continue;
            }

            let (resolved, charset_quality) = match produced.charset() {
                Some(cs) => {
                    let q = accept_charset.quality(cs);
                    if q <= 0.0 {
                        continue;
                    }
                    (produced.clone(), q)
                }
                None if accept_charset.is_empty() => {
                    (produced.charset_resolved(DEFAULT_CHARSET), 1.0)
                }
                None => match accept_charset.preferred() {
                    Some((cs, q)) => (produced.charset_resolved(cs), q),
                    None => continue,
                },
            };

            let combined = media_quality * charset_quality;
            // Strictly-greater keeps earlier declarations on ties.
            if best.as_ref().is_none_or(|(q, _)| combined > *q) {
                best = Some((
                    combined,
                    EncoderSelection {
                        marshaller: mi,
                        variant: vi,
                        content_type: resolved,
                    },
                ));
            }
        }
    }

    match best {
        Some((_, selection)) => Ok(selection),
        None => {
            let mut producible: Vec<ContentType> = Vec::new();
            for types in marshallers {
                for produced in *types {
                    if !producible.contains(produced) {
                        producible.push(produced.clone());
                    }
                }
            }
            Err(Rejection::UnacceptedResponseContentType(producible))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml() -> ContentType {
        ContentType::new("text", "xml")
    }

    fn xml_utf8() -> ContentType {
        ContentType::with_charset("text", "xml", "UTF-8")
    }

    // ── select_decoder ────────────────────────────────────────────────────────

    #[test]
    fn decoder_first_matching_candidate_wins() {
        let first = [ContentTypeRange::new("application", "json")];
        let second = [ContentTypeRange::new("text", "xml")];
        let third = [ContentTypeRange::any()];

        let chosen = select_decoder(&xml(), &[&first, &second, &third]).unwrap();
        assert_eq!(chosen, 1);
    }

    #[test]
    fn decoder_wildcard_candidate_matches_anything() {
        let ranges = [ContentTypeRange::any()];
        assert_eq!(select_decoder(&ContentType::new("image", "png"), &[&ranges]), Ok(0));
    }

    #[test]
    fn decoder_charset_mismatch_rejects_with_declared_ranges() {
        // The only decoder insists on ISO-8859-2 but the body is UTF-8.
        let ranges = [ContentTypeRange::with_charset("text", "xml", "ISO-8859-2")];
        let rejection = select_decoder(&xml_utf8(), &[&ranges]).unwrap_err();
        assert_eq!(
            rejection,
            Rejection::UnsupportedRequestContentType(vec![ContentTypeRange::with_charset(
                "text",
                "xml",
                "ISO-8859-2"
            )])
        );
    }

    #[test]
    fn decoder_rejection_unions_ranges_in_order_without_duplicates() {
        let a = [
            ContentTypeRange::new("application", "json"),
            ContentTypeRange::new("text", "csv"),
        ];
        let b = [
            ContentTypeRange::new("text", "csv"),
            ContentTypeRange::new("application", "xml"),
        ];
        let rejection = select_decoder(&xml(), &[&a, &b]).unwrap_err();
        assert_eq!(
            rejection,
            Rejection::UnsupportedRequestContentType(vec![
                ContentTypeRange::new("application", "json"),
                ContentTypeRange::new("text", "csv"),
                ContentTypeRange::new("application", "xml"),
            ])
        );
    }

    #[test]
    fn decoder_is_idempotent() {
        let ranges = [ContentTypeRange::new("text", "*")];
        let candidates: [&[ContentTypeRange]; 1] = [&ranges];
        assert_eq!(
            select_decoder(&xml(), &candidates),
            select_decoder(&xml(), &candidates)
        );
    }

    // ── select_encoder ────────────────────────────────────────────────────────

    #[test]
    fn encoder_empty_accept_takes_first_declaration_with_default_charset() {
        let first = [xml()];
        let second = [ContentType::new("application", "json")];
        let selection = select_encoder(
            &AcceptSpec::default(),
            &CharsetSpec::default(),
            &[&first, &second],
        )
        .unwrap();
        assert_eq!(selection.marshaller, 0);
        assert_eq!(selection.variant, 0);
        assert_eq!(selection.content_type.charset(), Some(DEFAULT_CHARSET));
    }

    #[test]
    fn encoder_explicit_charset_is_kept() {
        let types = [xml_utf8()];
        let selection = select_encoder(
            &AcceptSpec::parse("text/xml"),
            &CharsetSpec::default(),
            &[&types],
        )
        .unwrap();
        assert_eq!(selection.content_type, xml_utf8());
    }

    #[test]
    fn encoder_quality_outranks_declaration_order() {
        let first = [ContentType::new("text", "plain")];
        let second = [xml()];
        let accept = AcceptSpec::parse("text/plain;q=0.4, text/xml;q=0.9");
        let selection =
            select_encoder(&accept, &CharsetSpec::default(), &[&first, &second]).unwrap();
        assert_eq!(selection.marshaller, 1);
    }

    #[test]
    fn encoder_ties_go_to_earlier_declaration() {
        let first = [ContentType::new("text", "plain"), xml()];
        let second = [xml()];
        let accept = AcceptSpec::parse("text/*");
        let selection =
            select_encoder(&accept, &CharsetSpec::default(), &[&first, &second]).unwrap();
        assert_eq!((selection.marshaller, selection.variant), (0, 0));
    }

    #[test]
    fn encoder_charset_preference_scales_score() {
        // Same media quality; the client prefers UTF-8, so the UTF-8 variant
        // must win even though it is declared later.
        let types = [
            ContentType::with_charset("text", "xml", "ISO-8859-1"),
            xml_utf8(),
        ];
        let selection = select_encoder(
            &AcceptSpec::parse("text/xml"),
            &CharsetSpec::parse("iso-8859-1;q=0.2, utf-8;q=0.9"),
            &[&types],
        )
        .unwrap();
        assert_eq!(selection.variant, 1);
    }

    #[test]
    fn encoder_unspecified_charset_resolves_to_client_preference() {
        let types = [xml()];
        let selection = select_encoder(
            &AcceptSpec::parse("text/xml"),
            &CharsetSpec::parse("utf-8"),
            &[&types],
        )
        .unwrap();
        assert_eq!(selection.content_type.charset(), Some("UTF-8"));
    }

    #[test]
    fn encoder_unacceptable_charset_rejects_with_producible_types() {
        // Client only accepts UTF-16; the only encoder produces UTF-8.
        let types = [xml_utf8()];
        let rejection = select_encoder(
            &AcceptSpec::parse("text/xml"),
            &CharsetSpec::parse("utf-16"),
            &[&types],
        )
        .unwrap_err();
        assert_eq!(
            rejection,
            Rejection::UnacceptedResponseContentType(vec![xml_utf8()])
        );
    }

    #[test]
    fn encoder_unmatched_media_type_rejects() {
        let types = [ContentType::new("application", "json")];
        let rejection = select_encoder(
            &AcceptSpec::parse("text/xml"),
            &CharsetSpec::default(),
            &[&types],
        )
        .unwrap_err();
        assert_eq!(
            rejection,
            Rejection::UnacceptedResponseContentType(vec![ContentType::new(
                "application",
                "json"
            )])
        );
    }

    #[test]
    fn encoder_is_idempotent() {
        let types = [xml(), ContentType::new("text", "plain")];
        let candidates: [&[ContentType]; 1] = [&types];
        let accept = AcceptSpec::parse("text/*;q=0.5");
        let charsets = CharsetSpec::parse("utf-8");
        assert_eq!(
            select_encoder(&accept, &charsets, &candidates),
            select_encoder(&accept, &charsets, &candidates)
        );
    }
}
