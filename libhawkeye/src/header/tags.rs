use crate::record::{fields::TAG_PHRASES, FieldId};

/// Maps a field tag from a contents header onto the [`FieldId`] it fills
///
/// Tags are matched by substring against the known tag phrases, so decorated tags such as
/// `"Depth (m)"` still bind. Longer phrases are tried before the phrases they contain.
/// Returns [`None`] for a tag no phrase matches.
#[must_use]
pub fn resolve(tag: &str) -> Option<FieldId> {
    let tag = tag.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    TAG_PHRASES
        .iter()
        .find(|(phrase, _)| tag.contains(phrase))
        .map(|(_, field)| *field)
}
