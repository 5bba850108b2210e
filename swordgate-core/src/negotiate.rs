use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::SwordError;

/// A quality value usable as an ordered map key.
///
/// `f32` is not `Ord`; this wrapper supplies a total order via
/// [`f32::total_cmp`]. Negotiation only ever produces finite values in
/// `(0.0, 1.0]`, where `total_cmp` agrees with the usual comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// The raw quality value.
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Eq for Quality {}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered preference structure produced by [`parse_accept`].
///
/// Maps a quality value to the set of content types the client listed at
/// that quality. Entries sharing an exact quality accumulate in the same
/// tier with no further ordering guarantee among them. Built fresh per
/// negotiation call; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityMap {
    tiers: BTreeMap<Quality, Vec<String>>,
}

impl QualityMap {
    fn insert(&mut self, quality: f32, content_type: String) {
        self.tiers
            .entry(Quality(quality))
            .or_default()
            .push(content_type);
    }

    /// Iterates quality tiers from most to least preferred.
    pub fn descending(&self) -> impl Iterator<Item = (f32, &[String])> {
        self.tiers
            .iter()
            .rev()
            .map(|(quality, types)| (quality.0, types.as_slice()))
    }

    /// The content types in the most preferred tier.
    pub fn best(&self) -> Option<&[String]> {
        self.tiers
            .last_key_value()
            .map(|(_, types)| types.as_slice())
    }

    /// Picks the highest-quality content type that the caller can also
    /// produce, comparing on the media-type token (parameters ignored).
    pub fn preferred<'a>(&self, available: &[&'a str]) -> Option<&'a str> {
        for (_, types) in self.descending() {
            for content_type in types {
                let token = match content_type.split_once(';') {
                    Some((token, _)) => token,
                    None => content_type.as_str(),
                };
                if let Some(found) = available.iter().find(|a| a.eq_ignore_ascii_case(token)) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Number of distinct quality tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the map holds no tiers at all.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// How one `Accept` entry declared its preference weight.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EntryQuality {
    /// The entry carried an explicit `q=` parameter.
    Explicit(f32),
    /// No `q=` parameter; `position` is the 1-based index of the entry in
    /// the header, so that earlier entries can later be given a higher
    /// inferred quality than later ones.
    Implicit { position: usize },
}

/// One parsed `Accept` entry before quality resolution.
#[derive(Debug, Clone, PartialEq)]
struct AcceptEntry {
    content_type: String,
    params: Option<String>,
    quality: EntryQuality,
}

/// Analyses an `Accept`-style header into an ordered [`QualityMap`].
///
/// An absent header yields `Ok(None)`: the client expressed no
/// preference, which is not an error. An empty header is still one
/// (empty-type) entry and produces a map rather than failing.
///
/// Each comma-separated entry takes one of four shapes: `type`,
/// `type;q`, `type;params` or `type;params;q`. Entries with an explicit
/// `q=` are placed at exactly that quality. Entries without one are
/// spread across the open interval below the lowest explicitly declared
/// quality (below 1.0 when none was declared), preserving their original
/// relative order — earlier entries come out more preferred.
///
/// # Errors
///
/// Returns [`SwordError::Malformed`] when a quality value does not parse
/// as a number or lies outside `0.0..=1.0`.
pub fn parse_accept(header: Option<&str>) -> Result<Option<QualityMap>, SwordError> {
    let Some(header) = header else {
        return Ok(None);
    };

    // Phase 1: classify every entry, tracking the lowest explicit quality
    // seen so the implicit entries can be slotted in beneath it.
    let mut entries = Vec::new();
    let mut lowest_explicit: Option<f32> = None;

    for (index, part) in header.split(',').enumerate() {
        let components: Vec<&str> = part.split(';').collect();
        let content_type = components[0].trim().to_string();

        let mut params = None;
        let mut quality = EntryQuality::Implicit {
            position: index + 1,
        };

        match components.len() {
            1 => {}
            2 => {
                // "type;q" or "type;params"
                let second = components[1].trim();
                if let Some(raw) = second.strip_prefix("q=") {
                    quality = EntryQuality::Explicit(parse_quality(raw)?);
                } else {
                    params = Some(second.to_string());
                }
            }
            _ => {
                // "type;params;q" — the third component is authoritative
                // for the quality.
                params = Some(components[1].trim().to_string());
                let third = components[2].trim();
                let raw = third.strip_prefix("q=").unwrap_or(third);
                quality = EntryQuality::Explicit(parse_quality(raw)?);
            }
        }

        if let EntryQuality::Explicit(q) = quality {
            lowest_explicit = Some(lowest_explicit.map_or(q, |lowest| lowest.min(q)));
        }

        entries.push(AcceptEntry {
            content_type,
            params,
            quality,
        });
    }

    // Phase 2: build the ordered map in one pass over the classified
    // entries. Implicit entries land strictly inside (0, ceiling), where
    // the ceiling is the lowest explicit quality (1.0 when none was
    // declared), descending with their position in the header.
    let ceiling = lowest_explicit.unwrap_or(1.0);
    let total = entries.len();

    let mut map = QualityMap::default();
    for entry in entries {
        let content_type = match entry.params {
            Some(params) => format!("{};{}", entry.content_type, params),
            None => entry.content_type,
        };
        let quality = match entry.quality {
            EntryQuality::Explicit(q) => q,
            EntryQuality::Implicit { position } => {
                implicit_quality(position, total, ceiling)
            }
        };
        map.insert(quality, content_type);
    }

    Ok(Some(map))
}

/// Inferred quality for the entry at 1-based `position` out of `total`
/// entries, spread across the open interval `(0, ceiling)` so that
/// earlier entries score higher.
#[allow(clippy::cast_precision_loss)] // header entry counts are tiny
fn implicit_quality(position: usize, total: usize, ceiling: f32) -> f32 {
    ceiling * ((total - position + 1) as f32) / ((total + 1) as f32)
}

fn parse_quality(raw: &str) -> Result<f32, SwordError> {
    let quality: f32 = raw
        .parse()
        .map_err(|_| SwordError::Malformed(format!("quality value is not a number: {raw:?}")))?;
    if !(0.0..=1.0).contains(&quality) {
        return Err(SwordError::Malformed(format!(
            "quality value out of range: {raw:?}"
        )));
    }
    Ok(quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(header: &str) -> QualityMap {
        parse_accept(Some(header))
            .expect("header should parse")
            .expect("map should be present")
    }

    /// Returns the quality assigned to `content_type`, panicking if absent.
    fn quality_of(map: &QualityMap, content_type: &str) -> f32 {
        map.descending()
            .find_map(|(q, types)| types.iter().any(|t| t == content_type).then_some(q))
            .unwrap_or_else(|| panic!("{content_type} not present in map"))
    }

    /// Given explicit qualities, when iterated descending, then the higher-q type comes first.
    #[test]
    fn given_explicit_qualities_when_sorted_then_descends_by_q() {
        let map = parse("a/b;q=0.5,c/d;q=0.9");
        let tiers: Vec<(f32, Vec<String>)> = map
            .descending()
            .map(|(q, types)| (q, types.to_vec()))
            .collect();
        assert_eq!(tiers[0], (0.9, vec!["c/d".to_string()]));
        assert_eq!(tiers[1], (0.5, vec!["a/b".to_string()]));
    }

    /// Given no explicit qualities, when analysed, then inferred qualities strictly decrease in original order and lie in (0, 1).
    #[test]
    fn given_all_implicit_when_analysed_then_strictly_decreasing_in_order() {
        let map = parse("a/b,c/d,e/f");
        let (a, c, e) = (
            quality_of(&map, "a/b"),
            quality_of(&map, "c/d"),
            quality_of(&map, "e/f"),
        );
        assert!(a > c && c > e, "expected a/b > c/d > e/f, got {a} {c} {e}");
        for q in [a, c, e] {
            assert!(q > 0.0 && q < 1.0, "inferred quality {q} outside (0, 1)");
        }
    }

    /// Given a mix of q=1.0 and an implicit entry, when analysed, then the implicit quality stays strictly below 1.0.
    #[test]
    fn given_explicit_top_quality_when_mixed_then_implicit_below_one() {
        let map = parse("a/b;q=1.0,c/d");
        assert!(quality_of(&map, "c/d") < 1.0);
        assert_eq!(quality_of(&map, "a/b"), 1.0);
    }

    /// Given an absent header, when analysed, then no preference structure is returned.
    #[test]
    fn given_absent_header_when_analysed_then_none() {
        assert!(parse_accept(None).unwrap().is_none());
    }

    /// Given an empty header, when analysed, then a map with one (empty-type) entry is produced without error.
    #[test]
    fn given_empty_header_when_analysed_then_single_empty_entry() {
        let map = parse("");
        assert_eq!(map.len(), 1);
        let best = map.best().unwrap();
        assert_eq!(best, &["".to_string()]);
    }

    /// Given a type with parameters but no q, when analysed, then the parameters stay folded into the content type.
    #[test]
    fn given_params_without_q_when_analysed_then_params_folded_in() {
        let map = parse("text/html;level=1,text/plain");
        assert!(quality_of(&map, "text/html;level=1") > quality_of(&map, "text/plain"));
    }

    /// Given a three-component entry, when analysed, then the third component is authoritative for the quality.
    #[test]
    fn given_three_components_when_analysed_then_third_component_sets_quality() {
        let map = parse("application/atom+xml;type=entry;q=0.8");
        assert_eq!(quality_of(&map, "application/atom+xml;type=entry"), 0.8);
    }

    /// Given a non-numeric quality value, when analysed, then the whole parse fails as malformed.
    #[test]
    fn given_unparsable_quality_when_analysed_then_malformed() {
        let err = parse_accept(Some("a/b;q=high")).unwrap_err();
        assert!(matches!(err, SwordError::Malformed(_)));
    }

    /// Given a quality value outside 0..=1, when analysed, then the parse fails as malformed.
    #[test]
    fn given_out_of_range_quality_when_analysed_then_malformed() {
        let err = parse_accept(Some("a/b;q=1.5")).unwrap_err();
        assert!(matches!(err, SwordError::Malformed(_)));
    }

    /// Given two entries sharing one explicit quality, when analysed, then they accumulate in the same tier.
    #[test]
    fn given_shared_quality_when_analysed_then_types_accumulate_in_one_tier() {
        let map = parse("a/b;q=0.5,c/d;q=0.5");
        assert_eq!(map.len(), 1);
        let best = map.best().unwrap();
        assert_eq!(best.len(), 2);
        assert!(best.contains(&"a/b".to_string()));
        assert!(best.contains(&"c/d".to_string()));
    }

    /// Given implicit entries below an explicit quality, when analysed, then they slot in beneath the lowest explicit value.
    #[test]
    fn given_implicit_entries_when_explicit_present_then_slotted_below_it() {
        let map = parse("a/b;q=0.5,c/d,e/f");
        let ceiling = quality_of(&map, "a/b");
        let (c, e) = (quality_of(&map, "c/d"), quality_of(&map, "e/f"));
        assert!(c < ceiling && e < c);
        assert!(e > 0.0);
    }

    /// Given a preference map and a set of producible types, when choosing, then the highest-quality producible type wins.
    #[test]
    fn given_producible_types_when_choosing_then_highest_quality_match_wins() {
        let map = parse("application/atom+xml;type=feed;q=0.9,application/zip;q=0.4,text/html");
        // text/html is implicit and slots below 0.4, so the explicit
        // feed type wins among what we can produce.
        let choice = map.preferred(&["application/zip", "application/atom+xml"]);
        assert_eq!(choice, Some("application/atom+xml"));

        let choice = map.preferred(&["application/zip"]);
        assert_eq!(choice, Some("application/zip"));

        assert_eq!(map.preferred(&["image/png"]), None);
    }

    /// Given surrounding whitespace in entries, when analysed, then tokens are trimmed.
    #[test]
    fn given_padded_entries_when_analysed_then_tokens_trimmed() {
        let map = parse(" a/b ; q=0.3 , c/d ");
        assert_eq!(quality_of(&map, "a/b"), 0.3);
        assert!(quality_of(&map, "c/d") < 0.3);
    }
}
