//! Header-to-field similarity scoring.
//!
//! # Algorithm
//!
//! 1. Normalize both strings: lowercase, drop `_`, `-` and spaces.
//! 2. Empty after normalization → `0.0`.
//! 3. Identical → `1.0`.
//! 4. Both longer than 3 characters and one contains the other →
//!    [`CONTAINMENT_SCORE`] (an abbreviation embedded in a fuller name).
//! 5. Otherwise `1 - levenshtein / max_len`.
//!
//! The score is symmetric and bounded to `[0.0, 1.0]`.
//!
//! ```rust
//! use marine_ingest_core::similarity::score;
//!
//! assert_eq!(score("Scientific Name", "scientific_name"), 1.0);
//! assert_eq!(score("decimalLatitude", "latitude"), 0.85);
//! ```

/// Fixed score for substring containment, deliberately below an exact match.
pub const CONTAINMENT_SCORE: f64 = 0.85;

/// Minimum normalized length (exclusive) for the containment rule.
const MIN_CONTAINMENT_LEN: usize = 3;

/// Lowercase and strip separator characters.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Closeness of `source_header` to `canonical_field` in `[0.0, 1.0]`.
pub fn score(source_header: &str, canonical_field: &str) -> f64 {
    let a = normalize(source_header);
    let b = normalize(canonical_field);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();

    if len_a > MIN_CONTAINMENT_LEN
        && len_b > MIN_CONTAINMENT_LEN
        && (a.contains(&b) || b.contains(&a))
    {
        return CONTAINMENT_SCORE;
    }

    let distance = strsim::levenshtein(&a, &b);
    1.0 - distance as f64 / len_a.max(len_b) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "sci_name",
        "scientific_name",
        "VERN_NAME",
        "vernacularname",
        "lat",
        "decimalLatitude",
        "temp (c)",
        "temperature_c",
        "ph",
        "pH",
        "",
        "__",
        "Ring-Count",
    ];

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Decimal_Latitude"), "decimallatitude");
        assert_eq!(normalize("ring-count"), "ringcount");
        assert_eq!(normalize(" IUCN status "), "iucnstatus");
        assert_eq!(normalize("_-_"), "");
    }

    #[test]
    fn test_exact_after_normalization() {
        assert_eq!(score("Species_ID", "species-id"), 1.0);
        assert_eq!(score("event date", "eventdate"), 1.0);
    }

    #[test]
    fn test_identity() {
        for s in SAMPLES.iter().filter(|s| !normalize(s).is_empty()) {
            assert_eq!(score(s, s), 1.0, "score({s:?}, {s:?})");
        }
    }

    #[test]
    fn test_symmetric() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(score(a, b), score(b, a), "asymmetric for {a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn test_bounded() {
        for a in SAMPLES {
            for b in SAMPLES {
                let s = score(a, b);
                assert!((0.0..=1.0).contains(&s), "{a:?} / {b:?} scored {s}");
            }
        }
    }

    #[test]
    fn test_containment_bonus() {
        assert_eq!(score("latitude", "decimallatitude"), CONTAINMENT_SCORE);
        assert_eq!(score("depth_m", "depth"), CONTAINMENT_SCORE);
    }

    #[test]
    fn test_short_strings_skip_containment() {
        // "lat" is only 3 characters, so edit distance applies.
        let s = score("lat", "decimallatitude");
        assert!(s < 0.5, "got {s}");
        assert!(s > 0.0);
    }

    #[test]
    fn test_edit_distance_ratio() {
        // sciname → scientificname needs 7 insertions over 14 characters.
        assert_eq!(score("sciName", "scientific_name"), 0.5);
        // vernname → vernacularname needs 6 insertions over 14 characters.
        assert!((score("VERN_NAME", "vernacularname") - (1.0 - 6.0 / 14.0)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_never_matches() {
        assert_eq!(score("", ""), 0.0);
        assert_eq!(score("__", "-"), 0.0);
        assert_eq!(score("", "region"), 0.0);
    }

    #[test]
    fn test_monotonic_in_distance() {
        let one_off = score("regon", "region");
        let two_off = score("regn", "region");
        assert!(one_off > two_off);
    }
}
