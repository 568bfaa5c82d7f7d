//! Variant resolution: mapping a shopper's color/size selection to a SKU.
//!
//! Labels are compared trimmed and case-insensitively, so `"Red "` selects a
//! variant stored as `"red"`. When the shopper has not picked a value for a
//! dimension and the product only offers one value for it, that value is
//! used as if it had been picked. A dimension with several values and no
//! selection stays unconstrained, and list order breaks the tie.

use crate::ids::EntityId;
use crate::products::Variant;

/// Normalizes a label for comparison.
fn label_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Normalizes an optional selection, treating blank input as no selection.
fn selection_key(selected: Option<&str>) -> Option<String> {
    selected.map(label_key).filter(|k| !k.is_empty())
}

/// Distinct labels for one dimension, in first-seen order, keeping the first
/// spelling encountered.
fn distinct_labels<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for label in labels.flatten() {
        let key = label_key(label);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(label.trim().to_owned());
    }
    out
}

/// Distinct color labels across `variants`.
#[must_use]
pub fn distinct_colors(variants: &[Variant]) -> Vec<String> {
    distinct_labels(variants.iter().map(|v| v.color.as_deref()))
}

/// Distinct size labels across `variants`.
#[must_use]
pub fn distinct_sizes(variants: &[Variant]) -> Vec<String> {
    distinct_labels(variants.iter().map(|v| v.size.as_deref()))
}

/// Picks the filter for one dimension: the caller's selection, else the only
/// value on offer, else unconstrained.
fn effective_filter(selected: Option<&str>, distinct: &[String]) -> Option<String> {
    selection_key(selected).or_else(|| match distinct {
        [only] => Some(label_key(only)),
        _ => None,
    })
}

fn matches(label: Option<&str>, filter: Option<&String>) -> bool {
    match filter {
        None => true,
        Some(wanted) => label.is_some_and(|l| label_key(l) == *wanted),
    }
}

/// Finds the variant a selection refers to.
///
/// Returns the first variant matching every effective filter, or the first
/// variant in the list when nothing matches exactly. Returns `None` only for
/// an empty list.
#[must_use]
pub fn find_variant<'a>(
    variants: &'a [Variant],
    selected_color: Option<&str>,
    selected_size: Option<&str>,
) -> Option<&'a Variant> {
    let color = effective_filter(selected_color, &distinct_colors(variants));
    let size = effective_filter(selected_size, &distinct_sizes(variants));

    variants
        .iter()
        .find(|v| matches(v.color.as_deref(), color.as_ref()) && matches(v.size.as_deref(), size.as_ref()))
        .or_else(|| variants.first())
}

/// Resolves a color/size selection to a variant id.
///
/// With no variants at all the product is its own single variant, and
/// `product_default` (the product's `default_variant_id`) is returned.
#[must_use]
pub fn resolve_variant(
    variants: &[Variant],
    selected_color: Option<&str>,
    selected_size: Option<&str>,
    product_default: Option<&EntityId>,
) -> Option<EntityId> {
    if variants.is_empty() {
        return product_default.cloned();
    }
    find_variant(variants, selected_color, selected_size).map(|v| v.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: u64, color: Option<&str>, size: Option<&str>, stock: Option<u32>) -> Variant {
        Variant {
            id: EntityId::from(id),
            product_id: Some(EntityId::from(1u64)),
            color: color.map(str::to_owned),
            size: size.map(str::to_owned),
            price: None,
            stock,
        }
    }

    #[test]
    fn single_color_and_size_resolve_without_selection() {
        let variants = vec![variant(7, Some("Black"), Some("M"), Some(4))];
        assert_eq!(
            resolve_variant(&variants, None, None, None),
            Some(EntityId::from(7u64))
        );
    }

    #[test]
    fn explicit_selection_matches_case_insensitively() {
        let variants = vec![
            variant(1, Some("Red"), Some("M"), Some(2)),
            variant(2, Some("Red"), Some("L"), Some(2)),
            variant(3, Some("Blue"), Some("L"), Some(2)),
        ];
        assert_eq!(
            resolve_variant(&variants, Some(" blue"), Some("l "), None),
            Some(EntityId::from(3u64))
        );
        assert_eq!(
            resolve_variant(&variants, Some("RED"), Some("L"), None),
            Some(EntityId::from(2u64))
        );
    }

    #[test]
    fn unique_size_fills_in_missing_size_selection() {
        let variants = vec![
            variant(1, Some("Red"), Some("Free"), None),
            variant(2, Some("Blue"), Some("free"), None),
        ];
        assert_eq!(
            resolve_variant(&variants, Some("blue"), None, None),
            Some(EntityId::from(2u64))
        );
    }

    #[test]
    fn ambiguous_dimension_falls_back_to_list_order() {
        let variants = vec![
            variant(10, Some("red"), Some("M"), Some(0)),
            variant(11, Some("red"), Some("L"), Some(3)),
        ];
        let resolved = find_variant(&variants, Some("red"), None).unwrap();
        assert_eq!(resolved.id, EntityId::from(10u64));
        assert!(!resolved.in_stock());
    }

    #[test]
    fn no_exact_match_returns_first_variant() {
        let variants = vec![
            variant(5, Some("Green"), Some("S"), None),
            variant(6, Some("Green"), Some("M"), None),
        ];
        assert_eq!(
            resolve_variant(&variants, Some("purple"), Some("XXL"), None),
            Some(EntityId::from(5u64))
        );
    }

    #[test]
    fn empty_list_uses_product_default() {
        let default = EntityId::from(42u64);
        assert_eq!(
            resolve_variant(&[], Some("red"), None, Some(&default)),
            Some(EntityId::from(42u64))
        );
        assert_eq!(resolve_variant(&[], None, None, None), None);
    }

    #[test]
    fn blank_selection_counts_as_no_selection() {
        let variants = vec![
            variant(1, Some("Red"), Some("M"), None),
            variant(2, Some("Red"), Some("L"), None),
        ];
        assert_eq!(
            resolve_variant(&variants, Some("  "), Some("L"), None),
            Some(EntityId::from(2u64))
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let variants = vec![
            variant(1, Some("Red"), Some("M"), None),
            variant(2, Some("Blue"), Some("M"), None),
        ];
        let first = resolve_variant(&variants, None, Some("m"), None);
        for _ in 0..10 {
            assert_eq!(resolve_variant(&variants, None, Some("m"), None), first);
        }
        assert_eq!(first, Some(EntityId::from(1u64)));
    }

    #[test]
    fn distinct_labels_keep_first_spelling_and_order() {
        let variants = vec![
            variant(1, Some("Red"), Some("M"), None),
            variant(2, Some("red "), Some("L"), None),
            variant(3, Some("Blue"), None, None),
        ];
        assert_eq!(distinct_colors(&variants), vec!["Red", "Blue"]);
        assert_eq!(distinct_sizes(&variants), vec!["M", "L"]);
    }

    #[test]
    fn variants_without_labels_only_match_unconstrained_dimensions() {
        let variants = vec![
            variant(1, None, Some("M"), None),
            variant(2, Some("Red"), Some("M"), None),
        ];
        // "Red" is the only distinct color, so it becomes the implicit filter.
        assert_eq!(
            resolve_variant(&variants, None, None, None),
            Some(EntityId::from(2u64))
        );
    }
}
