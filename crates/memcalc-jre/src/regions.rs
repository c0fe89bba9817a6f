use indexmap::IndexMap;
use memcalc_memory::{ensure_unique_names, MalformedSizeError, Region, SizeRange};

use crate::version::{JreVersion, MetadataArea};

pub const HEAP: &str = "heap";
pub const PERMGEN: &str = "permgen";
pub const METASPACE: &str = "metaspace";
pub const STACK: &str = "stack";
pub const NATIVE: &str = "native";
/// Version-neutral name for whichever of `permgen`/`metaspace` applies.
pub const METADATA: &str = "metadata";

/// Weight and size-range overrides layered on top of a version's default regions.
///
/// Values are kept in their textual form; [`resolve_regions`] does the parsing so every malformed
/// value surfaces as a [`MalformedSizeError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionOverrides {
    /// Region name to weight (percentage of the total budget).
    pub weights: IndexMap<String, i64>,
    /// Region name to size range (`64m..`, `..1g`, `128m..256m`, `256m`).
    pub sizes: IndexMap<String, String>,
}

impl MetadataArea {
    pub fn region_name(self) -> &'static str {
        match self {
            MetadataArea::Permgen => PERMGEN,
            MetadataArea::Metaspace => METASPACE,
        }
    }
}

/// Default weights for `version`, in flag order.
pub fn default_weights(version: &JreVersion) -> [(&'static str, u32); 4] {
    [
        (HEAP, 75),
        (version.metadata_area().region_name(), 10),
        (STACK, 5),
        (NATIVE, 10),
    ]
}

/// Map a configured region name onto the region that exists for `version`.
///
/// `permgen`, `metaspace` and `metadata` all address the metadata area; the one that does not
/// match the runtime is renamed.
pub fn canonical_region_name<'a>(version: &JreVersion, name: &'a str) -> &'a str {
    match name {
        PERMGEN | METASPACE | METADATA => version.metadata_area().region_name(),
        _ => name,
    }
}

/// Names in `overrides` that [`canonical_region_name`] maps onto a different region, paired with
/// the region they apply to. `metadata` is an alias, not a rename, and is never reported.
pub fn renamed_regions<'a>(
    version: &JreVersion,
    overrides: &'a RegionOverrides,
) -> Vec<(&'a str, &'static str)> {
    let metadata = version.metadata_area().region_name();
    let mut renamed: Vec<(&str, &'static str)> = Vec::new();
    for name in overrides.weights.keys().chain(overrides.sizes.keys()) {
        let name = name.trim();
        let is_other_area = matches!(name, PERMGEN | METASPACE) && name != metadata;
        if is_other_area && !renamed.iter().any(|(seen, _)| *seen == name) {
            renamed.push((name, metadata));
        }
    }
    renamed
}

#[derive(Debug, Default)]
struct RegionDraft {
    weight: Option<i64>,
    constraint: Option<SizeRange>,
}

/// Resolve the regions for `version`: defaults first, then overrides, then custom regions in the
/// order they were configured.
pub fn resolve_regions(
    version: &JreVersion,
    overrides: &RegionOverrides,
) -> Result<Vec<Region>, MalformedSizeError> {
    let mut drafts: IndexMap<String, RegionDraft> = default_weights(version)
        .into_iter()
        .map(|(name, weight)| {
            (
                name.to_string(),
                RegionDraft {
                    weight: Some(i64::from(weight)),
                    constraint: None,
                },
            )
        })
        .collect();

    let mut weighted = Vec::new();
    for (name, weight) in &overrides.weights {
        let name = canonical_name_checked(version, name, &mut weighted)?;
        drafts.entry(name).or_default().weight = Some(*weight);
    }

    let mut sized = Vec::new();
    for (name, range) in &overrides.sizes {
        let constraint: SizeRange = range.parse()?;
        let name = canonical_name_checked(version, name, &mut sized)?;
        drafts.entry(name).or_default().constraint = Some(constraint);
    }

    let regions = drafts
        .into_iter()
        .map(|(name, draft)| Region::new(name, draft.weight, draft.constraint))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique_names(&regions)?;
    Ok(regions)
}

/// Canonicalise `name`, rejecting a second override that lands on the same region (for example
/// both `permgen` and `metaspace` in one table).
fn canonical_name_checked(
    version: &JreVersion,
    name: &str,
    seen: &mut Vec<String>,
) -> Result<String, MalformedSizeError> {
    let canonical = canonical_region_name(version, name.trim()).to_string();
    if seen.contains(&canonical) {
        return Err(MalformedSizeError::DuplicateRegion { region: canonical });
    }
    seen.push(canonical.clone());
    Ok(canonical)
}
