use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::*;
use crate::part::PartTable;

/// Bitwise OR of the bit masks of every part using a package. Never zero.
pub type PackageId = u64;

/// Registry of live packages, keyed by id.
pub type PackageMap = BTreeMap<PackageId, Package>;

/// A physical bundle of classes used by the exact same combination of parts
/// at construction time.
pub struct Package {
    pub id: PackageId,
    /// Classes in this package; disjoint from every other package.
    pub classes: BTreeSet<String>,
    /// Names of the parts that used this package when it was cut.
    pub parts: Vec<String>,
    /// Number of parts that used this package when it was cut. This is the
    /// package's priority; merges that widen the actual reach do not touch
    /// it, so the load order stays the one established at construction.
    pub part_count: usize,
}

impl Package {
    pub fn new(id: PackageId) -> Package {
        Package {
            id,
            classes: BTreeSet::new(),
            parts: Vec::new(),
            part_count: 0,
        }
    }
}

/// Order package ids by priority: most widely shared first, ties going to
/// the lower id so packages of earlier-declared parts load earlier.
pub fn sort_packages(ids: &mut [PackageId], packages: &PackageMap) {
    ids.sort_by_key(|id| (Reverse(packages[id].part_count), *id));
}

/// Find a package that every part loading `search_id` loads earlier in its
/// list, preferring the nearest one. All affected parts are guaranteed to
/// have such a package on board before `search_id`, which makes it a safe
/// merge target.
pub fn previous_common_package(
    search_id: PackageId,
    parts: &PartTable,
    packages: &PackageMap,
) -> Option<PackageId> {
    let mut relevant_parts = 0;
    let mut relevant_packages: Vec<PackageId> = Vec::new();

    for part in &parts.parts {
        if let Some(pos) = part.packages.iter().position(|&id| id == search_id) {
            relevant_parts += 1;
            relevant_packages.extend_from_slice(&part.packages[..pos]);
        }
    }

    // Sort by priority, but search from the low-priority end upward.
    sort_packages(&mut relevant_packages, packages);
    relevant_packages.reverse();

    // An id occurring once per relevant part precedes `search_id` in every
    // one of them.
    relevant_packages
        .iter()
        .copied()
        .find(|&id| relevant_packages.iter().filter(|&&x| x == id).count() == relevant_parts)
}

/// Move the classes of `from_id` into `to_id`, drop `from_id` from the
/// registry and from the package list of every part. The target is not added
/// anywhere: it already precedes the source wherever the merge is legal. Its
/// `parts` and `part_count` stay as built.
///
/// When `collapse_parts` is given, a collapse part loading `from_id` must
/// already load `to_id`; any other part just loses its edge to `from_id`.
pub fn merge_package(
    from_id: PackageId,
    to_id: PackageId,
    parts: &mut PartTable,
    packages: &mut PackageMap,
    collapse_parts: Option<&[String]>,
) -> Result<()> {
    for part in parts.parts.iter_mut() {
        if let Some(pos) = part.packages.iter().position(|&id| id == from_id) {
            if let Some(collapse) = collapse_parts {
                if collapse.contains(&part.name) && !part.packages.contains(&to_id) {
                    partpack_bail!("could not merge these packages (#{}, #{})", from_id, to_id);
                }
            }
            part.packages.remove(pos);
        }
    }

    let from = packages
        .remove(&from_id)
        .ok_or_else(|| format_err!("merge source package #{} is not registered", from_id))?;
    let to = packages
        .get_mut(&to_id)
        .ok_or_else(|| format_err!("merge target package #{} is not registered", to_id))?;
    to.classes.extend(from.classes);

    Ok(())
}
