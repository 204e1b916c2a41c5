use std::collections::BTreeSet;

use crate::package::PackageId;

/// Hard cap on the number of parts per job, set by the package id width.
pub const MAX_PARTS: usize = PackageId::BITS as usize;

/// A user-visible, independently requestable load unit of the application.
pub struct Part {
    pub name: String,
    /// Power of two identifying this part inside package ids.
    pub bit_mask: PackageId,
    /// Entry classes as declared in the job configuration.
    pub initial_deps: Vec<String>,
    /// Classes this part depends on, with defining classes of other parts
    /// excluded. Seeded from `initial_deps`, replaced by the resolved
    /// transitive set.
    pub deps: BTreeSet<String>,
    /// Packages constituting this part, highest priority first.
    pub packages: Vec<PackageId>,
}

impl Part {
    pub fn new(name: &str, bit_mask: PackageId, initial_deps: &[String]) -> Part {
        Part {
            name: name.to_string(),
            bit_mask,
            initial_deps: initial_deps.to_vec(),
            deps: initial_deps.iter().cloned().collect(),
            packages: Vec::new(),
        }
    }
}

/// All parts of a job, in declaration order; the index of a part is its bit
/// position.
#[derive(Default)]
pub struct PartTable {
    pub parts: Vec<Part>,
}

impl PartTable {
    pub fn by_name(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_part_seeds_deps_from_entry_classes() {
        let entries = vec!["app.Main".to_string(), "app.Theme".to_string()];
        let part = Part::new("boot", 1, &entries);
        assert_eq!(part.initial_deps, entries);
        assert_eq!(part.deps.len(), 2);
        assert!(part.packages.is_empty());
    }

    #[test]
    fn by_name_finds_declared_parts() {
        let mut table = PartTable::default();
        table.parts.push(Part::new("boot", 1, &[]));
        table.parts.push(Part::new("ui", 2, &[]));
        assert_eq!(table.by_name("ui").map(|p| p.bit_mask), Some(2));
        assert!(table.by_name("ghost").is_none());
    }
}
