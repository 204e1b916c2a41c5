use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::config::JobContext;
use crate::console::Console;
use crate::depend::{Compiler, DependencyResolver, Variants};
use crate::errors::*;
use crate::package::{self, Package, PackageId, PackageMap};
use crate::part::{Part, PartTable, MAX_PARTS};

/// Final package load list per part; the numbers index into the finalized
/// class lists.
pub type ResultParts = BTreeMap<String, Vec<usize>>;

/// Class lists of the finalized packages, highest priority first.
pub type ResultClasses = Vec<Vec<String>>;

/// Creates packages and associates parts to packages, from the parts
/// configuration and the class list.
pub struct PartBuilder<'a> {
    console: &'a mut dyn Console,
    dep_loader: &'a dyn DependencyResolver,
    compiler: &'a dyn Compiler,
}

impl<'a> PartBuilder<'a> {
    pub fn new(
        console: &'a mut dyn Console,
        dep_loader: &'a dyn DependencyResolver,
        compiler: &'a dyn Compiler,
    ) -> PartBuilder<'a> {
        PartBuilder {
            console,
            dep_loader,
            compiler,
        }
    }

    /// Cut the classes needed by `part_includes` into packages and map every
    /// part onto the packages it has to load, highest priority first.
    ///
    /// Returns the boot part name, the package numbers per part, and the
    /// class list per package number.
    pub fn get_packages(
        &mut self,
        part_includes: &IndexMap<String, Vec<String>>,
        smart_exclude: &BTreeSet<String>,
        class_list: &BTreeSet<String>,
        variants: &Variants,
        job: &JobContext,
    ) -> Result<(String, ResultParts, ResultClasses)> {
        let jobconf = &job.jobconf;
        let min_package_size = jobconf.packages.sizes.min_package;
        let min_package_size_for_unshared = jobconf
            .packages
            .sizes
            .min_package_unshared
            .unwrap_or(min_package_size);
        let boot = jobconf.packages.init.clone();

        // The boot part is always collapsed, listed or not.
        let mut collapse_parts = jobconf.packages.collapse.clone();
        if jobconf.packages.parts.contains_key(&boot) && !collapse_parts.contains(&boot) {
            collapse_parts.insert(0, boot.clone());
        }

        let mut parts = self.create_parts(part_includes)?;
        self.resolve_part_deps(&mut parts, variants, smart_exclude, class_list)?;

        let mut packages = self.create_packages(&mut parts);
        self.print_part_stats(&packages, &parts);

        if !collapse_parts.is_empty() {
            self.collapse_parts(&mut parts, &mut packages, &collapse_parts)?;
        }

        if min_package_size > 0 {
            self.optimize_packages(
                &mut packages,
                &mut parts,
                variants,
                min_package_size,
                min_package_size_for_unshared,
            )?;
        }

        self.print_part_stats(&packages, &parts);

        let result_parts = final_part_data(&packages, &parts);
        let result_classes = self.final_class_list(&packages, variants)?;

        Ok((boot, result_parts, result_classes))
    }

    // Create the set of parts, each with a unique single-bit mask taken from
    // its declaration position.
    fn create_parts(&mut self, part_includes: &IndexMap<String, Vec<String>>) -> Result<PartTable> {
        self.console.debug("Creating part structures...");
        self.console.indent();

        if part_includes.len() > MAX_PARTS {
            partpack_bail!(
                "too many parts: {} exceed the {} bit package id width",
                part_includes.len(),
                MAX_PARTS
            );
        }

        let mut parts = PartTable::default();
        for (pos, (name, includes)) in part_includes.iter().enumerate() {
            let part = Part::new(name, 1 << pos, includes);
            self.console
                .debug(&format!("Part #{} => {}", part.name, part.bit_mask));
            parts.parts.push(part);
        }

        self.console.outdent();
        Ok(parts)
    }

    // Expand every part's entry classes into the complete list of classes it
    // depends on.
    fn resolve_part_deps(
        &mut self,
        parts: &mut PartTable,
        variants: &Variants,
        smart_exclude: &BTreeSet<String>,
        class_list: &BTreeSet<String>,
    ) -> Result<()> {
        self.console.debug("");
        self.console.info("Resolving part dependencies...");
        self.console.indent();

        for pos in 0..parts.parts.len() {
            // Entry classes of the other parts stay their responsibility.
            let mut part_excludes = smart_exclude.clone();
            for (other_pos, other) in parts.parts.iter().enumerate() {
                if other_pos != pos {
                    part_excludes.extend(other.initial_deps.iter().cloned());
                }
            }

            let part = &mut parts.parts[pos];

            // Remove unknown classes before checking dependencies.
            part.deps.retain(|class| class_list.contains(class));

            // Check we have something to include.
            if part.deps.is_empty() {
                self.console.info(&format!(
                    "Part #{} is ignored in current configuration",
                    part.name
                ));
                continue;
            }

            let roots: Vec<String> = part.deps.iter().cloned().collect();
            let resolved = self
                .dep_loader
                .resolve_dependencies(&roots, &part_excludes, variants)?;

            part.deps = resolved
                .into_iter()
                .filter(|class| class_list.contains(class))
                .collect();
            self.console.debug(&format!(
                "Part #{} depends on {} classes",
                part.name,
                part.deps.len()
            ));
        }

        self.console.outdent();
        Ok(())
    }

    // Cut an initial set of packages out of the classes needed by the parts:
    // one package per combination of parts sharing a class.
    fn create_packages(&mut self, parts: &mut PartTable) -> PackageMap {
        let mut all_classes: BTreeSet<String> = BTreeSet::new();
        for part in &parts.parts {
            all_classes.extend(part.deps.iter().cloned());
        }

        let mut packages = PackageMap::new();
        for class in all_classes {
            let mut pkg_id: PackageId = 0;
            for part in &parts.parts {
                if part.deps.contains(&class) {
                    pkg_id |= part.bit_mask;
                }
            }
            packages
                .entry(pkg_id)
                .or_insert_with(|| Package::new(pkg_id))
                .classes
                .insert(class);
        }

        // Which packages does a part use, and vice versa.
        for package in packages.values_mut() {
            for part in parts.parts.iter_mut() {
                if package.id & part.bit_mask != 0 {
                    part.packages.push(package.id);
                    package.parts.push(part.name.clone());
                }
            }
            package.part_count = package.parts.len();
        }

        for part in parts.parts.iter_mut() {
            package::sort_packages(&mut part.packages, &packages);
        }

        packages
    }

    // Merge all packages of each collapse part into one, cutting the round
    // trips of the initial load.
    //
    // Part package lists are sorted by priority, so every later package can
    // be merged into an earlier one. Successive collapse parts target
    // successive positions in their lists so the collapse destinations do
    // not clobber one another.
    fn collapse_parts(
        &mut self,
        parts: &mut PartTable,
        packages: &mut PackageMap,
        collapse_parts: &[String],
    ) -> Result<()> {
        self.console.debug("");
        self.console.info("Collapsing part packages...");
        self.console.indent();

        for (collapse_pos, name) in collapse_parts.iter().enumerate() {
            self.console.debug(&format!("Part {}...", name));
            self.console.indent();

            let part = match parts.by_name(name) {
                Some(part) => part,
                None => partpack_bail!("unknown part '{}' in collapse configuration", name),
            };
            if collapse_pos >= part.packages.len() {
                partpack_bail!(
                    "collapse part '{}' has no package at position {}",
                    name,
                    collapse_pos
                );
            }
            let to_id = part.packages[collapse_pos];
            let from_ids: Vec<PackageId> = part.packages[collapse_pos + 1..].to_vec();

            for from_id in from_ids {
                self.console
                    .debug(&format!("Merging package #{} into #{}", from_id, to_id));
                package::merge_package(from_id, to_id, parts, packages, Some(collapse_parts))?;
            }

            self.console.outdent();
        }

        self.console.outdent();
        Ok(())
    }

    fn compute_package_size(&mut self, package: &Package, variants: &Variants) -> Result<u64> {
        let mut package_size = 0;

        self.console.indent();
        for class in &package.classes {
            package_size += self.compiler.get_compiled_size(class, variants)?;
        }
        self.console.outdent();

        Ok(package_size)
    }

    // Merge every under-sized package into the first package that is common
    // to all its parts and loaded earlier by each of them. Such a target is
    // on board before the merged package would have been requested, so no
    // part loses a class it needs.
    fn optimize_packages(
        &mut self,
        packages: &mut PackageMap,
        parts: &mut PartTable,
        variants: &Variants,
        min_package_size: u64,
        min_package_size_for_unshared: u64,
    ) -> Result<()> {
        self.console.debug("");
        self.console.info("Optimizing package sizes...");
        self.console.indent();
        self.console
            .debug(&format!("Minimum size: {}KB", min_package_size));
        self.console.indent();

        // Work through the sorted list from the back, lowest priority first.
        let mut all_packages: Vec<PackageId> = packages.keys().copied().collect();
        package::sort_packages(&mut all_packages, packages);
        all_packages.reverse();

        for from_id in all_packages {
            let (package_size, part_count) = match packages.get(&from_id) {
                Some(package) => (
                    self.compute_package_size(package, variants)? / 1024,
                    package.part_count,
                ),
                None => continue,
            };
            self.console
                .debug(&format!("Package #{}: {}KB", from_id, package_size));

            if part_count == 1 && package_size >= min_package_size_for_unshared {
                continue;
            }
            if part_count > 1 && package_size >= min_package_size {
                continue;
            }

            self.console.indent();
            self.console
                .debug(&format!("Search a target package for package #{}", from_id));
            match package::previous_common_package(from_id, parts, packages) {
                Some(to_id) => {
                    self.console
                        .debug(&format!("Merge package #{} into #{}", from_id, to_id));
                    package::merge_package(from_id, to_id, parts, packages, None)?;
                }
                None => {
                    self.console
                        .debug(&format!("No common package preceding #{}", from_id));
                }
            }
            self.console.outdent();
        }

        self.console.outdent();
        self.console.outdent();
        Ok(())
    }

    fn final_class_list(&self, packages: &PackageMap, variants: &Variants) -> Result<ResultClasses> {
        let mut package_ids: Vec<PackageId> = packages.keys().copied().collect();
        package::sort_packages(&mut package_ids, packages);

        package_ids
            .iter()
            .map(|id| self.dep_loader.sort_classes(&packages[id].classes, variants))
            .collect()
    }

    fn print_part_stats(&mut self, packages: &PackageMap, parts: &PartTable) {
        let mut package_ids: Vec<PackageId> = packages.keys().copied().collect();
        package_ids.sort_unstable();
        package_ids.reverse();

        self.console.debug("");
        self.console.debug("Package summary");
        self.console.indent();
        for id in &package_ids {
            self.console.debug(&format!(
                "Package #{} contains {} classes",
                id,
                packages[id].classes.len()
            ));
        }
        self.console.outdent();

        self.console.debug("");
        self.console.debug("Part summary");
        self.console.indent();
        for part in &parts.parts {
            let pkg_list = part.packages.iter().map(|id| format!("#{}", id)).join(", ");
            self.console
                .debug(&format!("Part #{} uses these packages: {}", part.name, pkg_list));
        }
        self.console.outdent();
        self.console.debug("");
    }
}

// Renumber the surviving packages densely by priority and map every part's
// package list onto the new numbers. Parts without packages are left out.
fn final_part_data(packages: &PackageMap, parts: &PartTable) -> ResultParts {
    let mut package_ids: Vec<PackageId> = packages.keys().copied().collect();
    package::sort_packages(&mut package_ids, packages);

    let mut result_parts = ResultParts::new();
    for (to_id, from_id) in package_ids.iter().enumerate() {
        for part in &parts.parts {
            if part.packages.contains(from_id) {
                result_parts
                    .entry(part.name.clone())
                    .or_default()
                    .push(to_id);
            }
        }
    }

    result_parts
}
