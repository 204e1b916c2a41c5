use std::collections::{BTreeMap, BTreeSet};

use crate::errors::Result;

/// Opaque build flags, forwarded unchanged to the resolver and the compiler.
pub type Variants = BTreeMap<String, String>;

/// Access to the class dependency graph. The builder never walks the graph
/// itself; it only asks for transitive closures and load-order sorting.
pub trait DependencyResolver {
    /// Expand `roots` to the full set of classes they depend on. Classes in
    /// `excludes` must not appear in the result; whether the resolver
    /// traverses through their dependencies is its own business.
    fn resolve_dependencies(
        &self,
        roots: &[String],
        excludes: &BTreeSet<String>,
        variants: &Variants,
    ) -> Result<Vec<String>>;

    /// Order `classes` so that every class is loadable after its
    /// predecessors.
    fn sort_classes(&self, classes: &BTreeSet<String>, variants: &Variants) -> Result<Vec<String>>;
}

/// Compile-size estimation, used to decide which packages are worth keeping
/// separate.
pub trait Compiler {
    /// Deterministic byte size estimate for the compiled class.
    fn get_compiled_size(&self, class: &str, variants: &Variants) -> Result<u64>;
}
