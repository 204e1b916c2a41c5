use toml;

use crate::errors::*;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read-only context of the running job. Only the configuration is consumed
/// by the builder; everything else about a job stays with the caller.
pub struct JobContext {
    pub jobconf: JobConf,
}

impl JobContext {
    pub fn new(jobconf: JobConf) -> JobContext {
        JobContext { jobconf }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct JobConf {
    pub packages: PackagesConf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackagesConf {
    /// Name of the part that is loaded up-front.
    pub init: String,
    /// Parts whose packages are merged into a single one.
    pub collapse: Vec<String>,
    pub sizes: SizesConf,
    /// Part name to entry class list.
    pub parts: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct SizesConf {
    /// Minimum size of a shared package in KB; 0 leaves package sizes alone.
    pub min_package: u64,
    /// Minimum size of a single-part package in KB; `min-package` if unset.
    pub min_package_unshared: Option<u64>,
}

impl Default for PackagesConf {
    fn default() -> Self {
        PackagesConf {
            init: "boot".to_string(),
            collapse: Vec::new(),
            sizes: SizesConf::default(),
            parts: BTreeMap::new(),
        }
    }
}

impl Default for SizesConf {
    fn default() -> Self {
        SizesConf {
            min_package: 0,
            min_package_unshared: None,
        }
    }
}

impl JobConf {
    pub fn parse(src: &Path) -> Result<JobConf> {
        let mut config_file = File::open(src)?;
        let mut content = String::new();
        config_file.read_to_string(&mut content)?;

        Ok(toml::from_str(&content)?)
    }
}
