//! Options of the IR layer, loadable from YAML.

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IirOptions {
    /// Also classify stencil and inter-stencil temporaries during field
    /// accumulation. By default only user and API fields are considered.
    pub accumulate_temporaries: bool,
    /// Warn when a do-method references no field at all.
    pub warn_on_field_free_do_method: bool,
    /// Include per-statement read/write maps in the structured dump.
    pub dump_statement_accesses: bool,
}

impl Default for IirOptions {
    fn default() -> Self {
        IirOptions {
            accumulate_temporaries: false,
            warn_on_field_free_do_method: true,
            dump_statement_accesses: true,
        }
    }
}

impl IirOptions {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }
}
