use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::psi::TableKind;

/// Options for a [crate::StreamProcessor] run.
///
/// ```
/// use tsmeta::{Config, psi::TableKind};
///
/// let config = Config::builder()
///     .tables(vec![TableKind::Pat])
///     .unit_limit(Some(1000))
///     .build();
/// assert_eq!(config.tables, vec![TableKind::Pat]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct Config {
    /// Tables to attach handlers for.
    #[builder(default = TableKind::all())]
    #[serde(default = "TableKind::all")]
    pub tables: Vec<TableKind>,

    /// Stop after this many units have been read.
    #[builder(default)]
    #[serde(default)]
    pub unit_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}
