//! Cached cells
//!
//! Hot-path settings are served from an atomically swapped cell instead of
//! being resolved on every read. Cells are refreshed only by the setting's
//! mutator and by reset.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::settings::SettingDef;
use crate::config::types::Value;

/// One cell per cached setting, keyed by setting key
#[derive(Default)]
pub struct CellCache {
    cells: HashMap<&'static str, ArcSwap<Value>>,
}

impl CellCache {
    /// Build a cell for each definition, seeded by `compute`
    pub fn build<I, F>(defs: I, mut compute: F) -> Self
    where
        I: IntoIterator<Item = &'static SettingDef>,
        F: FnMut(&'static SettingDef) -> Value,
    {
        let cells = defs
            .into_iter()
            .map(|def| (def.key, ArcSwap::from_pointee(compute(def))))
            .collect();
        Self { cells }
    }

    /// Current value of the cell for `key`
    pub fn load(&self, key: &str) -> Option<Arc<Value>> {
        self.cells.get(key).map(|cell| cell.load_full())
    }

    /// Replace the value of the cell for `key`; false if there is no such cell
    pub fn store(&self, key: &str, value: Value) -> bool {
        match self.cells.get(key) {
            Some(cell) => {
                cell.store(Arc::new(value));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl std::fmt::Debug for CellCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.cells.iter().map(|(key, cell)| (key, cell.load())))
            .finish()
    }
}
