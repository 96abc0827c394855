//! Name-keyed lazy register space.
//!
//! Cells come into existence on first access and are never removed, so a
//! handle obtained before hooks were installed observes them afterwards.
//! 8-bit and 16-bit cells live in separate namespaces; the same name may
//! exist in both without conflict.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::register::{lock, Reg16, Reg8};

/// Lazily-populated map of shared register cells.
#[derive(Debug, Default)]
pub struct RegisterSpace {
    by_name8: Mutex<HashMap<String, Arc<Reg8>>>,
    by_name16: Mutex<HashMap<String, Arc<Reg16>>>,
}

impl RegisterSpace {
    /// Creates an empty space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared 8-bit cell for `name`, creating it on first use.
    ///
    /// Repeated calls with the same name return handles to the same cell.
    #[must_use]
    pub fn cell8(&self, name: &str) -> Arc<Reg8> {
        let mut map = lock(&self.by_name8);
        if let Some(cell) = map.get(name) {
            return Arc::clone(cell);
        }
        let cell = Arc::new(Reg8::new(name));
        map.insert(name.to_owned(), Arc::clone(&cell));
        cell
    }

    /// Returns the shared 16-bit cell for `name`, creating it on first use.
    ///
    /// Repeated calls with the same name return handles to the same cell.
    #[must_use]
    pub fn cell16(&self, name: &str) -> Arc<Reg16> {
        let mut map = lock(&self.by_name16);
        if let Some(cell) = map.get(name) {
            return Arc::clone(cell);
        }
        let cell = Arc::new(Reg16::new(name));
        map.insert(name.to_owned(), Arc::clone(&cell));
        cell
    }
}
