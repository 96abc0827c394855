//! Shared 8-bit and 16-bit register cells with interception hooks.
//!
//! A cell is a named atomic value. Reads and writes normally hit the stored
//! value; installing a hook reroutes them so a peripheral model can attach
//! live behavior to an address firmware believes is hardware. Hooks reach
//! the stored value through the `raw_*` accessors, which never recurse into
//! hooks.

use std::fmt;
use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type ReadHook8 = Arc<dyn Fn(&Reg8) -> u8 + Send + Sync>;
type WriteHook8 = Arc<dyn Fn(&Reg8, u8) + Send + Sync>;
type ReadHook16 = Arc<dyn Fn(&Reg16) -> u16 + Send + Sync>;
type WriteHook16 = Arc<dyn Fn(&Reg16, u16) + Send + Sync>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named 8-bit register cell with optional read and write hooks.
pub struct Reg8 {
    name: String,
    value: AtomicU8,
    read_hook: Mutex<Option<ReadHook8>>,
    write_hook: Mutex<Option<WriteHook8>>,
}

impl Reg8 {
    /// Creates a zero-value cell with no hooks installed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU8::new(0),
            read_hook: Mutex::new(None),
            write_hook: Mutex::new(None),
        }
    }

    /// Returns the cell's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the cell, going through the read hook when one is installed.
    #[must_use]
    pub fn read(&self) -> u8 {
        let hook = lock(&self.read_hook).clone();
        let value = hook.map_or_else(|| self.value.load(Ordering::SeqCst), |hook| hook(self));
        log::trace!("{} => {value:#04x}", self.name);
        value
    }

    /// Writes the cell, going through the write hook when one is installed.
    pub fn write(&self, value: u8) {
        log::trace!("{} <= {value:#04x}", self.name);
        let hook = lock(&self.write_hook).clone();
        hook.map_or_else(
            || self.value.store(value, Ordering::SeqCst),
            |hook| hook(self, value),
        );
    }

    /// Sets bits in the raw value, then routes the result like [`Self::write`].
    pub fn or_with(&self, mask: u8) {
        self.write(self.raw_read() | mask);
    }

    /// Clears bits in the raw value, then routes the result like [`Self::write`].
    pub fn and_with(&self, mask: u8) {
        self.write(self.raw_read() & mask);
    }

    /// Reads the stored value without consulting hooks.
    #[must_use]
    pub fn raw_read(&self) -> u8 {
        self.value.load(Ordering::SeqCst)
    }

    /// Stores a value without consulting hooks.
    pub fn raw_store(&self, value: u8) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Atomically ORs `mask` into the stored value, bypassing hooks.
    pub fn raw_or(&self, mask: u8) {
        self.value.fetch_or(mask, Ordering::SeqCst);
    }

    /// Atomically ANDs the stored value with `mask`, bypassing hooks.
    pub fn raw_and(&self, mask: u8) {
        self.value.fetch_and(mask, Ordering::SeqCst);
    }

    /// Installs the read hook, replacing any previous one.
    pub fn set_read_hook<F>(&self, hook: F)
    where
        F: Fn(&Self) -> u8 + Send + Sync + 'static,
    {
        *lock(&self.read_hook) = Some(Arc::new(hook));
    }

    /// Installs the write hook, replacing any previous one.
    pub fn set_write_hook<F>(&self, hook: F)
    where
        F: Fn(&Self, u8) + Send + Sync + 'static,
    {
        *lock(&self.write_hook) = Some(Arc::new(hook));
    }
}

impl fmt::Debug for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reg8")
            .field("name", &self.name)
            .field("value", &self.raw_read())
            .finish_non_exhaustive()
    }
}

/// Named 16-bit register cell with optional read and write hooks.
pub struct Reg16 {
    name: String,
    value: AtomicU16,
    read_hook: Mutex<Option<ReadHook16>>,
    write_hook: Mutex<Option<WriteHook16>>,
}

impl Reg16 {
    /// Creates a zero-value cell with no hooks installed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU16::new(0),
            read_hook: Mutex::new(None),
            write_hook: Mutex::new(None),
        }
    }

    /// Returns the cell's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the cell, going through the read hook when one is installed.
    #[must_use]
    pub fn read(&self) -> u16 {
        let hook = lock(&self.read_hook).clone();
        let value = hook.map_or_else(|| self.value.load(Ordering::SeqCst), |hook| hook(self));
        log::trace!("{} => {value:#06x}", self.name);
        value
    }

    /// Writes the cell, going through the write hook when one is installed.
    pub fn write(&self, value: u16) {
        log::trace!("{} <= {value:#06x}", self.name);
        let hook = lock(&self.write_hook).clone();
        hook.map_or_else(
            || self.value.store(value, Ordering::SeqCst),
            |hook| hook(self, value),
        );
    }

    /// Sets bits in the raw value, then routes the result like [`Self::write`].
    pub fn or_with(&self, mask: u16) {
        self.write(self.raw_read() | mask);
    }

    /// Clears bits in the raw value, then routes the result like [`Self::write`].
    pub fn and_with(&self, mask: u16) {
        self.write(self.raw_read() & mask);
    }

    /// Reads the stored value without consulting hooks.
    #[must_use]
    pub fn raw_read(&self) -> u16 {
        self.value.load(Ordering::SeqCst)
    }

    /// Stores a value without consulting hooks.
    pub fn raw_store(&self, value: u16) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Installs the read hook, replacing any previous one.
    pub fn set_read_hook<F>(&self, hook: F)
    where
        F: Fn(&Self) -> u16 + Send + Sync + 'static,
    {
        *lock(&self.read_hook) = Some(Arc::new(hook));
    }

    /// Installs the write hook, replacing any previous one.
    pub fn set_write_hook<F>(&self, hook: F)
    where
        F: Fn(&Self, u16) + Send + Sync + 'static,
    {
        *lock(&self.write_hook) = Some(Arc::new(hook));
    }
}

impl fmt::Debug for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reg16")
            .field("name", &self.name)
            .field("value", &self.raw_read())
            .finish_non_exhaustive()
    }
}
