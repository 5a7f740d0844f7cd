//! Registry for storing and retrieving compiled fragments

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Error;

use super::{Fragment, FragmentKind};

#[derive(Debug, Default)]
struct Namespaces {
    pages: HashMap<String, Arc<Fragment>>,
    layouts: HashMap<String, Arc<Fragment>>,
}

impl Namespaces {
    fn of(&self, kind: FragmentKind) -> &HashMap<String, Arc<Fragment>> {
        match kind {
            FragmentKind::Page => &self.pages,
            FragmentKind::Layout => &self.layouts,
        }
    }

    fn of_mut(&mut self, kind: FragmentKind) -> &mut HashMap<String, Arc<Fragment>> {
        match kind {
            FragmentKind::Page => &mut self.pages,
            FragmentKind::Layout => &mut self.layouts,
        }
    }
}

/// Thread-safe store of compiled fragments, keyed by kind and name.
///
/// Fragments are insert-only: a name can be registered once per kind and is
/// never replaced or removed.
#[derive(Debug, Default)]
pub struct Registry {
    fragments: RwLock<Namespaces>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // A panic can't leave a map half-written (inserts are a single call),
    // so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Namespaces> {
        self.fragments.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Namespaces> {
        self.fragments.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a compiled fragment, rejecting a duplicate kind and name
    pub fn insert(&self, fragment: Fragment) -> Result<Arc<Fragment>, Error> {
        let kind = fragment.kind();
        let mut namespaces = self.write();
        match namespaces.of_mut(kind).entry(fragment.name().to_string()) {
            Entry::Occupied(slot) => Err(Error::DuplicateName {
                kind,
                name: slot.key().clone(),
            }),
            Entry::Vacant(slot) => {
                let fragment = Arc::new(fragment);
                slot.insert(Arc::clone(&fragment));
                Ok(fragment)
            }
        }
    }

    /// Get a fragment by kind and name
    pub fn get(&self, kind: FragmentKind, name: &str) -> Option<Arc<Fragment>> {
        self.read().of(kind).get(name).cloned()
    }

    /// Check if a fragment exists
    pub fn contains(&self, kind: FragmentKind, name: &str) -> bool {
        self.read().of(kind).contains_key(name)
    }

    /// All registered names of one kind, sorted
    pub fn names(&self, kind: FragmentKind) -> Vec<String> {
        let mut names: Vec<String> = self.read().of(kind).keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of fragments across both namespaces
    pub fn len(&self) -> usize {
        let namespaces = self.read();
        namespaces.pages.len() + namespaces.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
