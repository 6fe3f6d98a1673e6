//! Startup selection of a filer store backend by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Configuration;
use crate::error::FilerError;
use crate::memory_store::MemoryStore;
use crate::traits::FilerStore;
use crate::transform::ChunkTransform;
use crate::wrapper::FilerStoreWrapper;

/// Builds a fresh, uninitialized backend.
pub type StoreConstructor = fn() -> Box<dyn FilerStore>;

/// Maps backend names to their constructors.
///
/// Exactly one backend is chosen per process, by finding the single
/// configuration section with `enabled = true`.
#[derive(Default)]
pub struct StoreRegistry {
    constructors: BTreeMap<String, StoreConstructor>,
}

impl StoreRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the backends shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .constructors
            .insert(MemoryStore::NAME.to_string(), new_memory_store);
        registry
    }

    /// Register a backend constructor under `name`.
    pub fn register(&mut self, name: &str, constructor: StoreConstructor) -> Result<(), FilerError> {
        if self.constructors.contains_key(name) {
            return Err(FilerError::Configuration(format!(
                "filer store {name} is already registered"
            )));
        }
        self.constructors.insert(name.to_string(), constructor);
        Ok(())
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct an uninitialized backend by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn FilerStore>, FilerError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| FilerError::Configuration(format!("unknown filer store {name}")))?;
        Ok(constructor())
    }

    /// The name of the one backend enabled in `config`.
    ///
    /// Fails if no section is enabled, if several are, or if the enabled
    /// section names a backend this registry does not know.
    pub fn enabled_store(&self, config: &Configuration) -> Result<String, FilerError> {
        let mut enabled: Option<&str> = None;
        for section in config.sections() {
            if config.section(section).get_bool("enabled")? != Some(true) {
                continue;
            }
            if !self.constructors.contains_key(section) {
                warn!(store = section, "enabled filer store is not registered");
                return Err(FilerError::Configuration(format!(
                    "unknown filer store {section}"
                )));
            }
            if let Some(first) = enabled {
                warn!(first, second = section, "more than one filer store is enabled");
                return Err(FilerError::Configuration(format!(
                    "filer store is enabled for both {first} and {section}"
                )));
            }
            enabled = Some(section);
        }
        enabled.map(str::to_string).ok_or_else(|| {
            let known: Vec<&str> = self.names().collect();
            warn!(known = ?known, "no filer store is enabled");
            FilerError::Configuration(format!(
                "no filer store enabled; set enabled = true in one of: {}",
                known.join(", ")
            ))
        })
    }

    /// Construct, initialize and wrap the backend enabled in `config`.
    ///
    /// The backend receives only its own section (`config.section(name)`).
    pub async fn load(
        &self,
        config: &Configuration,
        transform: Arc<dyn ChunkTransform>,
    ) -> Result<FilerStoreWrapper, FilerError> {
        let name = self.enabled_store(config)?;
        let mut store = self.create(&name)?;
        store.initialize(&config.section(&name)).await?;
        info!(store = %name, "configured filer store");
        Ok(FilerStoreWrapper::new(store, transform))
    }
}

fn new_memory_store() -> Box<dyn FilerStore> {
    Box::new(MemoryStore::new())
}
