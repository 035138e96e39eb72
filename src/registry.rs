use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::backend::{
    indexed::IndexedBackend, indexed_rle::IndexedRleBackend, true_colour::TrueColourBackend,
    Backend, ErasedBackend,
};

#[derive(Debug, thiserror::Error)]
#[error("no blitter backend named '{0}'")]
pub struct NoSuchBackend(pub String);

/// Backend selection as stored in the user's configuration.
///
/// An empty `backend` or `autodetect = true` picks the default backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub backend: String,
    pub autodetect: bool,
}

struct Factory {
    name: &'static str,
    description: &'static str,
    create: fn() -> Box<dyn ErasedBackend>,
}

fn create<B: Backend + Default>() -> Box<dyn ErasedBackend> {
    Box::new(B::default())
}

static FACTORIES: [Factory; 3] = [
    Factory {
        name: IndexedRleBackend::NAME,
        description: "8bpp blitter optimised for speed",
        create: create::<IndexedRleBackend>,
    },
    Factory {
        name: IndexedBackend::NAME,
        description: "8bpp blitter storing sprites uncompressed",
        create: create::<IndexedBackend>,
    },
    Factory {
        name: TrueColourBackend::NAME,
        description: "32bpp blitter storing sprites uncompressed",
        create: create::<TrueColourBackend>,
    },
];

/// The factory picked when no backend is requested.
fn default_factory() -> &'static Factory {
    &FACTORIES[0]
}

static BY_NAME: Lazy<AHashMap<String, &'static Factory>> = Lazy::new(|| {
    FACTORIES
        .iter()
        .map(|factory| (factory.name.to_ascii_lowercase(), factory))
        .collect()
});

fn lookup(name: &str) -> Option<&'static Factory> {
    BY_NAME.get(&name.to_ascii_lowercase()).copied()
}

/// Owns the active backend and replaces it on request.
///
/// Selection takes `&mut self`, so it can never overlap a draw call
/// that borrows the active backend.
#[derive(Default)]
pub struct BackendRegistry {
    active: Option<Box<dyn ErasedBackend>>,
    autodetected: bool,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry and selects the backend named in `config`.
    ///
    /// An unknown name is logged and the default backend is used instead.
    pub fn from_config(config: &BackendConfig) -> Self {
        let mut registry = Self::new();
        let factory = if config.autodetect || config.backend.is_empty() {
            None
        } else {
            let factory = lookup(&config.backend);
            if factory.is_none() {
                log::warn!(
                    "Configured blitter backend '{}' does not exist, autodetecting",
                    config.backend
                );
            }
            factory
        };

        match factory {
            Some(factory) => registry.activate(factory, false),
            None => registry.activate(default_factory(), true),
        };
        registry
    }

    /// Makes the backend called `name` active.
    ///
    /// The name is matched case-insensitively. An empty name picks the
    /// default backend. Selecting the active backend again keeps the
    /// existing instance; an unknown name leaves it untouched.
    pub fn select(&mut self, name: &str) -> Result<&mut dyn ErasedBackend, NoSuchBackend> {
        if name.is_empty() {
            return Ok(self.activate(default_factory(), true));
        }
        let factory = lookup(name).ok_or_else(|| NoSuchBackend(name.to_owned()))?;
        Ok(self.activate(factory, false))
    }

    fn activate(
        &mut self,
        factory: &'static Factory,
        autodetected: bool,
    ) -> &mut dyn ErasedBackend {
        self.autodetected = autodetected;
        if self.name() != Some(factory.name) {
            log::info!("Using blitter backend '{}'", factory.name);
            self.active = None;
        }
        &mut **self.active.get_or_insert_with(factory.create)
    }

    /// The active backend, if one was selected.
    pub fn get(&self) -> Option<&dyn ErasedBackend> {
        self.active.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut dyn ErasedBackend> {
        self.active.as_deref_mut()
    }

    /// Name of the active backend.
    pub fn name(&self) -> Option<&'static str> {
        self.get().map(|backend| backend.name())
    }

    /// Whether the active backend was chosen without being asked for by name.
    pub fn autodetected(&self) -> bool {
        self.autodetected
    }

    /// Names of all known backends, the default first.
    pub fn list() -> Vec<&'static str> {
        FACTORIES.iter().map(|factory| factory.name).collect()
    }

    /// A human-readable description of a backend.
    pub fn describe(name: &str) -> Option<&'static str> {
        lookup(name).map(|factory| factory.description)
    }
}
