use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::{builtin, canonical_name, ThemeSpec};
use crate::error::{Error, Result};

/// Named themes, in registration order.
///
/// Lookups take a shared lock and hand out `Arc`s, so a render never holds
/// the lock while it works.
#[derive(Default)]
pub struct ThemeRegistry {
    themes: RwLock<Vec<Arc<ThemeSpec>>>,
}

static GLOBAL: OnceLock<ThemeRegistry> = OnceLock::new();

impl ThemeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in themes.
    pub fn with_builtins() -> Self {
        let themes = builtin::all().into_iter().map(Arc::new).collect();
        Self { themes: RwLock::new(themes) }
    }

    /// The process-wide registry, seeded with the built-in themes on first use.
    pub fn global() -> &'static ThemeRegistry {
        GLOBAL.get_or_init(ThemeRegistry::with_builtins)
    }

    /// Add a theme or replace one of the same name.
    ///
    /// Replacing is refused when it would switch the theme between linear and
    /// polar coordinates.
    pub fn register(&self, name: &str, mut spec: ThemeSpec) -> Result<()> {
        let name = canonical_name(name);
        if name.is_empty() {
            return Err(Error::InvalidParameters("theme name must not be empty".into()));
        }
        spec.name = name.clone();
        spec.validate()?;

        let mut themes = self.themes.write();
        match themes.iter().position(|t| t.name == name) {
            Some(i) => {
                if !themes[i].coordinates.same_kind(&spec.coordinates) {
                    return Err(Error::ThemeConflict(name));
                }
                log::debug!("replacing theme {name}");
                themes[i] = Arc::new(spec);
            }
            None => {
                log::debug!("registering theme {name}");
                themes.push(Arc::new(spec));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<ThemeSpec>> {
        let name = canonical_name(name);
        self.themes
            .read()
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or(Error::UnknownTheme(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.themes.read().iter().map(|t| t.name.clone()).collect()
    }

    /// Snapshot of every theme, in registration order.
    pub fn all(&self) -> Vec<Arc<ThemeSpec>> {
        self.themes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.themes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.read().is_empty()
    }

    /// Register every theme in a JSON array of theme records.
    ///
    /// The whole document is parsed and validated before anything is
    /// registered. Returns the registered names.
    pub fn load_json(&self, text: &str) -> Result<Vec<String>> {
        let specs: Vec<ThemeSpec> = serde_json::from_str(text)?;
        for spec in &specs {
            spec.validate()?;
        }
        let mut names = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name.clone();
            self.register(&name, spec)?;
            names.push(canonical_name(&name));
        }
        Ok(names)
    }
}
