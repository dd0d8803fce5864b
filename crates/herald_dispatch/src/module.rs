//! Generic module registry.
//!
//! Commands and inhibitors are both modules: addressable by id and grouped
//! into categories. [`ModuleRegistry`] owns that bookkeeping and nothing
//! else; loading modules from disk is the caller's concern.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use herald_foundation::{Error, Result};
use tracing::debug;

/// Category used when a module does not name one.
pub const DEFAULT_CATEGORY: &str = "default";

/// Something that can be registered in a [`ModuleRegistry`].
pub trait Module: Send + Sync {
    /// Unique id within its registry.
    fn id(&self) -> &str;

    /// Declared category.
    fn category(&self) -> &str {
        DEFAULT_CATEGORY
    }
}

/// Produces a fresh instance of a module during reload.
///
/// Receives the current instance and the path it was registered from.
pub type Reloader<'a, M> = dyn Fn(&Arc<M>, Option<&Path>) -> Result<Arc<M>> + 'a;

// =============================================================================
// Category
// =============================================================================

/// A named group of modules.
pub struct Category<M: ?Sized> {
    id: String,
    modules: BTreeMap<String, Arc<M>>,
}

impl<M: Module + ?Sized> Category<M> {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            modules: BTreeMap::new(),
        }
    }

    /// Category id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets a module in this category.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<M>> {
        self.modules.get(id)
    }

    /// Module ids in this category, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Modules in this category, sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<M>> {
        self.modules.values()
    }

    /// Number of modules in this category.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the category holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<M: ?Sized> std::fmt::Debug for Category<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// ModuleRegistry
// =============================================================================

struct Entry<M: ?Sized> {
    module: Arc<M>,
    category: String,
    filepath: Option<PathBuf>,
}

/// Registry of modules by id and category.
pub struct ModuleRegistry<M: ?Sized> {
    modules: HashMap<String, Entry<M>>,
    categories: BTreeMap<String, Category<M>>,
    /// Derive categories from the parent directory of the module's path.
    automate_categories: bool,
}

impl<M: Module + ?Sized> Default for ModuleRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Module + ?Sized> ModuleRegistry<M> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            categories: BTreeMap::new(),
            automate_categories: false,
        }
    }

    /// Builder method to derive categories from file paths.
    #[must_use]
    pub fn with_automate_categories(mut self, automate: bool) -> Self {
        self.automate_categories = automate;
        self
    }

    /// Registers a module.
    ///
    /// The category is the parent directory name of `filepath` when
    /// automated categories are on, otherwise the module's own category.
    /// Categories are created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateModule`](herald_foundation::ErrorKind::DuplicateModule)
    /// if the id is taken.
    pub fn register(&mut self, module: Arc<M>, filepath: Option<PathBuf>) -> Result<()> {
        let id = module.id().to_string();
        if self.modules.contains_key(&id) {
            return Err(Error::duplicate_module(id));
        }

        let category = self.category_for(&module, filepath.as_deref());
        debug!(module = %id, category = %category, "registering module");

        self.categories
            .entry(category.clone())
            .or_insert_with(|| Category::new(category.clone()))
            .modules
            .insert(id.clone(), Arc::clone(&module));
        self.modules.insert(
            id,
            Entry {
                module,
                category,
                filepath,
            },
        );
        Ok(())
    }

    fn category_for(&self, module: &M, filepath: Option<&Path>) -> String {
        let from_path = filepath
            .filter(|_| self.automate_categories)
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str());
        match from_path {
            Some(dir) => dir.to_string(),
            None if module.category().is_empty() => DEFAULT_CATEGORY.to_string(),
            None => module.category().to_string(),
        }
    }

    /// Removes a module from the registry and its category. Returns the
    /// module, or `None` if the id was not registered.
    pub fn deregister(&mut self, id: &str) -> Option<Arc<M>> {
        let entry = self.modules.remove(id)?;
        if let Some(category) = self.categories.get_mut(&entry.category) {
            category.modules.remove(id);
        }
        debug!(module = %id, "deregistered module");
        Some(entry.module)
    }

    /// Removes a module.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleNotFound`](herald_foundation::ErrorKind::ModuleNotFound)
    /// if the id is not registered.
    pub fn remove(&mut self, id: &str) -> Result<Arc<M>> {
        self.deregister(id)
            .ok_or_else(|| Error::module_not_found(id))
    }

    /// Removes every module, returning them.
    pub fn remove_all(&mut self) -> Vec<Arc<M>> {
        let ids: Vec<String> = self.modules.keys().cloned().collect();
        ids.iter().filter_map(|id| self.deregister(id)).collect()
    }

    /// Replaces a module with a fresh instance from `reloader`, keeping its
    /// file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown, if the reloader fails (the old
    /// module stays registered), or if the fresh instance's id collides with
    /// another module.
    pub fn reload(&mut self, id: &str, reloader: &Reloader<'_, M>) -> Result<Arc<M>> {
        let (current, filepath) = match self.modules.get(id) {
            Some(entry) => (Arc::clone(&entry.module), entry.filepath.clone()),
            None => return Err(Error::module_not_found(id)),
        };

        let fresh = reloader(&current, filepath.as_deref())?;
        self.deregister(id);
        if let Err(err) = self.register(Arc::clone(&fresh), filepath.clone()) {
            self.register(current, filepath)?;
            return Err(err);
        }
        Ok(fresh)
    }

    /// Reloads every module.
    ///
    /// # Errors
    ///
    /// Stops at the first failing reload.
    pub fn reload_all(&mut self, reloader: &Reloader<'_, M>) -> Result<Vec<Arc<M>>> {
        let mut ids: Vec<String> = self.modules.keys().cloned().collect();
        ids.sort();
        ids.iter().map(|id| self.reload(id, reloader)).collect()
    }

    /// Gets a module by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<M>> {
        self.modules.get(id).map(|e| &e.module)
    }

    /// Returns true if the id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// The category a registered module landed in.
    #[must_use]
    pub fn category_of(&self, id: &str) -> Option<&str> {
        self.modules.get(id).map(|e| e.category.as_str())
    }

    /// The file path a module was registered from.
    #[must_use]
    pub fn filepath_of(&self, id: &str) -> Option<&Path> {
        self.modules.get(id).and_then(|e| e.filepath.as_deref())
    }

    /// Finds a category by id, ignoring case.
    #[must_use]
    pub fn find_category(&self, name: &str) -> Option<&Category<M>> {
        self.categories
            .values()
            .find(|c| c.id.to_lowercase() == name.to_lowercase())
    }

    /// All categories, sorted by id.
    pub fn categories(&self) -> impl Iterator<Item = &Category<M>> {
        self.categories.values()
    }

    /// All modules, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<M>> {
        self.modules.values().map(|e| &e.module)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<M: ?Sized> std::fmt::Debug for ModuleRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("categories", &self.categories.keys().collect::<Vec<_>>())
            .field("automate_categories", &self.automate_categories)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
