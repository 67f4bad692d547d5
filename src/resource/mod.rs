//! Namespaced resources on disk.
//!
//! Resources are addressed by a [`ResourceLocation`] (`namespace:path`) and
//! live under `root/<namespace>/<folder>/<path>`, where the folder is one of
//! the [`SourceFolder`]s.

pub mod textures;

pub use textures::*;

use std::{
    borrow::Borrow,
    fmt,
    fs::File,
    hash::Hash,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
};

use fxhash::FxHashMap;

use crate::error::{RenderError, RenderResult};

/// A namespace plus a `/` separated path inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    namespace: String,
    path: String,
}

impl ResourceLocation {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The location of `file_name` inside this location, treated as a folder.
    pub fn location_of_file(&self, file_name: &str) -> Self {
        let path = if self.path.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{file_name}", self.path)
        };
        Self::new(self.namespace.clone(), path)
    }
}

impl FromStr for ResourceLocation {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, path))
                if !namespace.is_empty() && !path.is_empty() && !path.contains(':') =>
            {
                Ok(Self::new(namespace, path))
            }
            _ => Err(RenderError::configuration(format!(
                "'{s}' is not a resource location, expected 'namespace:path'"
            ))),
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// The kind of resource, which decides the folder it is looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFolder {
    Shaders,
    Textures,
    Models,
}

impl SourceFolder {
    pub const fn folder_name(self) -> &'static str {
        match self {
            SourceFolder::Shaders => "shaders",
            SourceFolder::Textures => "textures",
            SourceFolder::Models => "models",
        }
    }
}

/// Resolves resource locations against a root directory.
#[derive(Clone, Debug)]
pub struct ResourceLoader {
    root: PathBuf,
}

impl ResourceLoader {
    /// The root does not need to exist, lookups simply find nothing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `folder` inside `namespace`.
    pub fn folder_path(&self, namespace: &str, folder: SourceFolder) -> PathBuf {
        self.root.join(namespace).join(folder.folder_name())
    }

    /// Full file system path of a resource.
    pub fn resolve(&self, folder: SourceFolder, location: &ResourceLocation) -> PathBuf {
        let mut path = self.folder_path(location.namespace(), folder);
        path.extend(location.path().split('/').filter(|part| !part.is_empty()));
        path
    }

    /// Names of the files directly inside `location`, sorted.
    pub fn list_files(
        &self,
        folder: SourceFolder,
        location: &ResourceLocation,
    ) -> RenderResult<Vec<String>> {
        self.list(folder, location, |path| path.is_file())
    }

    /// Names of the folders directly inside `location`, sorted.
    pub fn list_folders(
        &self,
        folder: SourceFolder,
        location: &ResourceLocation,
    ) -> RenderResult<Vec<String>> {
        self.list(folder, location, |path| path.is_dir())
    }

    fn list(
        &self,
        folder: SourceFolder,
        location: &ResourceLocation,
        keep: impl Fn(&Path) -> bool,
    ) -> RenderResult<Vec<String>> {
        let dir = self.resolve(folder, location);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !keep(&entry.path()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_owned());
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Opens a resource for reading.
    pub fn open(&self, folder: SourceFolder, location: &ResourceLocation) -> RenderResult<BufReader<File>> {
        Ok(BufReader::new(File::open(self.resolve(folder, location))?))
    }

    pub fn read_to_string(&self, folder: SourceFolder, location: &ResourceLocation) -> RenderResult<String> {
        Ok(std::fs::read_to_string(self.resolve(folder, location))?)
    }

    pub fn exists(&self, folder: SourceFolder, location: &ResourceLocation) -> bool {
        self.resolve(folder, location).exists()
    }
}

/// A keyed store of loaded resources with explicit eviction.
#[derive(Debug)]
pub struct ResourceCache<K, V> {
    entries: FxHashMap<K, V>,
}

impl<K, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get_mut(key)
    }

    /// Returns the cached value, creating it with `create` on a miss.
    /// A failed creation caches nothing.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        create: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<&mut V, E> {
        use std::collections::hash_map::Entry;

        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let value = create(entry.key())?;
                Ok(entry.insert(value))
            }
        }
    }

    /// Stores `value`, returning whatever was cached under `key` before.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn evict<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
