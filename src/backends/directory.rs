//! A directory-tree `ResourceLoader` backend (spec §6).

use crate::error::ModuleResult;
use crate::resource::{Resource, ResourceLoader, Symbol};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct DirectoryResourceLoader {
    root: PathBuf,
}

impl DirectoryResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn paths(&self) -> ModuleResult<HashSet<String>> {
        let mut paths = HashSet::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
        {
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                paths.insert(to_slash(relative));
            }
        }
        Ok(paths)
    }

    fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        let relative = PathBuf::from(name.replace('.', "/"));
        Ok(read_file(&self.root.join(&relative))?.map(|data| Symbol {
            name: name.to_string(),
            data: data.into(),
        }))
    }

    fn load_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        Ok(read_file(&self.root.join(path))?.map(|data| Resource {
            path: path.to_string(),
            data: data.into(),
        }))
    }

    fn load_resources(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        let dir = self.root.join(path);
        if !dir.is_dir() {
            return Ok(self.load_resource(path)?.into_iter().collect());
        }

        let mut resources = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            resources.push(Resource {
                path: to_slash(relative),
                data: std::fs::read(entry.path())?.into(),
            });
        }
        Ok(resources)
    }
}

fn read_file(path: &Path) -> ModuleResult<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_symbol_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("org/acme")).unwrap();
        std::fs::write(dir.path().join("org/acme/Widget"), b"class body").unwrap();

        let loader = DirectoryResourceLoader::new(dir.path());
        let symbol = loader.load_symbol("org.acme.Widget").unwrap().unwrap();
        assert_eq!(&*symbol.data, b"class body");
        assert!(loader.load_symbol("org.acme.Missing").unwrap().is_none());
    }

    #[test]
    fn paths_enumerates_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/file.txt"), b"x").unwrap();

        let loader = DirectoryResourceLoader::new(dir.path());
        let paths = loader.paths().unwrap();
        assert!(paths.contains("a/b"));
        assert!(paths.contains("a"));
        assert!(!paths.contains("a/b/file.txt"));
    }

    #[test]
    fn load_resources_lists_immediate_children() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("res")).unwrap();
        std::fs::write(dir.path().join("res/a.properties"), b"1").unwrap();
        std::fs::write(dir.path().join("res/b.properties"), b"2").unwrap();

        let loader = DirectoryResourceLoader::new(dir.path());
        let mut resources = loader.load_resources("res").unwrap();
        resources.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].path, "res/a.properties");
    }
}
