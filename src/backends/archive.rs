//! An archive-file `ResourceLoader` backend (spec §6), backed by the
//! `zip` crate. Directory paths are enumerated once at open time (archive
//! entry lists are immutable for the lifetime of the file handle); entry
//! bodies are read lazily, guarded by a mutex since `ZipArchive` needs
//! `&mut` access to extract an entry.

use crate::error::{ModuleError, ModuleResult};
use crate::resource::{Resource, ResourceLoader, Symbol};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;
use zip::ZipArchive;

pub struct ArchiveResourceLoader {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
    directories: HashSet<String>,
}

impl ArchiveResourceLoader {
    pub fn open(path: impl Into<PathBuf>) -> ModuleResult<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| ModuleError::archive(&path, e.to_string()))?;

        let mut directories = HashSet::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| ModuleError::archive(&path, e.to_string()))?;
            let name = entry.name().trim_end_matches('/');
            match name.rsplit_once('/') {
                Some((dir, _)) => {
                    directories.insert(dir.to_string());
                }
                None if !entry.is_dir() => {
                    directories.insert(String::new());
                }
                None => {}
            }
        }

        Ok(Self {
            path,
            archive: Mutex::new(archive),
            directories,
        })
    }

    fn read_entry(&self, name: &str) -> ModuleResult<Option<Vec<u8>>> {
        let mut archive = self.archive.lock().unwrap();
        match archive.by_name(name) {
            Ok(mut entry) => {
                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data)?;
                Ok(Some(data))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(ModuleError::archive(&self.path, e.to_string())),
        }
    }
}

impl fmt::Debug for ArchiveResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveResourceLoader")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ResourceLoader for ArchiveResourceLoader {
    fn paths(&self) -> ModuleResult<HashSet<String>> {
        Ok(self.directories.clone())
    }

    fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        let relative = name.replace('.', "/");
        Ok(self.read_entry(&relative)?.map(|data| Symbol {
            name: name.to_string(),
            data: data.into(),
        }))
    }

    fn load_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        Ok(self.read_entry(path)?.map(|data| Resource {
            path: path.to_string(),
            data: data.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn sample_archive() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.keep().join("sample.jar");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        writer.start_file("org/acme/Widget", options).unwrap();
        writer.write_all(b"class body").unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn loads_symbol_from_archive_entry() {
        let loader = ArchiveResourceLoader::open(sample_archive()).unwrap();
        let symbol = loader.load_symbol("org.acme.Widget").unwrap().unwrap();
        assert_eq!(&*symbol.data, b"class body");
        assert!(loader.load_symbol("org.acme.Missing").unwrap().is_none());
    }

    #[test]
    fn paths_reports_containing_directory() {
        let loader = ArchiveResourceLoader::open(sample_archive()).unwrap();
        assert!(loader.paths().unwrap().contains("org/acme"));
    }
}
