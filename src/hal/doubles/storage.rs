use crate::hal::storage::{Error, FileSystem, Mode};
use std::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

/// In-memory filesystem standing in for a mounted SD card.
#[derive(Clone, Debug, Default)]
pub struct FakeFileSystem {
    pub files: BTreeMap<String, Vec<u8>>,
    pub mounted: bool,
    /// Error returned by `mount`, simulating a missing card or filesystem.
    pub mount_error: Option<Error>,
    /// Reads of the named file fail once this many bytes have been read.
    pub read_failure: Option<(String, usize)>,
    pub open_handles: usize,
    /// Every mutating operation, in order (`"delete old"`, `"rename fw.bin old"`...).
    pub operations: Vec<String>,
}

#[derive(Debug)]
pub struct FakeFile {
    name: String,
    position: usize,
    mode: Mode,
}

impl FakeFileSystem {
    pub fn with_files<'a, I: IntoIterator<Item = (&'a str, Vec<u8>)>>(files: I) -> Self {
        Self {
            files: files.into_iter().map(|(name, bytes)| (name.to_string(), bytes)).collect(),
            ..Default::default()
        }
    }

    pub fn unavailable(error: Error) -> Self { Self { mount_error: Some(error), ..Default::default() } }

    pub fn fail_reads_after(mut self, name: &str, bytes: usize) -> Self {
        self.read_failure = Some((name.to_string(), bytes));
        self
    }

    pub fn contains(&self, name: &str) -> bool { self.files.contains_key(name) }
}

impl FileSystem for FakeFileSystem {
    type File = FakeFile;

    fn mount(&mut self) -> Result<(), Error> {
        if let Some(error) = self.mount_error {
            return Err(error);
        }
        self.mounted = true;
        Ok(())
    }

    fn open(&mut self, name: &str, mode: Mode) -> Result<FakeFile, Error> {
        if !self.mounted {
            return Err(Error::NotReady);
        }
        let exists = self.files.contains_key(name);
        if mode.contains(Mode::CREATE_NEW) {
            if exists {
                return Err(Error::Exists);
            }
            self.files.insert(name.to_string(), Vec::new());
            self.operations.push(format!("create {}", name));
        } else if !exists {
            return Err(Error::NotFound);
        }
        self.open_handles += 1;
        Ok(FakeFile { name: name.to_string(), position: 0, mode })
    }

    fn read(&mut self, file: &mut FakeFile, buffer: &mut [u8]) -> Result<usize, Error> {
        if !file.mode.contains(Mode::READ) {
            return Err(Error::Denied);
        }
        if let Some((name, limit)) = &self.read_failure {
            if *name == file.name && file.position >= *limit {
                return Err(Error::Io);
            }
        }
        let contents = self.files.get(&file.name).ok_or(Error::NotFound)?;
        let remaining = &contents[file.position.min(contents.len())..];
        let count = remaining.len().min(buffer.len());
        buffer[..count].copy_from_slice(&remaining[..count]);
        file.position += count;
        Ok(count)
    }

    fn write(&mut self, file: &mut FakeFile, bytes: &[u8]) -> Result<usize, Error> {
        if !file.mode.contains(Mode::WRITE) {
            return Err(Error::Denied);
        }
        let contents = self.files.get_mut(&file.name).ok_or(Error::NotFound)?;
        contents.extend_from_slice(bytes);
        file.position += bytes.len();
        Ok(bytes.len())
    }

    fn close(&mut self, _file: FakeFile) -> Result<(), Error> {
        self.open_handles = self.open_handles.saturating_sub(1);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), Error> {
        self.files.remove(name).ok_or(Error::NotFound)?;
        self.operations.push(format!("delete {}", name));
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), Error> {
        if self.files.contains_key(to) {
            return Err(Error::Exists);
        }
        let contents = self.files.remove(from).ok_or(Error::NotFound)?;
        self.files.insert(to.to_string(), contents);
        self.operations.push(format!("rename {} {}", from, to));
        Ok(())
    }

    fn size(&self, file: &FakeFile) -> u64 {
        self.files.get(&file.name).map(|contents| contents.len() as u64).unwrap_or(0)
    }
}
