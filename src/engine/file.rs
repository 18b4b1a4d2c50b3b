use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::Directory;
use crate::command::SEPARATOR;
use crate::error::{PhonebookError, Result};

/// Reads and writes a [`Directory`] as newline delimited `key|phone` records.
///
/// The `FileStore` does not own any directory state, it only serializes the snapshot it is
/// given.
#[derive(Debug, Clone)]
pub struct FileStore {
    // path of the directory file
    path: PathBuf,
}

impl FileStore {
    /// creates a `FileStore` backed by the file at `path`. The file is not touched until the
    /// first [`load`] or [`save`]
    ///
    /// [`load`]: #method.load
    /// [`save`]: #method.save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    /// the path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// loads the directory from the backing file.
    ///
    /// A missing file yields an empty directory. Lines that are not valid UTF-8, or that do not
    /// hold exactly one separator with a non-blank key and phone on either side, are skipped.
    ///
    /// # Errors
    /// IO errors other than "not found" are returned
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> Result<Directory> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no directory file found, starting with an empty phonebook");
                return Ok(Directory::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut directory = Directory::new();
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line,
                Err(_) => {
                    debug!("skipping record that is not valid UTF-8: {:?}", raw);
                    continue;
                }
            };
            match parse_record(line) {
                Some((key, phone)) => {
                    directory.insert(key, phone);
                }
                None if line.trim().is_empty() => {}
                None => debug!("skipping malformed record: {:?}", line),
            }
        }
        info!("loaded {} contacts", directory.len());
        Ok(directory)
    }

    /// overwrites the backing file with every entry of `directory`, in directory order.
    ///
    /// The records are written to a sibling temp file that is then renamed over the backing
    /// file, so readers never observe a partially written directory.
    ///
    /// # Errors
    /// returns [`PhonebookError::Persistence`] if the file could not be written
    pub fn save(&self, directory: &Directory) -> Result<()> {
        self.write_snapshot(directory)
            .map_err(|source| PhonebookError::Persistence {
                path: self.path.clone(),
                source,
            })?;
        debug!("saved {} contacts to {:?}", directory.len(), &self.path);
        Ok(())
    }

    fn write_snapshot(&self, directory: &Directory) -> io::Result<()> {
        let tmp_path = self.tmp_path();
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for (key, phone) in directory.iter() {
            writeln!(writer, "{}{}{}", key, SEPARATOR, phone)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, &self.path)
    }

    // the backing file name with ".tmp" appended
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// parses a `key|phone` line into its trimmed parts
fn parse_record(line: &str) -> Option<(String, String)> {
    let mut parts = line.trim().split(SEPARATOR);
    let key = parts.next()?.trim();
    let phone = parts.next()?.trim();
    if parts.next().is_some() || key.is_empty() || phone.is_empty() {
        return None;
    }
    Some((key.to_string(), phone.to_string()))
}
