use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Opening a file failed for a reason other than it being absent.
#[derive(Debug, thiserror::Error)]
#[error("failed to open `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens `path` for buffered reading, mapping a missing file to `Ok(None)`.
///
/// Controllers expose different files depending on kernel version and configuration,
/// so absence is expected.
///
/// # Example
/// ```no_run
/// # use creo_housekeeper::fsutil;
/// if let Some(reader) = fsutil::open_optional_reader("/sys/fs/cgroup/memory/memory.stat")? {
///     // parse
/// #   drop(reader);
/// }
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_optional_reader(
    path: impl AsRef<Path>,
) -> Result<Option<BufReader<File>>, FileOpenError> {
    let path = path.as_ref();
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FileOpenError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let reader = open_optional_reader(dir.path().join("memory.stat")).unwrap();
        assert!(reader.is_none());
    }

    #[test]
    fn test_existing_file_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.usage_in_bytes");
        std::fs::write(&path, "4096\n").unwrap();

        let mut content = String::new();
        open_optional_reader(&path)
            .unwrap()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "4096\n");
    }

    #[test]
    fn test_path_below_regular_file_is_an_error() {
        // ENOTDIR, not ENOENT.
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = open_optional_reader(file.path().join("child")).unwrap_err();
        assert_eq!(err.path, file.path().join("child"));
        assert_ne!(err.source.kind(), io::ErrorKind::NotFound);
    }
}
