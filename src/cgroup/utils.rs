use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::container::{Error, Result};
use crate::fsutil;

/// Opens `path` and applies `reader` to it.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_optional<T>(
    path: &Path,
    reader: impl FnOnce(&mut BufReader<File>) -> std::io::Result<T>,
) -> Result<Option<T>> {
    let Some(mut file) = fsutil::open_optional_reader(path)? else {
        return Ok(None);
    };
    reader(&mut file)
        .map(Some)
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Returns the first pid listed in a `cgroup.procs` file, if any.
pub fn read_first_pid(path: &Path) -> Result<Option<u32>> {
    let pid = read_optional(path, |buf| {
        for line in buf.lines() {
            if let Ok(pid) = line?.trim().parse::<u32>() {
                return Ok(Some(pid));
            }
        }
        Ok(None)
    })?;
    Ok(pid.flatten())
}
