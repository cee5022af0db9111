use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use policydb_core::{Error, Result};

/// Round to three decimal places.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Write `summary` as pretty JSON, replacing `path` atomically.
pub fn write_summary<T: Serialize>(path: &Path, summary: &T) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), summary)?;
    tmp.as_file_mut().write_all(b"\n").map_err(|e| Error::io(path, e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_three_places() {
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(0.5), 0.5);
        assert_eq!(round3(0.0), 0.0);
    }
}
