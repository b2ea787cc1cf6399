use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::domain::{VOLUME_EXT, VolumeName};
use crate::error::{DumpError, Result};

/// Scan `dir` (not recursively) for volumes and return them in replay order:
/// by table name, then by volume index. Files without the `.sql` extension
/// are not volumes and are skipped; a `.sql` file whose name does not parse
/// as `<table>#<index>.sql` fails the scan.
pub fn locate(dir: &Path) -> Result<Vec<VolumeName>> {
    let mut volumes = Vec::new();
    for e in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let e = e.map_err(std::io::Error::from)?;
        if !e.file_type().is_file() {
            continue;
        }
        let is_volume = Path::new(e.file_name())
            .extension()
            .is_some_and(|ext| ext == VOLUME_EXT);
        if !is_volume {
            debug!(file = %e.file_name().to_string_lossy(), "skipping non-volume file");
            continue;
        }
        // a lossy name would point at a file that does not exist
        let name = e.file_name().to_str().ok_or_else(|| {
            DumpError::MalformedVolume(e.file_name().to_string_lossy().into_owned())
        })?;
        volumes.push(name.parse::<VolumeName>()?);
    }
    volumes.sort();
    Ok(volumes)
}
