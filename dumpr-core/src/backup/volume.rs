use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::VolumeName;
use crate::error::Result;

/// Appends statements to `<dir>/<table>#<index>.sql` and decides when the
/// active volume is full.
pub struct VolumeWriter {
    dir: PathBuf,
    limit: u64,
}

impl VolumeWriter {
    /// `limit` is the rollover threshold in bytes. The directory is created
    /// if it does not exist yet.
    pub fn open(dir: &Path, limit: u64) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            limit,
        })
    }

    pub fn path_of(&self, volume: &VolumeName) -> PathBuf {
        self.dir.join(volume.file_name())
    }

    /// Current on-disk size; a volume that was never written is empty.
    pub fn size_of(&self, volume: &VolumeName) -> Result<u64> {
        match fs::metadata(self.path_of(volume)) {
            Ok(md) => Ok(md.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Cut `volume` back to `len` bytes, dropping whatever a failed or
    /// replayed tick left past the last recorded position.
    pub fn rewind(&self, volume: &VolumeName, len: u64) -> Result<()> {
        let f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.path_of(volume))?;
        if f.metadata()?.len() > len {
            f.set_len(len)?;
        }
        Ok(())
    }

    /// Append `text`, creating the file on first use. Returns the new size.
    pub fn append(&self, volume: &VolumeName, text: &str) -> Result<u64> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_of(volume))?;
        f.write_all(text.as_bytes())?;
        f.flush()?;
        Ok(f.metadata()?.len())
    }

    /// Remove volumes of `first.table` numbered after `first`, left over from
    /// an earlier, longer backup into the same directory.
    pub fn discard_after(&self, first: &VolumeName) -> Result<usize> {
        let mut removed = 0;
        let mut v = first.next();
        loop {
            match fs::remove_file(self.path_of(&v)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
            v = v.next();
        }
        if removed > 0 {
            info!(table = %first.table, removed, "discarded stale volumes");
        }
        Ok(removed)
    }

    /// The volume the next append should go to: `volume` itself, or its
    /// successor once `volume` has reached the size limit. A full volume is
    /// left sealed as is.
    pub fn check_rollover(&self, volume: &VolumeName) -> Result<VolumeName> {
        let size = self.size_of(volume)?;
        if size >= self.limit {
            let next = volume.next();
            info!(sealed = %volume, size, next = %next, "volume full, rolling over");
            return Ok(next);
        }
        Ok(volume.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vol(s: &str) -> VolumeName {
        s.parse().unwrap()
    }

    #[test]
    fn append_creates_then_grows() {
        let tmp = tempfile::tempdir().unwrap();
        let w = VolumeWriter::open(tmp.path(), 1024).unwrap();
        let v = vol("t#0.sql");
        assert_eq!(w.size_of(&v).unwrap(), 0);
        assert_eq!(w.append(&v, "abc;\n").unwrap(), 5);
        assert_eq!(w.append(&v, "de;\n").unwrap(), 9);
        assert_eq!(fs::read_to_string(w.path_of(&v)).unwrap(), "abc;\nde;\n");
    }

    #[test]
    fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("backup");
        let w = VolumeWriter::open(&dir, 1024).unwrap();
        w.append(&vol("t#0.sql"), "x;\n").unwrap();
        assert!(dir.join("t#0.sql").is_file());
    }

    #[test]
    fn rolls_over_once_limit_is_reached() {
        let tmp = tempfile::tempdir().unwrap();
        let w = VolumeWriter::open(tmp.path(), 10).unwrap();
        let v = vol("t#0.sql");

        w.append(&v, "12345;\n").unwrap();
        assert_eq!(w.check_rollover(&v).unwrap(), v);

        w.append(&v, "678;\n").unwrap();
        let next = w.check_rollover(&v).unwrap();
        assert_eq!(next, vol("t#1.sql"));
        // sealed volume is untouched
        assert_eq!(w.size_of(&v).unwrap(), 12);
        assert_eq!(w.size_of(&next).unwrap(), 0);
    }

    #[test]
    fn discards_stale_trailing_volumes() {
        let tmp = tempfile::tempdir().unwrap();
        let w = VolumeWriter::open(tmp.path(), 1024).unwrap();
        for n in ["t#0.sql", "t#1.sql", "t#2.sql", "u#1.sql"] {
            w.append(&vol(n), "x;\n").unwrap();
        }
        assert_eq!(w.discard_after(&vol("t#0.sql")).unwrap(), 2);
        assert!(tmp.path().join("t#0.sql").is_file());
        assert!(!tmp.path().join("t#1.sql").exists());
        assert!(tmp.path().join("u#1.sql").is_file());
        assert_eq!(w.discard_after(&vol("t#0.sql")).unwrap(), 0);
    }

    #[test]
    fn rewind_drops_bytes_past_recorded_length() {
        let tmp = tempfile::tempdir().unwrap();
        let w = VolumeWriter::open(tmp.path(), 1024).unwrap();
        let v = vol("t#0.sql");
        w.append(&v, "keep;\nstale;\n").unwrap();

        w.rewind(&v, 6).unwrap();
        assert_eq!(fs::read_to_string(w.path_of(&v)).unwrap(), "keep;\n");

        // never extends a shorter file
        w.rewind(&v, 100).unwrap();
        assert_eq!(w.size_of(&v).unwrap(), 6);
    }
}
