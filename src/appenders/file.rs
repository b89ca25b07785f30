//! Date-stamped append-only file sink
//!
//! Files are named `<YYYY-MM-DD>:<logical name>.txt` inside the configured
//! directory. Rotation closes the current handle and reopens under the current
//! date, so it only changes files when the date has changed.

use crate::core::timestamp::today;
use crate::core::{Appender, LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub struct FileSink {
    directory: PathBuf,
    logical_name: String,
    path: PathBuf,
    file: Option<File>,
    enabled: bool,
    compress_rotated: bool,
}

impl FileSink {
    /// File name for `logical_name` on `date` (`YYYY-MM-DD`)
    pub fn file_name(logical_name: &str, date: &str) -> String {
        format!("{}:{}.txt", date, logical_name)
    }

    /// Create `directory` if needed, then open today's file for appending
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file cannot be opened
    pub fn open(logical_name: impl Into<String>, directory: impl AsRef<Path>) -> Result<Self> {
        let logical_name = logical_name.into();
        let directory = directory.as_ref().to_path_buf();

        fs::create_dir_all(&directory).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", directory.display()),
                e,
            )
        })?;

        let path = directory.join(Self::file_name(&logical_name, &today()));
        let file = Self::open_append(&path)?;

        Ok(Self {
            directory,
            logical_name,
            path,
            file: Some(file),
            enabled: true,
            compress_rotated: false,
        })
    }

    /// Gzip the previous file whenever rotation moves to a new one
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress_rotated = enabled;
        self
    }

    fn open_append(path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })
    }

    /// Append `line` and a newline; a no-op while writing is disabled
    pub fn write(&mut self, line: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let file = self.file.as_mut().ok_or_else(|| {
            LoggerError::file_appender(self.path.display().to_string(), "log file is not open")
        })?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        #[cfg(feature = "file")]
        {
            use fs2::FileExt;
            FileExt::lock_exclusive(&*file)
                .map_err(|_| LoggerError::file_lock(self.path.display().to_string()))?;
        }

        let written = file.write_all(buf.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        });

        #[cfg(feature = "file")]
        let written = {
            use fs2::FileExt;
            let unlocked = FileExt::unlock(&*file)
                .map_err(|_| LoggerError::file_lock(self.path.display().to_string()));
            written.and(unlocked)
        };

        written
    }

    /// Close the current handle and open the file for the current date
    ///
    /// Returns the path of the closed file when the new file has a different
    /// name. On failure the sink is left without a handle until the next
    /// successful rotation.
    pub fn rotate(&mut self) -> Result<Option<PathBuf>> {
        self.rotate_to(&today())
    }

    /// [`FileSink::rotate`] onto the file for `date` (`YYYY-MM-DD`)
    pub(crate) fn rotate_to(&mut self, date: &str) -> Result<Option<PathBuf>> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
            // handle closes here, before the next one is opened
        }

        let previous = self.path.clone();
        let next = self.directory.join(Self::file_name(&self.logical_name, date));

        let file = Self::open_append(&next).map_err(|e| {
            LoggerError::file_rotation(next.display().to_string(), e.to_string())
        })?;

        self.file = Some(file);
        self.path = next;

        Ok(if previous != self.path { Some(previous) } else { None })
    }

    pub fn set_write_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_write_enabled(&self) -> bool {
        self.enabled
    }

    pub fn compress_rotated(&self) -> bool {
        self.compress_rotated
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Current file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }
}

impl Appender for FileSink {
    fn append(&mut self, line: &str) -> Result<()> {
        self.write(line)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Gzip `path` into `<path>.gz` and remove the original
///
/// The original is only removed once the compressed file is complete.
pub fn compress_file(path: &Path) -> Result<PathBuf> {
    let mut gz_name = path.as_os_str().to_owned();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);
    let mut tmp_name = gz_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let temp_gz_path = PathBuf::from(tmp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    let streamed: std::io::Result<()> = (|| {
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            encoder.write_all(&buffer[..bytes_read])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    fs::remove_file(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Compressed but could not remove {}", path.display()),
            e,
        )
    })?;

    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    #[test]
    fn test_file_name() {
        assert_eq!(FileSink::file_name("ABA11", "2024-06-30"), "2024-06-30:ABA11.txt");
    }

    #[test]
    fn test_open_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let sink = FileSink::open("GATE", &nested).unwrap();

        assert!(nested.is_dir());
        assert!(sink.path().exists());
        assert_eq!(
            sink.path().file_name().unwrap().to_str().unwrap(),
            FileSink::file_name("GATE", &today())
        );
        assert!(sink.is_write_enabled());
    }

    #[test]
    fn test_write_appends_lines() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();

        sink.write("one").unwrap();
        sink.write("two").unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[test]
    fn test_reopen_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        {
            let mut sink = FileSink::open("GATE", dir.path()).unwrap();
            sink.write("before").unwrap();
        }
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();
        sink.write("after").unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "before\nafter\n");
    }

    #[test]
    fn test_disabled_write_is_noop() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();

        sink.set_write_enabled(false);
        sink.write("hidden").unwrap();
        sink.set_write_enabled(true);
        sink.write("shown").unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "shown\n");
    }

    #[test]
    fn test_rotate_same_date_keeps_file() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();
        sink.rotate_to("2030-02-01").unwrap();
        sink.write("first").unwrap();
        let before = sink.path().to_path_buf();

        let previous = sink.rotate_to("2030-02-01").unwrap();
        sink.write("second").unwrap();

        assert_eq!(previous, None);
        assert_eq!(sink.path(), before);
        assert!(sink.is_open());
        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_rotate_to_new_date_switches_file() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();
        let old_path = sink.path().to_path_buf();
        sink.write("before midnight").unwrap();

        let previous = sink.rotate_to("2030-02-02").unwrap();
        sink.write("after midnight").unwrap();
        sink.write("still after").unwrap();

        assert_eq!(previous, Some(old_path.clone()));
        assert_eq!(sink.path(), dir.path().join("2030-02-02:GATE.txt"));
        assert_eq!(fs::read_to_string(&old_path).unwrap(), "before midnight\n");
        assert_eq!(
            fs::read_to_string(sink.path()).unwrap(),
            "after midnight\nstill after\n"
        );
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_write_releases_lock() {
        use fs2::FileExt;

        let dir = tempdir().unwrap();
        let mut sink = FileSink::open("GATE", dir.path()).unwrap();
        sink.write("locked then released").unwrap();

        let other = File::open(sink.path()).unwrap();
        other.try_lock_exclusive().unwrap();
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn test_open_fails_on_file_as_directory() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a dir").unwrap();

        let err = FileSink::open("GATE", &blocker).err().unwrap();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }

    #[test]
    fn test_compress_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2024-01-01:GATE.txt");
        fs::write(&path, "line 1\nline 2\n").unwrap();

        let gz = compress_file(&path).unwrap();

        assert!(!path.exists());
        assert_eq!(gz, dir.path().join("2024-01-01:GATE.txt.gz"));
        let mut decoded = String::new();
        GzDecoder::new(File::open(&gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "line 1\nline 2\n");
    }
}
