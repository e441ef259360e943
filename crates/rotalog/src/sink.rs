//! Writer fan-out: one logical sink over the active file and the console

use crate::rotation::ActiveFile;
use std::io::{self, Write};
use std::sync::Arc;

#[cfg(test)]
use std::sync::{Mutex, PoisonError};

/// Console destination for echoed lines
#[derive(Clone)]
pub(crate) enum Console {
    Stdout,
    #[cfg(test)]
    Capture(Arc<Mutex<Vec<u8>>>),
    #[cfg(test)]
    Failing,
}

impl Console {
    fn write_all(&self, line: &[u8]) -> io::Result<()> {
        match self {
            Console::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(line)?;
                stdout.flush()
            }
            #[cfg(test)]
            Console::Capture(buffer) => {
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(line);
                Ok(())
            }
            #[cfg(test)]
            Console::Failing => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        }
    }
}

/// Duplicates every write to the active file and, when echo is on, the
/// console.
pub struct FanOut {
    file: Arc<ActiveFile>,
    console: Option<Console>,
}

impl FanOut {
    pub(crate) fn new(file: Arc<ActiveFile>, console: Option<Console>) -> Self {
        Self { file, console }
    }

    pub fn file(&self) -> &Arc<ActiveFile> {
        &self.file
    }

    pub fn echoes_to_console(&self) -> bool {
        self.console.is_some()
    }

    /// Write one complete line to every destination.
    ///
    /// The file lock is held across both destinations so lines appear in the
    /// same order everywhere. A failure on one destination does not skip the
    /// other; the file error wins if both fail.
    pub fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock();

        let file_result = file.write_all(line);
        let console_result = match &self.console {
            Some(console) => console.write_all(line),
            None => Ok(()),
        };

        file_result.and(console_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::LogFileManager;
    use tempfile::TempDir;

    fn capture() -> (Console, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (Console::Capture(Arc::clone(&buffer)), buffer)
    }

    #[test]
    fn test_fan_out_writes_to_both() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = LogFileManager::new();
        let rotated = manager.rotate(temp_dir.path(), "both.log").unwrap();
        let (console, buffer) = capture();

        let sink = FanOut::new(Arc::clone(&rotated.current), Some(console));
        sink.write_line(b"hello\n").unwrap();

        assert!(sink.echoes_to_console());
        assert_eq!(buffer.lock().unwrap().as_slice(), b"hello\n");
        assert_eq!(
            std::fs::read_to_string(rotated.current.path()).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_fan_out_without_console() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = LogFileManager::new();
        let rotated = manager.rotate(temp_dir.path(), "file_only.log").unwrap();

        let sink = FanOut::new(Arc::clone(&rotated.current), None);
        sink.write_line(b"quiet\n").unwrap();

        assert!(!sink.echoes_to_console());
        assert_eq!(
            std::fs::read_to_string(sink.file().path()).unwrap(),
            "quiet\n"
        );
    }

    /// Active file whose handle was opened read-only, so every write fails
    fn unwritable_file(dir: &std::path::Path) -> Arc<ActiveFile> {
        let path = dir.join("read_only.log");
        std::fs::write(&path, b"").unwrap();
        let file = std::fs::File::open(&path).unwrap();
        Arc::new(ActiveFile::from_parts("read_only.log", path, file))
    }

    #[test]
    fn test_console_failure_still_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = LogFileManager::new();
        let rotated = manager.rotate(temp_dir.path(), "console_down.log").unwrap();

        let sink = FanOut::new(Arc::clone(&rotated.current), Some(Console::Failing));
        let err = sink.write_line(b"kept\n").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(
            std::fs::read_to_string(rotated.current.path()).unwrap(),
            "kept\n"
        );
    }

    #[test]
    fn test_file_failure_still_writes_console() {
        let temp_dir = TempDir::new().unwrap();
        let (console, buffer) = capture();

        let sink = FanOut::new(unwritable_file(temp_dir.path()), Some(console));
        assert!(sink.write_line(b"echoed\n").is_err());

        assert_eq!(buffer.lock().unwrap().as_slice(), b"echoed\n");
    }

    #[test]
    fn test_file_error_wins_when_both_fail() {
        let temp_dir = TempDir::new().unwrap();

        let sink = FanOut::new(unwritable_file(temp_dir.path()), Some(Console::Failing));
        let err = sink.write_line(b"lost\n").unwrap_err();

        assert_ne!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
