use std::io::Write;
use std::sync::Once;
use tempfile::{NamedTempFile, TempDir};

static INIT_LOGGING: Once = Once::new();

/// Installs a trace-level subscriber writing through the test harness.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// A scratch file holding `contents`.
pub fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// A scratch directory with `name` written into it.
pub fn dir_with(name: &str, contents: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    std::fs::write(dir.path().join(name), contents).expect("write temp file");
    dir
}
