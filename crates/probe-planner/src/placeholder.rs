//! The binary placeholder uploaded for file parameters.

use probe_core::BinaryRef;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// File name of the placeholder inside its directory.
pub const PLACEHOLDER_FILE_NAME: &str = "placeholder.jpg";

/// A minimal JPEG: SOI, a JFIF APP0 header and EOI.
pub const PLACEHOLDER_JPEG: [u8; 22] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x01, 0x00,
    0x48, 0x00, 0x48, 0x00, 0x00, 0xFF, 0xD9,
];

/// Create the placeholder in `dir` unless it already exists, and return a
/// handle to it. Concurrent callers race on `create_new`; the loser sees
/// `AlreadyExists` and reuses the winner's file.
pub fn ensure_placeholder(dir: &Path) -> std::io::Result<BinaryRef> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(PLACEHOLDER_FILE_NAME);

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(mut file) => {
            file.write_all(&PLACEHOLDER_JPEG)?;
            tracing::debug!(path = %path.display(), "Created binary placeholder");
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    Ok(BinaryRef::new(path))
}
