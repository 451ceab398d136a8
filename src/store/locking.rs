//! File locking utilities for safe concurrent access
//!
//! Provides locked read/write/update operations using `fs2` advisory locks so
//! that multiple coordinator instances (CLI invocations, worker processes)
//! can share the same request records without corrupting them.
//!
//! Advisory locks are cooperative - all participants must use these functions
//! for the locking to be effective.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Read file contents with a shared (read) lock.
///
/// Acquires a shared lock before reading, allowing multiple concurrent readers
/// but blocking while an exclusive (write) lock is held.
pub fn locked_read(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content)
}

/// Write file contents with an exclusive (write) lock.
///
/// Acquires an exclusive lock BEFORE truncating the file, preventing the TOCTOU
/// race where another process reads an empty file between truncation and write.
///
/// The sequence is: open → lock → truncate → write → flush.
pub fn locked_write(path: &Path, content: &str) -> Result<()> {
    // Open without truncation - we truncate via set_len(0) AFTER acquiring
    // the exclusive lock to prevent the TOCTOU race where another process
    // reads an empty file between truncation and write completion.
    #[allow(clippy::suspicious_open_options)]
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for writing: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    // Truncate AFTER acquiring the lock to prevent TOCTOU race
    file.set_len(0)
        .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(())
}

/// Atomically read, modify, and write a file under one exclusive lock.
///
/// The closure receives the current contents and returns a value plus the new
/// contents to write, or `None` to leave the file untouched. Because the lock
/// is held across both the read and the write, this gives check-and-set
/// semantics: no other locked accessor can observe or modify the file between
/// the closure seeing the old state and the new state landing on disk.
pub fn locked_update<T>(
    path: &Path,
    update: impl FnOnce(&str) -> Result<(T, Option<String>)>,
) -> Result<T> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open file for update: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let (value, new_content) = update(&content)?;

    if let Some(new_content) = new_content {
        file.seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to rewind file: {}", path.display()))?;
        file.set_len(0)
            .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
        let mut writer = BufWriter::new(&file);
        writer
            .write_all(new_content.as_bytes())
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    }

    Ok(value)
}
