//! Atomic file writes for the persisted stores.
//!
//! Writes go to a hidden temporary file in the same directory, which is
//! synced and then renamed over the target, so a crash mid-write can never
//! leave a half-written store behind.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    let mut file = dir.open_with(&tmp_name, &options)?;
    if let Err(err) = file.write_all(contents.as_bytes()).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = dir.remove_file(&tmp_name);
        return Err(err);
    }
    drop(file);

    if let Err(err) = rename_over(dir, &tmp_name, file_name) {
        let _ = dir.remove_file(&tmp_name);
        return Err(err);
    }
    // Best-effort directory sync so the rename itself survives a crash.
    if let Ok(handle) = dir.open(".") {
        let _ = handle.sync_all();
    }
    Ok(())
}

#[cfg(windows)]
fn rename_over(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    // Windows refuses to rename over an existing file.
    match dir.remove_file(target) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target)
}

#[cfg(not(windows))]
fn rename_over(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target)
}
