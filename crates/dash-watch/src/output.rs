use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Global JSONL file writer. Set once in main(), read by emit().
static JSONL_WRITER: OnceLock<Mutex<BufWriter<File>>> = OnceLock::new();

/// Build the JSONL output path, ensuring the directory exists.
/// Pattern: `<dir>/dash-watch_<feed>_<YYYYMMDD-HHMMSS>.jsonl`
pub fn resolve_output_path(dir: &Path, feed_addr: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let base = format!("dash-watch_{}_{timestamp}", file_safe(feed_addr));

    Ok(find_unique_path(dir, &base, "jsonl"))
}

/// `127.0.0.1:8081` -> `127.0.0.1-8081`
fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect()
}

/// Find a path that does not yet exist, appending _2, _3... if needed.
fn find_unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{base}.{ext}"));
    if !first.exists() {
        return first;
    }
    let mut i = 2u32;
    loop {
        let candidate = dir.join(format!("{base}_{i}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Initialize the global JSONL file writer.
pub fn init_jsonl_writer(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    JSONL_WRITER
        .set(Mutex::new(BufWriter::new(file)))
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "JSONL writer already set"))
}

/// Write a JSONL line to the file (if initialized). Called from emit().
pub fn write_jsonl_line(line: &str) {
    if let Some(writer) = JSONL_WRITER.get() {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }
}
