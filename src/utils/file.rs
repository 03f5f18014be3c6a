use log::debug;
use rev_buf_reader::RevBufReader;
use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;
use std::time::Instant;

/// Last `n` non-empty lines of a file, newest first, without reading the
/// whole file.
pub fn simple_tail(path: &Path, n: usize) -> io::Result<Vec<String>> {
    let start = Instant::now();
    let file = File::open(path)?;

    let buf = RevBufReader::new(file);
    let mut lines = Vec::with_capacity(n);
    for line in buf.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        lines.push(line);
        if lines.len() == n {
            break;
        }
    }

    debug!("simple_tail took: {} ms", start.elapsed().as_millis());
    Ok(lines)
}

/// First line of a file.
pub fn first_line(path: &Path) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    io::BufReader::new(file).lines().next().transpose()
}

/// Reads a short sysfs-style file, trimming the trailing newline.
pub fn get_file_line(file: &Path, capacity: usize) -> Option<String> {
    let mut reader = String::with_capacity(capacity);
    let mut f = File::open(file).ok()?;
    f.read_to_string(&mut reader).ok()?;
    reader.truncate(reader.trim_end().len());
    Some(reader)
}
