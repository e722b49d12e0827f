//! Helpers for reading sysfs-style attribute files.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read the first line of an attribute file, without the trailing newline.
///
/// Sysfs attributes are single-line, newline-terminated values; anything
/// past the first line is ignored.
pub fn read_first_line(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_only_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product_name");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "p4d.24xlarge").unwrap();
        writeln!(f, "second line").unwrap();

        assert_eq!(read_first_line(&path).unwrap(), "p4d.24xlarge");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_first_line(&dir.path().join("absent")).is_err());
    }
}
