//! Tail of a text file, for enriching failure reports with log context.

use camino::Utf8Path;

/// Return the last `n` lines of a text file.
pub fn tail_lines(path: &Utf8Path, n: usize) -> std::io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_tail_short_file() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("log")).unwrap();
        std::fs::write(&path, "one\ntwo\n").unwrap();
        assert_eq!(tail_lines(&path, 50).unwrap(), "one\ntwo");
    }

    #[test]
    fn test_tail_truncates() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("log")).unwrap();
        let body: String = (0..100).map(|i| format!("line {}\n", i)).collect();
        std::fs::write(&path, body).unwrap();
        let tail = tail_lines(&path, 10).unwrap();
        assert!(tail.starts_with("line 90"));
        assert!(tail.ends_with("line 99"));
    }
}
