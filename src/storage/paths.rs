use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

/// Date-partitioned path for a raw extraction snapshot:
/// `<raw_dir>/<source>/<yyyy/mm/dd>/<uuid>.json`.
pub fn raw_snapshot_path(raw_dir: &Path, source: &str) -> PathBuf {
    let date = Utc::now().format("%Y/%m/%d").to_string();
    let file_id = Uuid::new_v4();
    raw_dir.join(source).join(date).join(format!("{file_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path_layout() {
        let path = raw_snapshot_path(Path::new("data/raw"), "tmdb");
        let text = path.to_string_lossy();
        assert!(text.starts_with("data/raw/tmdb/"));
        assert!(text.ends_with(".json"));
    }

    #[test]
    fn test_snapshot_paths_are_unique() {
        let a = raw_snapshot_path(Path::new("raw"), "wikipedia");
        let b = raw_snapshot_path(Path::new("raw"), "wikipedia");
        assert_ne!(a, b);
    }
}
