use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};

/// Path of the segment written by one capture attempt:
/// `<dir>/<name>-<rfc3339 millis>.ts`, with `-N` appended if that file already
/// exists so a restart never overwrites an earlier recording.
pub async fn segment_path(dir: &Path, name: &str, at: DateTime<Local>) -> PathBuf {
    let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut path = dir.join(format!("{name}-{stamp}.ts"));
    let mut n = 1u32;
    // An unreadable directory counts as free; the capture reports the error.
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path = dir.join(format!("{name}-{stamp}-{n}.ts"));
        n += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_segment_name_contains_stream_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        let path = segment_path(dir.path(), "cam1", at).await;
        let file = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(file.starts_with("cam1-2024-03-09T07:05:01.000"));
        assert!(file.ends_with(".ts"));
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn test_existing_segment_is_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local::now();

        let first = segment_path(dir.path(), "cam1", at).await;
        std::fs::write(&first, b"a").unwrap();
        let second = segment_path(dir.path(), "cam1", at).await;
        std::fs::write(&second, b"b").unwrap();
        let third = segment_path(dir.path(), "cam1", at).await;

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(second.to_string_lossy().ends_with("-1.ts"));
        assert!(third.to_string_lossy().ends_with("-2.ts"));
    }
}
