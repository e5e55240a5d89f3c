//! 镜像回退下载的单元测试（以注入的 fetch 代替网络）

use crate::data::DataError;
use crate::data::download::{compute_md5, download_from_mirrors_with, verify_md5};

const MIRRORS: [&str; 3] = ["https://a.invalid/", "https://b.invalid/", "https://c.invalid/"];

#[test]
fn test_compute_md5_known_value() {
    assert_eq!(compute_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(compute_md5(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn test_verify_md5_mismatch() {
    let err = verify_md5(b"abc", "00000000000000000000000000000000");
    assert!(matches!(err, Err(DataError::ChecksumMismatch { .. })));
}

#[test]
fn test_falls_back_to_next_mirror() -> Result<(), DataError> {
    let dir = super::temp_dir("mirror_fallback");
    let dest = dir.join("file.gz");
    let mut requested = Vec::new();

    download_from_mirrors_with(&MIRRORS, "file.gz", &dest, Some(&compute_md5(b"payload")), |url| {
        requested.push(url.to_string());
        if url.starts_with("https://a.") {
            Err(DataError::DownloadError("连接被拒绝".to_string()))
        } else {
            Ok(b"payload".to_vec())
        }
    })?;

    assert_eq!(
        requested,
        vec!["https://a.invalid/file.gz", "https://b.invalid/file.gz"]
    );
    assert_eq!(std::fs::read(&dest)?, b"payload");
    Ok(())
}

#[test]
fn test_checksum_failure_tries_next_mirror() -> Result<(), DataError> {
    let dir = super::temp_dir("mirror_checksum");
    let dest = dir.join("file.gz");

    download_from_mirrors_with(&MIRRORS, "file.gz", &dest, Some(&compute_md5(b"good")), |url| {
        if url.starts_with("https://c.") {
            Ok(b"good".to_vec())
        } else {
            Ok(b"corrupted".to_vec())
        }
    })?;

    assert_eq!(std::fs::read(&dest)?, b"good");
    Ok(())
}

#[test]
fn test_all_mirrors_failed() {
    let dir = super::temp_dir("mirror_all_failed");
    let dest = dir.join("file.gz");

    let err = download_from_mirrors_with(&MIRRORS, "file.gz", &dest, None, |_| {
        Err(DataError::DownloadError("超时".to_string()))
    });

    match err {
        Err(DataError::AllMirrorsFailed { file, attempts }) => {
            assert_eq!(file, "file.gz");
            assert_eq!(attempts.len(), MIRRORS.len());
        }
        other => panic!("期望 AllMirrorsFailed，得到 {other:?}"),
    }
    assert!(!dest.exists());
}
