//! 通用下载工具
//!
//! 提供 HTTP 下载、MD5 校验和按顺序回退的镜像下载，供各数据集复用。

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};
use tracing::{info, warn};

use super::error::DataError;

/// 下载 `url` 的完整内容
pub fn download_bytes(url: &str) -> Result<Vec<u8>, DataError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| DataError::DownloadError(format!("HTTP 请求失败: {e}")))?;

    if response.status() != 200 {
        return Err(DataError::DownloadError(format!(
            "HTTP 状态码: {}",
            response.status()
        )));
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| DataError::DownloadError(format!("读取响应失败: {e}")))?;
    Ok(bytes)
}

/// 校验 MD5，不一致时返回 `ChecksumMismatch`
pub fn verify_md5(data: &[u8], expected: &str) -> Result<(), DataError> {
    let actual = compute_md5(data);
    if actual != expected {
        return Err(DataError::ChecksumMismatch {
            expected: expected.to_string(),
            got: actual,
        });
    }
    Ok(())
}

/// 下载文件并保存到指定路径
///
/// 提供 `expected_md5` 时先校验，校验失败不会写入文件。
pub fn download_file(
    url: &str,
    dest_path: &Path,
    expected_md5: Option<&str>,
) -> Result<(), DataError> {
    info!(%url, "开始下载");
    let bytes = download_bytes(url)?;
    if let Some(expected) = expected_md5 {
        verify_md5(&bytes, expected)?;
    }
    std::fs::write(dest_path, &bytes)?;
    info!(path = %dest_path.display(), bytes = bytes.len(), "下载完成");
    Ok(())
}

/// 依次尝试 `mirrors`（每个镜像是以 `/` 结尾的基地址），第一个成功的即返回
///
/// 全部失败时返回 `AllMirrorsFailed`，其中记录了每个镜像的失败原因。
pub fn download_from_mirrors(
    mirrors: &[&str],
    file_name: &str,
    dest_path: &Path,
    expected_md5: Option<&str>,
) -> Result<(), DataError> {
    download_from_mirrors_with(mirrors, file_name, dest_path, expected_md5, download_bytes)
}

/// `download_from_mirrors` 的可注入版本，`fetch` 负责取回单个 URL 的内容
pub fn download_from_mirrors_with<F>(
    mirrors: &[&str],
    file_name: &str,
    dest_path: &Path,
    expected_md5: Option<&str>,
    mut fetch: F,
) -> Result<(), DataError>
where
    F: FnMut(&str) -> Result<Vec<u8>, DataError>,
{
    let mut attempts = Vec::with_capacity(mirrors.len());
    for mirror in mirrors {
        let url = format!("{mirror}{file_name}");
        let result = fetch(&url).and_then(|bytes| {
            if let Some(expected) = expected_md5 {
                verify_md5(&bytes, expected)?;
            }
            Ok(bytes)
        });
        match result {
            Ok(bytes) => {
                std::fs::write(dest_path, &bytes)?;
                info!(%url, path = %dest_path.display(), "下载完成");
                return Ok(());
            }
            Err(err) => {
                warn!(%url, error = %err, "镜像下载失败，尝试下一个");
                attempts.push(format!("{url}: {err}"));
            }
        }
    }
    Err(DataError::AllMirrorsFailed {
        file: file_name.to_string(),
        attempts,
    })
}

/// 计算数据的 MD5 校验码
pub fn compute_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
