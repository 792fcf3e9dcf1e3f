//! FFmpeg Muxer - 调用 ffmpeg 拼接章节音频并写入章节元数据
//!
//! 元数据和 concat 列表写入临时文件，ffmpeg 退出后无论成败都删除。

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

use crate::application::ports::{MuxError, MuxRequest, MuxerPort};

/// FFmpeg 混流器配置
#[derive(Debug, Clone)]
pub struct FfmpegMuxerConfig {
    /// ffmpeg 可执行文件
    pub ffmpeg_path: PathBuf,
    /// AAC 码率，例如 `64k`
    pub bitrate: String,
    /// 临时文件目录
    pub temp_dir: PathBuf,
}

impl Default for FfmpegMuxerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            bitrate: "64k".to_string(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// FFmpeg 混流器
pub struct FfmpegMuxer {
    config: FfmpegMuxerConfig,
}

impl FfmpegMuxer {
    pub fn new(config: FfmpegMuxerConfig) -> Self {
        Self { config }
    }

    /// ffmpeg 命令行参数
    fn build_args(&self, concat_path: &Path, metadata_path: &Path, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(concat_path.into());
        args.push("-i".into());
        args.push(metadata_path.into());
        for arg in [
            "-map",
            "0:a",
            "-map_metadata",
            "1",
            "-map_chapters",
            "1",
            "-c:a",
            "aac",
            "-b:a",
            self.config.bitrate.as_str(),
            "-movflags",
            "+faststart",
        ] {
            args.push(arg.into());
        }
        args.push(output_path.into());
        args
    }

    async fn run(&self, concat_path: &Path, metadata_path: &Path, output_path: &Path) -> Result<(), MuxError> {
        let args = self.build_args(concat_path, metadata_path, output_path);

        tracing::debug!(
            ffmpeg = %self.config.ffmpeg_path.display(),
            args = ?args,
            "Running ffmpeg"
        );

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MuxError::Spawn(format!("{}: {}", self.config.ffmpeg_path.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(code = ?output.status.code(), "ffmpeg stderr:\n{}", stderr);
            return Err(MuxError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }
}

async fn write_temp(path: &Path, contents: &str) -> Result<(), MuxError> {
    fs::write(path, contents)
        .await
        .map_err(|e| MuxError::IoError(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl MuxerPort for FfmpegMuxer {
    async fn mux(&self, request: &MuxRequest) -> Result<PathBuf, MuxError> {
        if let Some(parent) = request.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MuxError::IoError(format!("{}: {}", parent.display(), e)))?;
        }
        fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|e| MuxError::IoError(e.to_string()))?;

        let run_id = Uuid::new_v4();
        let metadata_path = self.config.temp_dir.join(format!("voxbook-{}.ffmeta", run_id));
        let concat_path = self.config.temp_dir.join(format!("voxbook-{}.concat.txt", run_id));

        let result = async {
            write_temp(&metadata_path, &request.metadata).await?;
            write_temp(&concat_path, &request.concat_list).await?;
            self.run(&concat_path, &metadata_path, &request.output_path).await
        }
        .await;

        for path in [&metadata_path, &concat_path] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
            }
        }

        result?;
        tracing::info!(
            output = %request.output_path.display(),
            inputs = request.audio_paths.len(),
            "ffmpeg finished"
        );
        Ok(request.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn muxer(ffmpeg: &str, temp_dir: &Path) -> FfmpegMuxer {
        FfmpegMuxer::new(FfmpegMuxerConfig {
            ffmpeg_path: PathBuf::from(ffmpeg),
            bitrate: "96k".to_string(),
            temp_dir: temp_dir.to_path_buf(),
        })
    }

    fn request(output: PathBuf) -> MuxRequest {
        MuxRequest {
            audio_paths: vec![PathBuf::from("/work/chapter_0000.wav")],
            metadata: ";FFMETADATA1\ntitle=Book\n\n".to_string(),
            concat_list: "file '/work/chapter_0000.wav'\n".to_string(),
            output_path: output,
        }
    }

    async fn leftover_files(dir: &Path) -> usize {
        let mut entries = fs::read_dir(dir).await.unwrap();
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.file_name().to_string_lossy().starts_with("voxbook-") {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn test_build_args() {
        let m = muxer("ffmpeg", Path::new("/tmp"));
        let args = m.build_args(
            Path::new("/tmp/list.txt"),
            Path::new("/tmp/meta.txt"),
            Path::new("out/book.m4b"),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-y", "-f", "concat", "-safe", "0", "-i", "/tmp/list.txt", "-i", "/tmp/meta.txt",
                "-map", "0:a", "-map_metadata", "1", "-map_chapters", "1", "-c:a", "aac", "-b:a",
                "96k", "-movflags", "+faststart", "out/book.m4b",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_creates_output_dir_and_cleans_up() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/out/book.m4b");

        let path = muxer("true", dir.path()).mux(&request(output.clone())).await.unwrap();

        assert_eq!(path, output);
        assert!(dir.path().join("nested/out").is_dir());
        assert_eq!(leftover_files(dir.path()).await, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure_and_cleans_up() {
        let dir = tempdir().unwrap();
        let err = muxer("false", dir.path())
            .mux(&request(dir.path().join("book.m4b")))
            .await
            .unwrap_err();

        assert!(matches!(err, MuxError::Failed { code: Some(1), .. }));
        assert_eq!(leftover_files(dir.path()).await, 0);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempdir().unwrap();
        let err = muxer("/nonexistent/ffmpeg-voxbook", dir.path())
            .mux(&request(dir.path().join("book.m4b")))
            .await
            .unwrap_err();

        assert!(matches!(err, MuxError::Spawn(_)));
        assert_eq!(leftover_files(dir.path()).await, 0);
    }
}
