//! File Chapter Store - 工作目录中的章节产物
//!
//! 每章两个文件：
//! - `chapter_NNNN.wav`：章节音频，存在即表示该章已完成
//! - `chapter_NNNN.json`：清单，记录内容哈希和音频信息
//!
//! 写入先落到 `.part` 临时文件再重命名，WAV 最后就位，中途中断不会留下看似完整的产物。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::application::ports::{ChapterArtifact, ChapterStorePort, StorageError};
use crate::domain::{ChapterAudio, ChapterIndex, ContentHash};
use crate::infrastructure::adapters::codec::{encode_wav, read_wav_info};

/// 读取 WAV 头部时最多读取的字节数
const HEADER_PROBE_LEN: u64 = 64 * 1024;

/// 产物清单
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactManifest {
    chapter_index: ChapterIndex,
    content_hash: ContentHash,
    sample_rate: u32,
    sample_count: u64,
    duration_ms: u64,
    completed_at: DateTime<Utc>,
}

/// 文件系统章节产物存储
pub struct FileChapterStore {
    /// 工作目录
    base_dir: PathBuf,
    /// 续传时是否校验内容哈希
    verify_content_hash: bool,
}

impl FileChapterStore {
    /// 创建存储，工作目录不存在时自动创建
    pub async fn new(base_dir: impl AsRef<Path>, verify_content_hash: bool) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            verify_content_hash,
        })
    }

    fn manifest_path(&self, chapter_index: ChapterIndex) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", chapter_index.artifact_stem()))
    }

    fn part_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".part");
        PathBuf::from(name)
    }

    async fn read_manifest(&self, chapter_index: ChapterIndex) -> Result<Option<ArtifactManifest>, StorageError> {
        let path = self.manifest_path(chapter_index);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::IoError(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StorageError::InvalidArtifact {
                path: path.display().to_string(),
                reason: format!("unreadable manifest: {}", e),
            })
    }

    /// 读取 WAV 头部并检查 data 块完整
    async fn inspect_audio(&self, chapter_index: ChapterIndex) -> Result<ChapterArtifact, StorageError> {
        let path = self.artifact_path(chapter_index);
        let invalid = |reason: String| StorageError::InvalidArtifact {
            path: path.display().to_string(),
            reason,
        };

        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.display().to_string())
            } else {
                StorageError::IoError(e.to_string())
            }
        })?;
        let file_len = file
            .metadata()
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?
            .len();

        let mut header = Vec::new();
        file.take(HEADER_PROBE_LEN)
            .read_to_end(&mut header)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let info = read_wav_info(&header).map_err(|e| invalid(e.to_string()))?;
        if info.sample_rate == 0 {
            return Err(invalid("sample rate is zero".to_string()));
        }
        if (info.data_start + info.data_size) as u64 > file_len {
            return Err(invalid(format!(
                "truncated: data chunk needs {} bytes, file has {}",
                info.data_start + info.data_size,
                file_len
            )));
        }

        Ok(ChapterArtifact {
            chapter_index,
            audio_path: path,
            content_hash: None,
            sample_rate: info.sample_rate,
            sample_count: info.frame_count(),
            duration_ms: info.duration_ms(),
        })
    }

    /// 校验产物，返回 None 表示需要重新合成
    async fn load_completed(
        &self,
        chapter_index: ChapterIndex,
        content_hash: &ContentHash,
    ) -> Result<Option<ChapterArtifact>, StorageError> {
        let mut artifact = match self.inspect_audio(chapter_index).await {
            Ok(artifact) => artifact,
            Err(StorageError::FileNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(manifest) = self.read_manifest(chapter_index).await? else {
            // 没有清单的旧产物：无法校验内容，按已完成处理
            tracing::debug!(chapter_index = %chapter_index, "Artifact has no manifest, accepting as-is");
            return Ok(Some(artifact));
        };

        if self.verify_content_hash && &manifest.content_hash != content_hash {
            tracing::info!(
                chapter_index = %chapter_index,
                stored = %manifest.content_hash,
                current = %content_hash,
                "Chapter text changed since last run, re-synthesizing"
            );
            return Ok(None);
        }

        if manifest.sample_count != artifact.sample_count || manifest.sample_rate != artifact.sample_rate {
            return Err(StorageError::InvalidArtifact {
                path: artifact.audio_path.display().to_string(),
                reason: "audio does not match manifest".to_string(),
            });
        }

        artifact.content_hash = Some(manifest.content_hash);
        artifact.duration_ms = manifest.duration_ms;
        Ok(Some(artifact))
    }

    async fn write_part(&self, path: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
        let part = Self::part_path(path);
        fs::write(&part, data)
            .await
            .map_err(|e| StorageError::IoError(format!("{}: {}", part.display(), e)))?;
        Ok(part)
    }

    async fn remove_if_exists(path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!("{}: {}", path.display(), e))),
        }
    }
}

#[async_trait]
impl ChapterStorePort for FileChapterStore {
    fn artifact_path(&self, chapter_index: ChapterIndex) -> PathBuf {
        self.base_dir
            .join(format!("{}.wav", chapter_index.artifact_stem()))
    }

    async fn find_completed(
        &self,
        chapter_index: ChapterIndex,
        content_hash: &ContentHash,
    ) -> Result<Option<ChapterArtifact>, StorageError> {
        match self.load_completed(chapter_index, content_hash).await {
            Err(StorageError::InvalidArtifact { path, reason }) => {
                tracing::warn!(path = %path, reason = %reason, "Discarding damaged chapter artifact");
                Ok(None)
            }
            other => other,
        }
    }

    async fn save(
        &self,
        audio: &ChapterAudio,
        content_hash: &ContentHash,
    ) -> Result<ChapterArtifact, StorageError> {
        let chapter_index = audio.chapter_index();
        let audio_path = self.artifact_path(chapter_index);
        let manifest_path = self.manifest_path(chapter_index);

        let manifest = ArtifactManifest {
            chapter_index,
            content_hash: content_hash.clone(),
            sample_rate: audio.sample_rate(),
            sample_count: audio.sample_count(),
            duration_ms: audio.duration_ms(),
            completed_at: Utc::now(),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let wav = encode_wav(audio.samples(), audio.sample_rate());
        let wav_part = self.write_part(&audio_path, &wav).await?;
        let manifest_part = self.write_part(&manifest_path, &manifest_json).await?;

        // 旧音频先移除，新清单就位后才放入新音频
        Self::remove_if_exists(&audio_path).await?;
        fs::rename(&manifest_part, &manifest_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        fs::rename(&wav_part, &audio_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            chapter_index = %chapter_index,
            path = %audio_path.display(),
            size = wav.len(),
            "Saved chapter artifact"
        );

        Ok(ChapterArtifact {
            chapter_index,
            audio_path,
            content_hash: Some(manifest.content_hash),
            sample_rate: manifest.sample_rate,
            sample_count: manifest.sample_count,
            duration_ms: manifest.duration_ms,
        })
    }

    async fn purge(&self) -> Result<u64, StorageError> {
        let mut deleted_count = 0u64;
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?
        {
            let path = entry.path();
            let is_artifact = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| {
                    n.starts_with("chapter_")
                        && (n.ends_with(".wav") || n.ends_with(".json") || n.ends_with(".part"))
                });
            if !is_artifact {
                continue;
            }

            if Self::remove_if_exists(&path).await? && path.extension().map_or(false, |ext| ext == "wav") {
                deleted_count += 1;
            }
        }

        // 目录为空时一并删除
        let _ = fs::remove_dir(&self.base_dir).await;

        tracing::info!(
            dir = %self.base_dir.display(),
            chapters = deleted_count,
            "Purged chapter artifacts"
        );

        Ok(deleted_count)
    }
}
