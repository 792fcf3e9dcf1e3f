//! 处理器测试共用的端口替身

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    MuxError, MuxRequest, MuxerPort, SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError,
};
use crate::domain::Chapter;

pub fn chapter(title: &str, text: &str) -> Chapter {
    Chapter::new(title, text).unwrap()
}

/// 按文本内容决定行为的引擎
///
/// - 含 `FAIL`：返回错误
/// - 含 `SLOW`：挂起 10 秒
/// - 含 `ODD`：返回不同的采样率
/// - 其余：按文本哈希抖动 0-15ms（或固定延迟）后返回确定的采样
pub struct ScriptedEngine {
    pub calls: AtomicUsize,
    jitter: bool,
    fixed_latency: Option<Duration>,
    batching: bool,
}

impl ScriptedEngine {
    pub const SAMPLE_RATE: u32 = 16_000;

    pub fn jittery() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            jitter: true,
            fixed_latency: None,
            batching: false,
        }
    }

    /// 每次调用固定耗时
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            fixed_latency: Some(latency),
            ..Self::jittery()
        }
    }

    /// 声明原生批量支持，整批一次调用
    pub fn batching() -> Self {
        Self {
            batching: true,
            ..Self::jittery()
        }
    }

    pub fn samples_for(text: &str) -> Vec<f32> {
        text.chars()
            .flat_map(|c| {
                let v = (c as u32 % 200) as f32 / 200.0 - 0.5;
                [v, -v, v / 2.0]
            })
            .collect()
    }

    fn latency(text: &str) -> Duration {
        let digest = md5::compute(text.as_bytes());
        Duration::from_millis(u64::from(digest.0[0] % 16))
    }
}

#[async_trait]
impl TtsEnginePort for ScriptedEngine {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if request.text.contains("SLOW") {
            tokio::time::sleep(Duration::from_secs(10)).await;
        } else if let Some(latency) = self.fixed_latency {
            tokio::time::sleep(latency).await;
        } else if self.jitter {
            tokio::time::sleep(Self::latency(&request.text)).await;
        }

        if request.text.contains("FAIL") {
            return Err(TtsError::ServiceError("scripted failure".to_string()));
        }

        let sample_rate = if request.text.contains("ODD") {
            22_050
        } else {
            Self::SAMPLE_RATE
        };

        Ok(SynthesizedAudio {
            samples: Self::samples_for(&request.text),
            sample_rate,
        })
    }

    fn supports_batching(&self) -> bool {
        self.batching
    }
}

/// 记录请求的混流器
pub struct RecordingMuxer {
    pub requests: Mutex<Vec<MuxRequest>>,
    fail: bool,
}

impl RecordingMuxer {
    pub fn ok() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn recorded(&self) -> Vec<MuxRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MuxerPort for RecordingMuxer {
    async fn mux(&self, request: &MuxRequest) -> Result<std::path::PathBuf, MuxError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(MuxError::Failed {
                code: Some(1),
                stderr: "scripted muxer failure".to_string(),
            });
        }
        Ok(request.output_path.clone())
    }
}
