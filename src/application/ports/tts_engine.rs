//! TTS Engine Port - 语音合成引擎抽象
//!
//! 本地模型或远程服务都作为适配器实现该接口，编排器与具体后端无关

use async_trait::async_trait;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Batch size mismatch: sent {sent} texts, received {received} clips")]
    BatchSizeMismatch { sent: usize, received: usize },
}

/// 音色参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceParams {
    /// 说话人
    pub speaker: String,
    /// 目标语言，`Auto` 表示由引擎判断
    pub language: String,
    /// 可选的风格指令
    pub instruct: Option<String>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            speaker: "Aiden".to_string(),
            language: "Auto".to_string(),
            instruct: None,
        }
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    pub voice: VoiceParams,
}

/// 合成结果：单声道 f32 采样
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// TTS Engine Port
///
/// 调用可能很慢、可能失败，调用方负责超时
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成单段文本
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError>;

    /// 引擎是否原生支持批量合成
    ///
    /// 返回 false 时编排器逐段调用，每段单独计时
    fn supports_batching(&self) -> bool {
        false
    }

    /// 批量合成，结果与请求一一对应
    ///
    /// 默认逐条调用 `synthesize`，任意一条失败则整批失败
    async fn synthesize_batch(
        &self,
        requests: Vec<SynthesisRequest>,
    ) -> Result<Vec<SynthesizedAudio>, TtsError> {
        let mut clips = Vec::with_capacity(requests.len());
        for request in requests {
            clips.push(self.synthesize(request).await?);
        }
        Ok(clips)
    }

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
