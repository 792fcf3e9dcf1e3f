//! Fake TTS Client - 离线合成引擎
//!
//! 不调用任何模型，按文本长度生成固定频率的正弦音，用于试运行和测试

use async_trait::async_trait;
use std::f32::consts::TAU;
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 每个字符对应的音频时长（毫秒）
    pub ms_per_char: u64,
    /// 正弦音频率
    pub frequency_hz: f32,
    /// 模拟推理延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            ms_per_char: 60,
            frequency_hz: 220.0,
            latency: Duration::from_millis(0),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    fn tone(&self, chars: usize) -> Vec<f32> {
        let rate = u64::from(self.config.sample_rate);
        let len = (chars as u64 * self.config.ms_per_char * rate / 1000) as usize;
        let step = TAU * self.config.frequency_hz / self.config.sample_rate as f32;
        (0..len).map(|i| 0.3 * (step * i as f32).sin()).collect()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        tracing::debug!(
            text_len = request.text.chars().count(),
            speaker = %request.voice.speaker,
            "FakeTtsClient: generating tone"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        Ok(SynthesizedAudio {
            samples: self.tone(request.text.chars().count()),
            sample_rate: self.config.sample_rate,
        })
    }
}
