//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/infer
//! Request: {"text": "...", "speaker": "Aiden", "language": "Auto", "instruct": null}  (JSON)
//! Response: audio/wav binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::codec::decode_wav;

/// 重试间隔基数，第 n 次重试等待 n 倍
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    /// 要合成的文本
    text: &'a str,
    speaker: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruct: Option<&'a str>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 重试次数
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// HTTP TTS 客户端
///
/// 通过 HTTP 调用外部 TTS 服务
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取推理 URL
    fn infer_url(&self) -> String {
        format!("{}/api/tts/infer", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    /// 单次请求，不重试
    async fn infer_once(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        let http_request = TtsHttpRequest {
            text: &request.text,
            speaker: &request.voice.speaker,
            language: &request.voice.language,
            instruct: request.voice.instruct.as_deref(),
        };

        tracing::debug!(
            url = %self.infer_url(),
            text_len = request.text.chars().count(),
            speaker = %http_request.speaker,
            "Sending TTS infer request"
        );

        let response = self
            .client
            .post(self.infer_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        let (samples, sample_rate) =
            decode_wav(&audio_data).map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            sample_rate,
            samples = samples.len(),
            audio_size = audio_data.len(),
            "TTS inference completed"
        );

        Ok(SynthesizedAudio {
            samples,
            sample_rate,
        })
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        let mut attempt = 0u32;
        loop {
            match self.infer_once(&request).await {
                Ok(audio) => return Ok(audio),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "TTS request failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::VoiceParams;

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000")
            .with_timeout(60)
            .with_retries(2);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_urls_tolerate_trailing_slash() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::new("http://tts:8000/")).unwrap();
        assert_eq!(client.infer_url(), "http://tts:8000/api/tts/infer");
        assert_eq!(client.health_url(), "http://tts:8000/health");
    }

    #[test]
    fn test_request_body_omits_missing_instruct() {
        let voice = VoiceParams::default();
        let body = TtsHttpRequest {
            text: "你好",
            speaker: &voice.speaker,
            language: &voice.language,
            instruct: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "你好", "speaker": "Aiden", "language": "Auto"})
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_after_retries() {
        // 端口 9 (discard) 一般没有 HTTP 服务监听
        let client = HttpTtsClient::new(
            HttpTtsClientConfig::new("http://127.0.0.1:9")
                .with_timeout(2)
                .with_retries(1),
        )
        .unwrap();

        let request = SynthesisRequest {
            text: "hello".to_string(),
            voice: VoiceParams::default(),
        };
        assert!(client.synthesize(request).await.is_err());
        assert!(!client.health_check().await);
    }
}
