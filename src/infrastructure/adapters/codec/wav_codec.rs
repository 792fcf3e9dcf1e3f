//! WAV Codec - 章节产物与引擎返回音频的编解码
//!
//! - 编码：单声道 16-bit PCM WAV
//! - 头部解析：不解码采样，只读取格式和 data 块位置（断点续传校验用）
//! - 解码：基于 symphonia，多声道下混为单声道

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

const BITS_PER_SAMPLE: u16 = 16;
const HEADER_LEN: usize = 44;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid WAV: {0}")]
    InvalidWav(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// WAV 头部信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// data 块起始偏移
    pub data_start: usize,
    /// data 块声明的字节数
    pub data_size: usize,
}

impl WavInfo {
    /// 每声道采样数（帧数）
    pub fn frame_count(&self) -> u64 {
        let block_align = u64::from(self.channels) * u64::from(self.bits_per_sample / 8);
        if block_align == 0 {
            return 0;
        }
        self.data_size as u64 / block_align
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frame_count() * 1000 / u64::from(self.sample_rate)
    }
}

/// 将单声道 f32 采样编码为 16-bit PCM WAV
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let num_channels: u16 = 1;
    let byte_rate = sample_rate * u32::from(num_channels) * u32::from(BITS_PER_SAMPLE / 8);
    let block_align = num_channels * (BITS_PER_SAMPLE / 8);

    let data_size = samples.len() * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(HEADER_LEN + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for &s in samples {
        let value = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        wav.extend_from_slice(&value.to_le_bytes());
    }

    wav
}

fn le_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn le_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 解析 WAV 头部
///
/// 只需要文件开头到 data 块头为止的字节，data 块内容可以不在 `data` 中
pub fn read_wav_info(data: &[u8]) -> Result<WavInfo, CodecError> {
    if data.len() < 12 {
        return Err(CodecError::InvalidWav("data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(CodecError::InvalidWav("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(CodecError::InvalidWav("missing WAVE identifier".to_string()));
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = le_u32(data, pos + 4) as usize;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || pos + 8 + 16 > data.len() {
                    return Err(CodecError::InvalidWav("truncated fmt chunk".to_string()));
                }
                let body = pos + 8;
                fmt = Some((
                    le_u16(data, body),
                    le_u16(data, body + 2),
                    le_u32(data, body + 4),
                    le_u16(data, body + 14),
                ));
            }
            b"data" => {
                let (audio_format, channels, sample_rate, bits_per_sample) = fmt.ok_or_else(|| {
                    CodecError::InvalidWav("data chunk before fmt chunk".to_string())
                })?;
                return Ok(WavInfo {
                    audio_format,
                    channels,
                    sample_rate,
                    bits_per_sample,
                    data_start: pos + 8,
                    data_size: chunk_size,
                });
            }
            _ => {}
        }

        pos += 8 + chunk_size;
        // 对齐到偶数字节
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    if fmt.is_none() {
        return Err(CodecError::InvalidWav("missing fmt chunk".to_string()));
    }
    Err(CodecError::InvalidWav("missing data chunk".to_string()))
}

/// 使用 symphonia 解码音频，返回单声道采样和采样率
pub fn decode_wav(data: &[u8]) -> Result<(Vec<f32>, u32), CodecError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| CodecError::DecodingError(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CodecError::DecodingError(format!("Decoder creation failed: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(CodecError::DecodingError(format!("Packet read error: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Decode error (skipping packet): {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        let channels = spec.channels.count();
        if frames == 0 || channels == 0 {
            continue;
        }

        let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
        buf.copy_interleaved_ref(decoded);
        let interleaved = &buf.samples()[..frames * channels];

        if channels == 1 {
            samples.extend_from_slice(interleaved);
        } else {
            samples.extend(
                interleaved
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header_layout() {
        let wav = encode_wav(&[0.0, 0.5, -0.5], 24_000);
        assert_eq!(wav.len(), HEADER_LEN + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(le_u32(&wav, 4), 36 + 6);
        assert_eq!(&wav[36..40], b"data");

        let info = read_wav_info(&wav).unwrap();
        assert_eq!(info.audio_format, 1);
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 24_000);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.data_start, HEADER_LEN);
        assert_eq!(info.frame_count(), 3);
    }

    #[test]
    fn test_encode_clamps_out_of_range() {
        let wav = encode_wav(&[2.0, -2.0], 8_000);
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 32767);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -32767);
    }

    #[test]
    fn test_info_only_needs_header_prefix() {
        let wav = encode_wav(&vec![0.1; 48_000], 24_000);
        let info = read_wav_info(&wav[..HEADER_LEN]).unwrap();
        assert_eq!(info.frame_count(), 48_000);
        assert_eq!(info.duration_ms(), 2_000);
    }

    #[test]
    fn test_info_skips_unknown_chunks() {
        let plain = encode_wav(&[0.0; 4], 16_000);
        let mut wav = plain[..36].to_vec();
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&3u32.to_le_bytes());
        wav.extend_from_slice(&[1, 2, 3, 0]); // 奇数长度 + 填充字节
        wav.extend_from_slice(&plain[36..]);

        let info = read_wav_info(&wav).unwrap();
        assert_eq!(info.data_start, HEADER_LEN + 12);
        assert_eq!(info.frame_count(), 4);
    }

    #[test]
    fn test_info_rejects_garbage() {
        assert!(read_wav_info(b"").is_err());
        assert!(read_wav_info(b"RIFF\0\0\0\0WAVX").is_err());
        assert!(read_wav_info(b"OggS\0\0\0\0WAVEfmt ").is_err());

        // 截断在 fmt 块中间
        let wav = encode_wav(&[0.0], 16_000);
        assert!(read_wav_info(&wav[..24]).is_err());
        // 只有 fmt 没有 data
        assert!(read_wav_info(&wav[..36]).is_err());
    }

    #[test]
    fn test_decode_recovers_samples() {
        let input: Vec<f32> = (0..1_000).map(|i| ((i % 100) as f32 / 100.0) - 0.5).collect();
        let wav = encode_wav(&input, 22_050);

        let (decoded, rate) = decode_wav(&wav).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(decoded.len(), input.len());
        for (a, b) in input.iter().zip(&decoded) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        // 手工构造双声道 WAV：左 = 0.5，右 = -0.5
        let frames = 100usize;
        let data_size = frames * 4;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16_000u32.to_le_bytes());
        wav.extend_from_slice(&64_000u32.to_le_bytes());
        wav.extend_from_slice(&4u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());
        for _ in 0..frames {
            wav.extend_from_slice(&16384i16.to_le_bytes());
            wav.extend_from_slice(&(-16384i16).to_le_bytes());
        }

        let (decoded, rate) = decode_wav(&wav).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(decoded.len(), frames);
        assert!(decoded.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_decode_rejects_non_audio() {
        assert!(decode_wav(b"definitely not audio").is_err());
    }
}
