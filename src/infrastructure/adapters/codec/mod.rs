//! Audio Codec - WAV 编解码

mod wav_codec;

pub use wav_codec::{decode_wav, encode_wav, read_wav_info, CodecError, WavInfo};
