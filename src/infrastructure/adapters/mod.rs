//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod codec;
pub mod muxer;
pub mod storage;
pub mod tts;

pub use muxer::*;
pub use storage::*;
pub use tts::*;
