/// 视频输入系统 (Video Input System)
///
/// - VideoDecoder: FFmpeg 解码 (独立线程), 以迭代器形式按序交付帧
/// - DecodeFilter: 帧过滤与 RGB 拷贝
///
/// 处理循环接受任意 `IntoIterator<Item = DecodedFrame>` 作为帧源
pub mod decode_filter;
pub mod decoder;

pub use decode_filter::DecodeFilter;
pub use decoder::{VideoDecoder, DEFAULT_QUEUE};
