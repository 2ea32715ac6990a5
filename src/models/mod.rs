/// 检测模型实现
///
/// ## 核心流程
/// ```text
/// 原始帧 → preprocess (letterbox) → ndarray张量
///        ↓
///   OrtBackend::run
///        ↓
/// 原始输出 → postprocess (解码 + NMS) → Vec<Detection>
/// ```
///
/// 模型通过 [`crate::detection::Detector`] trait 接入处理循环
pub mod yolov8;

pub use yolov8::{YOLOv8, YOLOv8Config};
