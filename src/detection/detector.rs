// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测器 (Detector)
//! 职责: DecodedFrame → 检测框 (x, y, w, h, 类别, 置信度)

use anyhow::Result;

use super::types::{DecodedFrame, Detection};

/// 目标检测器接口
///
/// 具体模型 (YOLOv8 等) 的输出在实现内部转换为 [`Detection`],
/// 坐标为原始帧像素坐标
pub trait Detector {
    fn detect(&mut self, frame: &DecodedFrame) -> Result<Vec<Detection>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, frame: &DecodedFrame) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}

/// 只保留 person 类别
pub fn person_detections(detections: &[Detection]) -> Vec<Detection> {
    detections
        .iter()
        .filter(|det| det.is_person())
        .cloned()
        .collect()
}
