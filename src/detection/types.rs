// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测/跟踪系统数据结构定义
//! Data structures shared by detector, tracker and counter

use std::fmt;
use std::sync::Arc;

use image::RgbImage;

// ========== 公共常量 ==========

/// COCO 类别: 0 = person
pub const PERSON_CLASS_ID: usize = 0;

/// 人的类别标签
pub const PERSON_LABEL: &str = "person";

// ========== 数据结构 ==========

/// 边界框 (left, top, right, bottom)
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// 中心点 (浮点)
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// (left, top, right, bottom)
    pub fn ltrb(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

/// 检测结果 (检测器 → 跟踪器)
///
/// 框以 (x, y, width, height) 表示, 与跟踪器输入格式一致
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        class_id: usize,
        label: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            class_id,
            label: label.into(),
            confidence,
        }
    }

    /// 由 (x1, y1, x2, y2) 构造
    pub fn from_xyxy(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        class_id: usize,
        label: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1, class_id, label, confidence)
    }

    /// 构造 person 检测
    pub fn person(x: f32, y: f32, width: f32, height: f32, confidence: f32) -> Self {
        Self::new(x, y, width, height, PERSON_CLASS_ID, PERSON_LABEL, confidence)
    }

    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// 跟踪ID (跟踪器分配, 跨帧稳定)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 跟踪结果 (跟踪器 → 计数器)
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub bbox: BBox,
    pub confirmed: bool,
}

impl Track {
    pub fn new(id: TrackId, bbox: BBox, confirmed: bool) -> Self {
        Self {
            id,
            bbox,
            confirmed,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// (left, top, right, bottom)
    pub fn to_ltrb(&self) -> (f32, f32, f32, f32) {
        self.bbox.ltrb()
    }
}

/// 已解码帧 (解码线程 → 处理循环)
#[derive(Clone)]
pub struct DecodedFrame {
    pub rgb_data: Arc<Vec<u8>>, // 使用Arc共享数据,避免复制
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb_data.len())
            .finish()
    }
}

impl DecodedFrame {
    pub fn new(rgb_data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgb_data: Arc::new(rgb_data),
            width,
            height,
        }
    }

    /// 纯色帧 (测试与占位用)
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width * height * 3) as usize], width, height)
    }

    /// 转换为 RgbImage (数据长度不匹配时返回 None)
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.rgb_data.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_xyxy_converts_to_xywh() {
        let det = Detection::from_xyxy(10.0, 20.0, 50.0, 100.0, 0, PERSON_LABEL, 0.9);
        assert_eq!(det.width, 40.0);
        assert_eq!(det.height, 80.0);
        assert_eq!(det.bbox(), BBox::new(10.0, 20.0, 50.0, 100.0));
        assert!(det.is_person());
    }

    #[test]
    fn blank_frame_round_trips_into_image() {
        let frame = DecodedFrame::blank(8, 4);
        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let frame = DecodedFrame::new(vec![0; 10], 8, 4);
        assert!(frame.to_rgb_image().is_none());
    }
}
