/// 检测与跟踪 (Detection & Tracking)
///
/// - Detector: 目标检测接口
/// - Tracker:  多目标跟踪接口 + 卡尔曼滤波
/// - ByteTrack: 默认跟踪器实现
pub mod bytetrack;
pub mod detector;
pub mod tracker;
pub mod types;

pub use bytetrack::{ByteTracker, TrackerConfig};
pub use detector::{person_detections, Detector};
pub use tracker::Tracker;
pub use types::{BBox, DecodedFrame, Detection, Track, TrackId};
