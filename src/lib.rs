// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 命令行参数与各模块配置
pub mod counting; // 分区去重计数 (纯计算)
pub mod detection; // 检测/跟踪接口与数据结构
pub mod input; // 视频输入系统
pub mod models; // 检测模型实现
pub mod pipeline; // 逐帧处理循环
pub mod render; // 标注帧输出
pub mod report; // 结果报告

pub mod ort_backend;

pub use crate::config::Args;
pub use crate::counting::{UniqueCounter, Zone, ZoneCounts, ZoneSplit};
pub use crate::detection::{DecodedFrame, Detection, Track, TrackId};
pub use crate::models::{YOLOv8, YOLOv8Config};
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::pipeline::{FrameSequencer, RunOutcome, StopSignal};

use crate::detection::tracker::compute_iou;

/// 非极大值抑制 (按类别), 按置信度降序保留
///
/// 只在同类别之间抑制: 与椅子/背包重叠的人不会被删掉
pub fn non_max_suppression(xs: &mut Vec<Detection>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence.total_cmp(&b1.confidence));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].class_id != xs[index].class_id {
                continue;
            }
            let iou = compute_iou(&xs[prev_index].bbox(), &xs[index].bbox());
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}
