// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 多目标跟踪公共组件
//! Common components for multi-object tracking

use anyhow::Result;

use super::types::{BBox, DecodedFrame, Detection, Track};

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
///
/// 跟踪算法的具体输出在边界处转换为统一的 [`Track`]
pub trait Tracker {
    /// 更新跟踪器
    ///
    /// # 参数
    /// - `detections`: 当前帧的 person 检测框 (x, y, w, h)
    /// - `frame`: 当前帧 (可用于外观关联)
    ///
    /// # 返回
    /// 当前帧内被观测到的跟踪对象 (含未确认)
    fn update(&mut self, detections: &[Detection], frame: &DecodedFrame) -> Result<Vec<Track>>;

    /// 重置跟踪器 (清除所有跟踪)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 卡尔曼滤波器 ==========

/// 简化卡尔曼滤波器 (单个边界框的位置和尺寸平滑)
/// 状态向量: [cx, cy, w, h, vx, vy, vw, vh], 协方差简化为对角阵
#[derive(Clone, Debug)]
pub struct KalmanBoxFilter {
    state: [f32; 8],
    p: [f32; 8],

    /// 过程噪声
    q: f32,

    /// 观测噪声
    r: f32,

    /// 速度衰减因子
    velocity_decay: f32,
}

impl KalmanBoxFilter {
    /// - `q`: 过程噪声 (0.1-1.0, 越小越平滑)
    /// - `r`: 观测噪声 (1.0-50.0, 越大越平滑)
    pub fn new(bbox: &BBox, q: f32, r: f32) -> Self {
        let (cx, cy) = bbox.center();
        Self {
            state: [cx, cy, bbox.width(), bbox.height(), 0.0, 0.0, 0.0, 0.0],
            p: [10.0; 8],
            q,
            r,
            velocity_decay: 0.95,
        }
    }

    /// 预测下一帧 (匀速模型 + 速度衰减)
    pub fn predict(&mut self) {
        for v in &mut self.state[4..] {
            *v *= self.velocity_decay;
        }
        for i in 0..4 {
            self.state[i] += self.state[i + 4];
        }
        for p in &mut self.p {
            *p += self.q;
        }
    }

    /// 融合观测值
    pub fn update(&mut self, bbox: &BBox) {
        let (cx, cy) = bbox.center();
        let residual = [
            cx - self.state[0],
            cy - self.state[1],
            bbox.width() - self.state[2],
            bbox.height() - self.state[3],
        ];

        for i in 0..4 {
            let k_pos = self.p[i] / (self.p[i] + self.r);
            let k_vel = self.p[i + 4] / (self.p[i + 4] + self.r * 10.0);
            self.state[i] += k_pos * residual[i];
            self.state[i + 4] += k_vel * residual[i];
            self.p[i] *= 1.0 - k_pos;
            self.p[i + 4] *= 1.0 - k_vel;
        }
    }

    /// 当前状态的边界框
    pub fn state_bbox(&self) -> BBox {
        Self::to_bbox(self.state[0], self.state[1], self.state[2], self.state[3])
    }

    /// 预测的边界框 (用于匹配)
    pub fn predicted_bbox(&self) -> BBox {
        Self::to_bbox(
            self.state[0] + self.state[4],
            self.state[1] + self.state[5],
            self.state[2] + self.state[6],
            self.state[3] + self.state[7],
        )
    }

    fn to_bbox(cx: f32, cy: f32, w: f32, h: f32) -> BBox {
        let w = w.max(1.0);
        let h = h.max(1.0);
        BBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }
}

// ========== 工具函数 ==========

/// 计算两个边界框的IOU (Intersection over Union)
pub fn compute_iou(bbox1: &BBox, bbox2: &BBox) -> f32 {
    let x1 = bbox1.x1.max(bbox2.x1);
    let y1 = bbox1.y1.max(bbox2.y1);
    let x2 = bbox1.x2.min(bbox2.x2);
    let y2 = bbox1.y2.min(bbox2.y2);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let intersection = (x2 - x1) * (y2 - y1);
    let union = bbox1.area() + bbox2.area() - intersection;

    if union <= 0.0 {
        return 0.0;
    }

    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((compute_iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(compute_iou(&a, &b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 0.0, 15.0, 10.0);
        // 50 / 150
        assert!((compute_iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn kalman_follows_moving_box() {
        let mut kf = KalmanBoxFilter::new(&BBox::new(0.0, 0.0, 10.0, 20.0), 0.1, 0.5);
        for step in 1..=20 {
            kf.predict();
            let dx = step as f32 * 2.0;
            kf.update(&BBox::new(dx, 0.0, dx + 10.0, 20.0));
        }
        let (cx, _) = kf.state_bbox().center();
        assert!((cx - 45.0).abs() < 3.0, "cx = {cx}");
        let (px, _) = kf.predicted_bbox().center();
        assert!(px > cx);
    }

    #[test]
    fn kalman_keeps_stationary_box_in_place() {
        let bbox = BBox::new(100.0, 50.0, 140.0, 150.0);
        let mut kf = KalmanBoxFilter::new(&bbox, 0.1, 0.5);
        for _ in 0..10 {
            kf.predict();
            kf.update(&bbox);
        }
        assert!(compute_iou(&kf.state_bbox(), &bbox) > 0.95);
    }
}
