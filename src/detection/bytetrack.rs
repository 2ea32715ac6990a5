// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ByteTrack 算法实现 (带确认生命周期)
//! ByteTrack: Simple and effective multi-object tracking
//!
//! 核心思想:
//! 1. 高低分检测框分开处理
//! 2. 高分框优先匹配 (IOU)
//! 3. 低分框救援丢失的轨迹
//! 4. 新轨迹需连续命中 `n_init` 帧才被确认, 确认前丢失一帧即删除
//! 5. 已确认轨迹连续丢失超过 `max_age` 帧后删除

use anyhow::Result;
use tracing::debug;

use super::tracker::{compute_iou, KalmanBoxFilter, Tracker};
use super::types::{BBox, DecodedFrame, Detection, Track, TrackId};

/// 跟踪器参数
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// 已确认轨迹最大允许丢失帧数
    pub max_age: u32,

    /// 确认所需连续命中帧数
    pub n_init: u32,

    /// 高分检测阈值
    pub high_score_threshold: f32,

    /// 低分检测阈值 (用于救援)
    pub low_score_threshold: f32,

    /// 高分匹配 IOU 阈值
    pub high_iou_threshold: f32,

    /// 低分匹配 IOU 阈值
    pub low_iou_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            n_init: 3,
            high_score_threshold: 0.4,
            low_score_threshold: 0.1,
            high_iou_threshold: 0.3,
            low_iou_threshold: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrackState {
    Tentative,
    Confirmed,
}

/// ByteTrack 跟踪对象
#[derive(Clone, Debug)]
struct ByteTrackedPerson {
    id: TrackId,
    kalman: KalmanBoxFilter,
    bbox: BBox,
    state: TrackState,

    /// 连续命中帧数
    hits: u32,

    /// 距上次匹配的帧数
    time_since_update: u32,

    score: f32,
}

impl ByteTrackedPerson {
    fn new(id: TrackId, detection: &Detection, n_init: u32) -> Self {
        // 降低观测噪声(r=0.5),更信任检测结果
        let kalman = KalmanBoxFilter::new(&detection.bbox(), 0.1, 0.5);
        let state = if n_init <= 1 {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        };

        Self {
            id,
            bbox: kalman.state_bbox(),
            kalman,
            state,
            hits: 1,
            time_since_update: 0,
            score: detection.confidence,
        }
    }

    fn predict(&mut self) {
        self.kalman.predict();
        self.bbox = self.kalman.state_bbox();
    }

    fn update(&mut self, detection: &Detection, n_init: u32) {
        self.kalman.update(&detection.bbox());
        self.bbox = self.kalman.state_bbox();
        self.hits += 1;
        self.time_since_update = 0;
        self.score = detection.confidence;

        if self.state == TrackState::Tentative && self.hits >= n_init {
            self.state = TrackState::Confirmed;
        }
    }

    fn mark_missed(&mut self) {
        self.time_since_update += 1;
        self.hits = 0;
    }

    fn is_deleted(&self, max_age: u32) -> bool {
        match self.state {
            TrackState::Tentative => self.time_since_update > 0,
            TrackState::Confirmed => self.time_since_update > max_age,
        }
    }

    fn to_track(&self) -> Track {
        Track::new(self.id, self.bbox.clone(), self.state == TrackState::Confirmed)
    }
}

/// ByteTrack 追踪器
pub struct ByteTracker {
    tracked_persons: Vec<ByteTrackedPerson>,

    /// 下一个分配的ID (单调递增, 不复用)
    next_id: u64,

    config: TrackerConfig,
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracked_persons: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// 更新跟踪 (ByteTrack 三步匹配)
    fn step(&mut self, detections: &[Detection]) -> Vec<Track> {
        // 1. 所有轨迹先预测
        for tracked in &mut self.tracked_persons {
            tracked.predict();
        }

        // 2. 分离高低分检测框
        let mut high_dets: Vec<usize> = Vec::new();
        let mut low_dets: Vec<usize> = Vec::new();
        for (idx, det) in detections.iter().enumerate() {
            if det.confidence >= self.config.high_score_threshold {
                high_dets.push(idx);
            } else if det.confidence >= self.config.low_score_threshold {
                low_dets.push(idx);
            }
        }

        // 3. 第一轮匹配: 高分检测 + 所有轨迹
        let mut matched_det = vec![false; detections.len()];
        let mut matched_track = vec![false; self.tracked_persons.len()];

        let all_tracks: Vec<usize> = (0..self.tracked_persons.len()).collect();
        let assignments = self.match_detections_to_tracks(
            detections,
            &high_dets,
            &all_tracks,
            self.config.high_iou_threshold,
        );
        for (det_idx, track_idx) in assignments {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracked_persons[track_idx].update(&detections[det_idx], self.config.n_init);
        }

        // 4. 第二轮匹配: 低分检测 + 未匹配的轨迹 (救援)
        let unmatched_tracks: Vec<usize> = (0..self.tracked_persons.len())
            .filter(|&idx| !matched_track[idx])
            .collect();
        let low_assignments = self.match_detections_to_tracks(
            detections,
            &low_dets,
            &unmatched_tracks,
            self.config.low_iou_threshold,
        );
        for (det_idx, track_idx) in low_assignments {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracked_persons[track_idx].update(&detections[det_idx], self.config.n_init);
        }

        // 5. 未匹配的轨迹 → 标记丢失
        for (track_idx, &matched) in matched_track.iter().enumerate() {
            if !matched {
                self.tracked_persons[track_idx].mark_missed();
            }
        }

        // 6. 未匹配的高分检测 → 新建轨迹
        for &det_idx in &high_dets {
            if !matched_det[det_idx] {
                let id = TrackId(self.next_id);
                self.next_id += 1;
                debug!(track = %id, "新建轨迹");
                self.tracked_persons.push(ByteTrackedPerson::new(
                    id,
                    &detections[det_idx],
                    self.config.n_init,
                ));
            }
        }

        // 7. 删除丢失太久 (或确认前丢失) 的轨迹
        let max_age = self.config.max_age;
        self.tracked_persons.retain(|t| !t.is_deleted(max_age));

        // 只返回本帧被观测到的轨迹
        self.tracked_persons
            .iter()
            .filter(|t| t.time_since_update == 0)
            .map(ByteTrackedPerson::to_track)
            .collect()
    }

    /// IOU 贪心匹配
    fn match_detections_to_tracks(
        &self,
        detections: &[Detection],
        det_indices: &[usize],
        track_indices: &[usize],
        iou_threshold: f32,
    ) -> Vec<(usize, usize)> {
        if det_indices.is_empty() || track_indices.is_empty() {
            return Vec::new();
        }

        // 候选对: (代价, 检测索引, 轨迹索引)
        let mut candidates = Vec::new();
        for &det_idx in det_indices {
            let det_bbox = detections[det_idx].bbox();
            for &track_idx in track_indices {
                let track = &self.tracked_persons[track_idx];
                let iou = compute_iou(&det_bbox, &track.kalman.predicted_bbox())
                    .max(compute_iou(&det_bbox, &track.bbox));
                if iou >= iou_threshold {
                    candidates.push((1.0 - iou, det_idx, track_idx));
                }
            }
        }

        // 按代价排序
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut assignments = Vec::new();
        let mut used_det = vec![false; detections.len()];
        let mut used_track = vec![false; self.tracked_persons.len()];
        for (_, det_idx, track_idx) in candidates {
            if !used_det[det_idx] && !used_track[track_idx] {
                assignments.push((det_idx, track_idx));
                used_det[det_idx] = true;
                used_track[track_idx] = true;
            }
        }

        assignments
    }
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracker for ByteTracker {
    fn update(&mut self, detections: &[Detection], _frame: &DecodedFrame) -> Result<Vec<Track>> {
        Ok(self.step(detections))
    }

    fn reset(&mut self) {
        self.tracked_persons.clear();
    }

    fn track_count(&self) -> usize {
        self.tracked_persons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DecodedFrame {
        DecodedFrame::blank(4, 4)
    }

    fn person(x: f32, y: f32) -> Detection {
        Detection::person(x, y, 40.0, 100.0, 0.9)
    }

    #[test]
    fn track_is_confirmed_after_n_init_hits() {
        let mut tracker = ByteTracker::default();
        let f = frame();

        let t1 = tracker.update(&[person(100.0, 50.0)], &f).unwrap();
        let t2 = tracker.update(&[person(101.0, 50.0)], &f).unwrap();
        let t3 = tracker.update(&[person(102.0, 50.0)], &f).unwrap();

        assert_eq!(t1.len(), 1);
        assert!(!t1[0].confirmed);
        assert!(!t2[0].confirmed);
        assert!(t3[0].confirmed);
        assert_eq!(t1[0].id, t3[0].id);
    }

    #[test]
    fn tentative_track_missing_one_frame_is_deleted() {
        let mut tracker = ByteTracker::default();
        let f = frame();

        let first = tracker.update(&[person(100.0, 50.0)], &f).unwrap();
        assert!(tracker.update(&[], &f).unwrap().is_empty());
        assert_eq!(tracker.track_count(), 0);

        let again = tracker.update(&[person(100.0, 50.0)], &f).unwrap();
        assert_ne!(first[0].id, again[0].id);
    }

    #[test]
    fn confirmed_track_survives_short_occlusion() {
        let mut tracker = ByteTracker::default();
        let f = frame();

        let mut id = None;
        for _ in 0..4 {
            let tracks = tracker.update(&[person(200.0, 80.0)], &f).unwrap();
            id = Some(tracks[0].id);
        }
        for _ in 0..10 {
            assert!(tracker.update(&[], &f).unwrap().is_empty());
        }
        let tracks = tracker.update(&[person(200.0, 80.0)], &f).unwrap();
        assert_eq!(Some(tracks[0].id), id);
        assert!(tracks[0].confirmed);
    }

    #[test]
    fn confirmed_track_is_dropped_after_max_age() {
        let config = TrackerConfig {
            max_age: 2,
            ..TrackerConfig::default()
        };
        let mut tracker = ByteTracker::new(config);
        let f = frame();

        for _ in 0..3 {
            tracker.update(&[person(200.0, 80.0)], &f).unwrap();
        }
        for _ in 0..3 {
            tracker.update(&[], &f).unwrap();
        }
        assert_eq!(tracker.track_count(), 0);
    }

    #[test]
    fn separate_people_get_separate_ids() {
        let mut tracker = ByteTracker::default();
        let f = frame();

        let tracks = tracker
            .update(&[person(10.0, 10.0), person(400.0, 300.0)], &f)
            .unwrap();
        assert_eq!(tracks.len(), 2);
        assert_ne!(tracks[0].id, tracks[1].id);
    }

    #[test]
    fn low_score_detection_does_not_start_a_track() {
        let mut tracker = ByteTracker::default();
        let weak = Detection::person(10.0, 10.0, 40.0, 100.0, 0.2);
        assert!(tracker.update(&[weak], &frame()).unwrap().is_empty());
    }

    #[test]
    fn low_score_detection_rescues_existing_track() {
        let mut tracker = ByteTracker::default();
        let f = frame();
        let strong = tracker.update(&[person(10.0, 10.0)], &f).unwrap();
        let weak = Detection::person(11.0, 10.0, 40.0, 100.0, 0.2);
        let rescued = tracker.update(&[weak], &f).unwrap();
        assert_eq!(rescued.len(), 1);
        assert_eq!(rescued[0].id, strong[0].id);
    }

    #[test]
    fn n_init_of_one_confirms_immediately() {
        let config = TrackerConfig {
            n_init: 1,
            ..TrackerConfig::default()
        };
        let mut tracker = ByteTracker::new(config);
        let tracks = tracker.update(&[person(10.0, 10.0)], &frame()).unwrap();
        assert!(tracks[0].confirmed);
    }

    #[test]
    fn coasting_track_is_kept_but_not_reported() {
        let mut tracker = ByteTracker::default();
        let f = frame();

        for step in 0..5 {
            let y = 10.0 + step as f32 * 4.0;
            tracker.update(&[person(100.0, y)], &f).unwrap();
        }
        for _ in 0..10 {
            assert!(tracker.update(&[], &f).unwrap().is_empty());
            assert_eq!(tracker.track_count(), 1);
        }
    }
}
