// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 处理循环 (Frame Sequencer)
//! 职责: 帧源 → 检测 → person过滤 → 跟踪 → 分区计数 → 观察者

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::observer::{FrameObserver, FrameView, ZonedTrack};
use super::StopSignal;
use crate::counting::{UniqueCounter, ZoneCounts, ZoneSplit};
use crate::detection::types::DecodedFrame;
use crate::detection::{person_detections, Detector, Tracker};

#[derive(Clone, Debug, Default)]
pub struct SequencerConfig {
    /// 最多处理帧数 (None = 直到流结束)
    pub max_frames: Option<u64>,
}

/// 一次处理的结果
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    pub counts: ZoneCounts,
    pub frames: u64,
    /// 是否被停止信号或观察者提前终止
    pub cancelled: bool,
    pub elapsed: Duration,
    /// 首帧确定的分割线 (无帧时为 None)
    pub split: Option<ZoneSplit>,
}

/// 每秒吞吐统计
struct ThroughputStats {
    count: u64,
    last: Instant,
    detect_ms: f64,
    track_ms: f64,
}

impl ThroughputStats {
    fn new() -> Self {
        Self {
            count: 0,
            last: Instant::now(),
            detect_ms: 0.0,
            track_ms: 0.0,
        }
    }

    fn tick(&mut self, detect_ms: f64, track_ms: f64, people: usize, counts: ZoneCounts) {
        self.count += 1;
        self.detect_ms += detect_ms;
        self.track_ms += track_ms;

        let elapsed = self.last.elapsed();
        if elapsed.as_secs() >= 1 {
            let n = self.count as f64;
            info!(
                "🎯 检测+跟踪: {}人 | {:.1}fps (检测:{:.1}ms | 跟踪:{:.1}ms) | A:{} B:{}",
                people,
                n / elapsed.as_secs_f64(),
                self.detect_ms / n,
                self.track_ms / n,
                counts.zone_a,
                counts.zone_b
            );
            *self = Self::new();
        }
    }
}

/// 处理循环, 在整个运行期间持有检测器与跟踪器
pub struct FrameSequencer<D, T> {
    detector: D,
    tracker: T,
    config: SequencerConfig,
}

impl<D: Detector, T: Tracker> FrameSequencer<D, T> {
    pub fn new(detector: D, tracker: T, config: SequencerConfig) -> Self {
        Self {
            detector,
            tracker,
            config,
        }
    }

    /// 处理整个帧序列, 结束后释放检测器与跟踪器
    pub fn run<S>(
        mut self,
        source: S,
        stop: &StopSignal,
        observer: Option<&mut dyn FrameObserver>,
    ) -> Result<RunOutcome>
    where
        S: IntoIterator<Item = DecodedFrame>,
    {
        let outcome = self.process(source, stop, observer);
        self.finish();
        outcome
    }

    fn process<S>(
        &mut self,
        source: S,
        stop: &StopSignal,
        mut observer: Option<&mut dyn FrameObserver>,
    ) -> Result<RunOutcome>
    where
        S: IntoIterator<Item = DecodedFrame>,
    {
        let start = Instant::now();
        let mut frames = source.into_iter();
        let mut counter: Option<UniqueCounter> = None;
        let mut frame_size = None;
        let mut index: u64 = 0;
        let mut cancelled = false;
        let mut stats = ThroughputStats::new();

        loop {
            if stop.is_raised() {
                info!("🛑 收到停止信号, 提前结束");
                cancelled = true;
                break;
            }
            if self.config.max_frames.is_some_and(|max| index >= max) {
                info!(frames = index, "已达到最大帧数");
                break;
            }
            let Some(frame) = frames.next() else {
                break;
            };

            match frame_size {
                None => frame_size = Some((frame.width, frame.height)),
                Some(size) if size != (frame.width, frame.height) => {
                    warn!(
                        "⚠️ 帧尺寸变化 {:?} → {}x{}, 沿用首帧分割线",
                        size, frame.width, frame.height
                    );
                    frame_size = Some((frame.width, frame.height));
                }
                Some(_) => {}
            }

            let t_detect = Instant::now();
            let detections = self
                .detector
                .detect(&frame)
                .with_context(|| format!("第{}帧检测失败", index))?;
            let people = person_detections(&detections);
            let detect_ms = t_detect.elapsed().as_secs_f64() * 1000.0;

            let t_track = Instant::now();
            let tracks = self
                .tracker
                .update(&people, &frame)
                .with_context(|| format!("第{}帧跟踪更新失败", index))?;
            let track_ms = t_track.elapsed().as_secs_f64() * 1000.0;

            let counter = counter.get_or_insert_with(|| {
                let split = ZoneSplit::from_height(frame.height);
                info!(
                    width = frame.width,
                    height = frame.height,
                    split = split.line(),
                    "📐 分割线已确定"
                );
                UniqueCounter::new(split)
            });

            let zoned: Vec<ZonedTrack> = tracks
                .iter()
                .filter_map(|track| {
                    counter.observe(track).map(|zone| ZonedTrack {
                        track: track.clone(),
                        zone,
                    })
                })
                .collect();
            let counts = counter.counts();

            if let Some(observer) = observer.as_mut() {
                let view = FrameView {
                    index,
                    frame: &frame,
                    split: counter.split(),
                    tracks: &zoned,
                    counts,
                };
                let flow = observer
                    .on_frame(&view)
                    .with_context(|| format!("第{}帧观察者处理失败", index))?;
                if flow.is_break() {
                    index += 1;
                    info!("🛑 观察者请求退出");
                    cancelled = true;
                    break;
                }
            }

            index += 1;
            stats.tick(detect_ms, track_ms, people.len(), counts);
        }

        let split = counter.as_ref().map(UniqueCounter::split);
        let counts = counter.map(UniqueCounter::into_counts).unwrap_or_default();
        if index == 0 {
            warn!("⚠️ 没有读到任何帧, 结果为 (0, 0)");
        }

        Ok(RunOutcome {
            counts,
            frames: index,
            cancelled,
            elapsed: start.elapsed(),
            split,
        })
    }

    fn finish(&mut self) {
        info!(
            tracks = self.tracker.track_count(),
            "✅ 处理结束, 释放检测器与跟踪器"
        );
        self.tracker.reset();
    }
}
