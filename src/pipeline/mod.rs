/// 逐帧处理流水线 (Frame Processing Pipeline)
///
/// 单线程顺序执行: 读帧 → 检测 → 跟踪 → 分区计数 → (可选)观察者
/// - Sequencer: 处理循环, 持有检测器与跟踪器
/// - Observer:  每帧回调 (渲染/调试), 与计数逻辑解耦
/// - StopSignal: 协作式取消, 每帧检查一次
pub mod observer;
pub mod sequencer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use observer::{FrameObserver, FrameView, ZonedTrack};
pub use sequencer::{FrameSequencer, RunOutcome, SequencerConfig};

/// 停止信号 (操作员退出键等)
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
