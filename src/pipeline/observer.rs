// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 每帧观察者 (渲染/调试用)

use std::ops::ControlFlow;

use anyhow::Result;

use crate::counting::{Zone, ZoneCounts, ZoneSplit};
use crate::detection::types::{DecodedFrame, Track};

/// 已确认并完成分区判定的跟踪对象
#[derive(Clone, Debug, PartialEq)]
pub struct ZonedTrack {
    pub track: Track,
    pub zone: Zone,
}

/// 单帧处理状态
pub struct FrameView<'a> {
    /// 帧序号 (从0开始)
    pub index: u64,
    pub frame: &'a DecodedFrame,
    pub split: ZoneSplit,
    pub tracks: &'a [ZonedTrack],
    /// 截至本帧的累计人数
    pub counts: ZoneCounts,
}

/// 观察者只读取状态, 返回 `Break` 可提前结束处理
pub trait FrameObserver {
    fn on_frame(&mut self, view: &FrameView<'_>) -> Result<ControlFlow<()>>;
}

impl<F> FrameObserver for F
where
    F: FnMut(&FrameView<'_>) -> Result<ControlFlow<()>>,
{
    fn on_frame(&mut self, view: &FrameView<'_>) -> Result<ControlFlow<()>> {
        self(view)
    }
}
