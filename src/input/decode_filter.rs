// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// FFmpeg解码过滤器模块
/// FFmpeg decode filter module
use std::time::Instant;

use crossbeam_channel::Sender;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use tracing::{debug, warn};

use crate::detection::types::DecodedFrame;

/// FFmpeg解码过滤器: 视频流 → RGB24帧 → 处理循环
///
/// 滤镜图已通过 `format=rgb24` 转换像素格式, 这里只按行拷贝去掉步长填充
pub struct DecodeFilter {
    tx: Sender<DecodedFrame>,
    pub count: usize,
    pub last: Instant,
    pub current_fps: f64,
    pub dropped_frames: usize,
    pub total_frames: usize,
}

impl DecodeFilter {
    pub fn new(tx: Sender<DecodedFrame>) -> Self {
        Self {
            tx,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
            dropped_frames: 0,
            total_frames: 0,
        }
    }

    fn drop_frame(&mut self, reason: &str) {
        self.dropped_frames += 1;
        if self.total_frames <= 10 {
            warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
        }
    }
}

impl FrameFilter for DecodeFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        debug!("✅ 解码线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        self.total_frames += 1;

        // SAFETY: as_ptr 只读取指针; is_empty 在指针非空时才求值
        if unsafe { frame.as_ptr().is_null() || frame.is_empty() } || frame.is_corrupt() {
            self.drop_frame("空帧/损坏帧");
            return Ok(None);
        }

        // SAFETY: 指针已判空, AVFrame 在本次回调内有效
        let raw = unsafe { &*frame.as_ptr() };
        let plane = raw.data[0];
        let Some((w, h, stride)) = plane_layout(raw.width, raw.height, raw.linesize[0]) else {
            self.drop_frame("非法分辨率或步长");
            return Ok(None);
        };
        if plane.is_null() {
            self.drop_frame("空数据平面");
            return Ok(None);
        }

        // SAFETY: RGB24 平面共 h 行, 每行起始间隔 stride, 末行至少 w*3 字节
        let plane = unsafe { std::slice::from_raw_parts(plane, stride * (h - 1) + w * 3) };
        let Some(buffer) = copy_rgb_rows(plane, w, h, stride) else {
            self.drop_frame("平面数据不足");
            return Ok(None);
        };

        self.count += 1;
        if self.last.elapsed().as_secs_f64() >= 1.0 {
            self.current_fps = self.count as f64 / self.last.elapsed().as_secs_f64();
            debug!(
                "📺 解码统计: {:.1}fps | 总帧{} | 丢弃{}",
                self.current_fps, self.total_frames, self.dropped_frames
            );
            self.last = Instant::now();
            self.count = 0;
        }

        // 阻塞发送: 文件输入不丢帧; 接收端关闭时停止解码
        if self
            .tx
            .send(DecodedFrame::new(buffer, w as u32, h as u32))
            .is_err()
        {
            return Err("frame receiver closed".to_string());
        }

        Ok(Some(frame))
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        debug!(
            total = self.total_frames,
            dropped = self.dropped_frames,
            "✅ 解码线程退出"
        );
    }
}

/// 校验 RGB24 帧尺寸与步长, 返回 (宽, 高, 步长)
///
/// 负步长 (垂直翻转) 不支持
pub fn plane_layout(width: i32, height: i32, linesize: i32) -> Option<(usize, usize, usize)> {
    if width <= 0 || height <= 0 || linesize <= 0 {
        return None;
    }
    let (w, h, stride) = (width as usize, height as usize, linesize as usize);
    if stride < w * 3 {
        return None;
    }
    Some((w, h, stride))
}

/// 按行拷贝 RGB24 平面, 去掉每行末尾的步长填充
pub fn copy_rgb_rows(plane: &[u8], width: usize, height: usize, stride: usize) -> Option<Vec<u8>> {
    let row_bytes = width * 3;
    if stride < row_bytes {
        return None;
    }
    if height > 0 && plane.len() < stride * (height - 1) + row_bytes {
        return None;
    }

    let mut buffer = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * stride;
        buffer.extend_from_slice(&plane[start..start + row_bytes]);
    }
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        // 2x2 RGB24, 每行 8 字节 (6 字节像素 + 2 字节填充)
        let plane = [
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ];
        let rgb = copy_rgb_rows(&plane, 2, 2, 8).unwrap();
        assert_eq!(rgb, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn last_row_may_omit_padding() {
        let plane = [1, 2, 3, 0xEE, 4, 5, 6];
        let rgb = copy_rgb_rows(&plane, 1, 2, 4).unwrap();
        assert_eq!(rgb, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn rejects_short_stride_and_short_plane() {
        let plane = [0u8; 12];
        assert!(copy_rgb_rows(&plane, 2, 2, 4).is_none());
        assert!(copy_rgb_rows(&plane, 2, 3, 6).is_none());
    }

    #[test]
    fn layout_rejects_negative_and_short_linesize() {
        assert_eq!(plane_layout(640, 480, 1920), Some((640, 480, 1920)));
        assert_eq!(plane_layout(640, 480, 1984), Some((640, 480, 1984)));
        assert!(plane_layout(640, 480, -1920).is_none());
        assert!(plane_layout(640, 480, 1000).is_none());
        assert!(plane_layout(0, 480, 1920).is_none());
    }
}
