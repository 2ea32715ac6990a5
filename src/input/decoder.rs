// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频解码器 (文件 / RTSP / HTTP 流)
/// Video decoder yielding RGB frames in order
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::Receiver;
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use tracing::{info, warn};

use super::decode_filter::DecodeFilter;
use crate::detection::types::DecodedFrame;

/// 默认帧队列长度
pub const DEFAULT_QUEUE: usize = 120;

/// 视频解码器
///
/// FFmpeg 在独立线程中解码, 帧通过有界队列按顺序交给处理循环。
/// 打不开的输入不会报错, 直接表现为空流。
pub struct VideoDecoder {
    rx: Receiver<DecodedFrame>,
    worker: Option<JoinHandle<()>>,
}

impl VideoDecoder {
    pub fn open(source: impl Into<String>, queue: usize) -> Self {
        let source = source.into();
        let (tx, rx) = crossbeam_channel::bounded(queue.max(1));

        info!("🎬 解码器启动");
        info!("📹 输入源: {}", source);

        let worker = thread::Builder::new()
            .name("decoder".to_string())
            .spawn(move || {
                // 线程退出时 filter 被释放, 发送端随之关闭 → 处理循环收到流结束
                if let Err(e) = decode(&source, DecodeFilter::new(tx)) {
                    warn!("❌ 视频解码失败, 视为空流: {}", e);
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("❌ 解码线程启动失败: {}", e);
                None
            }
        };

        Self { rx, worker }
    }
}

impl Iterator for VideoDecoder {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<DecodedFrame> {
        match self.rx.recv() {
            Ok(frame) => Some(frame),
            Err(_) => {
                if let Some(worker) = self.worker.take() {
                    let _ = worker.join();
                }
                None
            }
        }
    }
}

/// 构建并运行 FFmpeg 上下文, 阻塞到解码结束
fn decode(source: &str, filter: DecodeFilter) -> Result<()> {
    let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
    let pipe = pipe.filter("decode", Box::new(filter));
    let out = create_null_output().add_frame_pipeline(pipe);

    let ctx = FfmpegContext::builder()
        .input(Input::from(source.to_string()))
        .filter_descs(["format=rgb24"].into())
        .output(out)
        .build()
        .map_err(|e| anyhow!("构建失败: {}", e))?;

    let sch = ctx.start().map_err(|e| anyhow!("启动失败: {}", e))?;
    info!("✅ 解码启动成功");

    sch.wait().map_err(|e| anyhow!("解码中断: {}", e))?;
    info!("✅ 解码线程正常退出");
    Ok(())
}
