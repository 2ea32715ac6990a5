// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 命令行参数, 以及到各模块配置的转换

use std::path::PathBuf;

use clap::Parser;

use crate::detection::bytetrack::TrackerConfig;
use crate::input::decoder::DEFAULT_QUEUE;
use crate::models::YOLOv8Config;
use crate::ort_backend::OrtEP;
use crate::pipeline::SequencerConfig;
use crate::render::AnnotatorConfig;

/// 分区人数统计参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "分区去重人数统计 (上半区 / 下半区)", long_about = None)]
pub struct Args {
    /// 视频文件或流地址
    #[arg(short, long)]
    pub source: String,

    /// ONNX 检测模型
    #[arg(short, long, default_value = "models/yolov8n.onnx")]
    pub model: PathBuf,

    /// 模型输入宽度
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// 模型输入高度
    #[arg(long, default_value_t = 640)]
    pub height: u32,

    /// 置信度阈值
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IoU 阈值
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT (优先于 --cuda)
    #[arg(long)]
    pub trt: bool,

    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// 打印推理各阶段耗时
    #[arg(long)]
    pub profile: bool,

    /// 已确认轨迹最大丢失帧数
    #[arg(long, default_value_t = 30)]
    pub max_age: u32,

    /// 确认轨迹所需命中帧数
    #[arg(long, default_value_t = 3)]
    pub n_init: u32,

    /// 最多处理帧数
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// 标注帧输出目录 (不指定则不输出)
    #[arg(long)]
    pub annotate_dir: Option<PathBuf>,

    /// 每N帧保存一张标注帧
    #[arg(long, default_value_t = 1)]
    pub save_every: u64,

    /// 标注文字字体 (TTF/OTF)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// JSON 报告路径
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 解码帧队列长度
    #[arg(long, default_value_t = DEFAULT_QUEUE)]
    pub queue: usize,
}

impl Args {
    pub fn ep(&self) -> OrtEP {
        if self.trt {
            OrtEP::Trt(self.device_id)
        } else if self.cuda {
            OrtEP::CUDA(self.device_id)
        } else {
            OrtEP::CPU
        }
    }

    pub fn detector_config(&self) -> YOLOv8Config {
        YOLOv8Config {
            model: self.model.clone(),
            ep: self.ep(),
            width: self.width,
            height: self.height,
            conf: self.conf,
            iou: self.iou,
            profile: self.profile,
            ..Default::default()
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_age: self.max_age,
            n_init: self.n_init.max(1),
            ..Default::default()
        }
    }

    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            max_frames: self.max_frames,
        }
    }

    pub fn annotator_config(&self) -> Option<AnnotatorConfig> {
        self.annotate_dir.as_ref().map(|dir| AnnotatorConfig {
            out_dir: dir.clone(),
            save_every: self.save_every.max(1),
            font: self.font.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["zone_counter", "-s", "video.mp4"]);
        assert_eq!(args.source, "video.mp4");
        assert_eq!(args.ep(), OrtEP::CPU);
        assert!(args.annotator_config().is_none());
        assert_eq!(args.sequencer_config().max_frames, None);

        let tracker = args.tracker_config();
        assert_eq!(tracker.max_age, 30);
        assert_eq!(tracker.n_init, 3);

        let detector = args.detector_config();
        assert_eq!(detector.width, 640);
        assert_eq!(detector.output_name, "output0");
    }

    #[test]
    fn trt_takes_precedence_over_cuda() {
        let args = Args::parse_from([
            "zone_counter",
            "-s",
            "rtsp://cam/1",
            "--cuda",
            "--trt",
            "--device-id",
            "1",
        ]);
        assert_eq!(args.ep(), OrtEP::Trt(1));
    }

    #[test]
    fn annotation_and_limits() {
        let args = Args::parse_from([
            "zone_counter",
            "--source",
            "video.mp4",
            "--annotate-dir",
            "out",
            "--save-every",
            "0",
            "--max-frames",
            "100",
            "--n-init",
            "0",
        ]);
        let ann = args.annotator_config().unwrap();
        assert_eq!(ann.out_dir, PathBuf::from("out"));
        assert_eq!(ann.save_every, 1);
        assert_eq!(args.sequencer_config().max_frames, Some(100));
        assert_eq!(args.tracker_config().n_init, 1);
    }

    #[test]
    fn source_is_required() {
        assert!(Args::try_parse_from(["zone_counter"]).is_err());
    }
}
