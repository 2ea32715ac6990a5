// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型
// 包含: 模型加载、预处理(letterbox)、推理、后处理(解码 + NMS)

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use fast_image_resize as fr;
use ndarray::{s, Array, ArrayView2, Axis, IxDyn};
use tracing::trace;

use crate::detection::types::{DecodedFrame, Detection, PERSON_CLASS_ID, PERSON_LABEL};
use crate::detection::Detector;
use crate::{non_max_suppression, OrtBackend, OrtConfig, OrtEP};

/// 坐标偏移: [cx, cy, w, h, cls0, cls1, ...]
const CXYWH_OFFSET: usize = 4;

/// letterbox 填充值
const PAD_VALUE: f32 = 144.0 / 255.0;

#[derive(Debug, Clone)]
pub struct YOLOv8Config {
    pub model: PathBuf,
    pub ep: OrtEP,
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    pub iou: f32,
    pub output_name: String,
    pub profile: bool,
}

impl Default for YOLOv8Config {
    fn default() -> Self {
        Self {
            model: PathBuf::from("models/yolov8n.onnx"),
            ep: OrtEP::CPU,
            width: 640,
            height: 640,
            conf: 0.25,
            iou: 0.45,
            output_name: String::from("output0"),
            profile: false,
        }
    }
}

/// YOLOv8 检测模型
pub struct YOLOv8 {
    engine: OrtBackend,
    conf: f32,
    iou: f32,
    profile: bool,
    resizer: fr::Resizer,
}

impl YOLOv8 {
    pub fn new(config: YOLOv8Config) -> Result<Self> {
        let engine = OrtBackend::build(OrtConfig {
            f: config.model,
            ep: config.ep,
            image_size: (config.height, config.width),
            output_name: config.output_name,
        })?;

        Ok(Self {
            engine,
            conf: config.conf,
            iou: config.iou,
            profile: config.profile,
            resizer: fr::Resizer::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.engine.width()
    }

    pub fn height(&self) -> u32 {
        self.engine.height()
    }

    /// 预处理: RGB帧 → NCHW张量 (左上对齐 letterbox), 返回缩放比例
    pub fn preprocess(&mut self, frame: &DecodedFrame) -> Result<(Array<f32, IxDyn>, f32)> {
        let (w1, h1) = (self.width(), self.height());
        let (ratio, w_new, h_new) =
            scale_wh(frame.width as f32, frame.height as f32, w1 as f32, h1 as f32);
        let (w_new, h_new) = ((w_new as u32).max(1), (h_new as u32).max(1));

        let src_image = fr::images::Image::from_vec_u8(
            frame.width,
            frame.height,
            frame.rgb_data.as_ref().clone(),
            fr::PixelType::U8x3,
        )?;
        let mut dst_image = fr::images::Image::new(w_new, h_new, fr::PixelType::U8x3);
        self.resizer.resize(
            &src_image,
            &mut dst_image,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
        )?;

        let mut ys = Array::from_elem((1, 3, h1 as usize, w1 as usize), PAD_VALUE).into_dyn();
        for (i, rgb) in dst_image.buffer().chunks_exact(3).enumerate() {
            let x = i % w_new as usize;
            let y = i / w_new as usize;
            ys[[0, 0, y, x]] = rgb[0] as f32 / 255.0;
            ys[[0, 1, y, x]] = rgb[1] as f32 / 255.0;
            ys[[0, 2, y, x]] = rgb[2] as f32 / 255.0;
        }

        Ok((ys, ratio))
    }

    /// 后处理: [1, 4 + nc, anchors] → 原图坐标检测框
    pub fn postprocess(
        &self,
        ys: &Array<f32, IxDyn>,
        ratio: f32,
        frame: &DecodedFrame,
    ) -> Result<Vec<Detection>> {
        if ys.ndim() != 3 || ys.shape()[1] <= CXYWH_OFFSET {
            bail!("YOLOv8 输出形状异常: {:?}", ys.shape());
        }
        let preds = ys.index_axis(Axis(0), 0);
        let preds = preds.into_dimensionality::<ndarray::Ix2>()?;

        let mut detections = decode_predictions(
            preds,
            ratio,
            frame.width as f32,
            frame.height as f32,
            self.conf,
        );
        non_max_suppression(&mut detections, self.iou);
        Ok(detections)
    }
}

impl Detector for YOLOv8 {
    fn detect(&mut self, frame: &DecodedFrame) -> Result<Vec<Detection>> {
        let t_pre = Instant::now();
        let (xs, ratio) = self.preprocess(frame)?;
        let pre_elapsed = t_pre.elapsed();

        let t_run = Instant::now();
        let ys = self.engine.run(xs)?;
        let run_elapsed = t_run.elapsed();

        let t_post = Instant::now();
        let detections = self.postprocess(&ys, ratio, frame)?;

        if self.profile {
            trace!(
                preprocess = ?pre_elapsed,
                inference = ?run_elapsed,
                postprocess = ?t_post.elapsed(),
                "[Model] 推理耗时"
            );
        }
        Ok(detections)
    }
}

/// 等比缩放: 返回 (比例, 新宽, 新高)
pub fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// 类别标签 (只关心 person)
fn class_label(id: usize) -> String {
    if id == PERSON_CLASS_ID {
        PERSON_LABEL.to_string()
    } else {
        format!("class{}", id)
    }
}

/// 逐anchor解码: 取最高分类别, 过滤低置信度, 还原到原图并裁剪
pub fn decode_predictions(
    preds: ArrayView2<f32>,
    ratio: f32,
    width_original: f32,
    height_original: f32,
    conf: f32,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    for pred in preds.axis_iter(Axis(1)) {
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..]);

        let Some((id, &confidence)) = clss
            .iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        else {
            continue;
        };

        if confidence < conf {
            continue;
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        let x1 = (cx - w / 2.).clamp(0.0, width_original);
        let y1 = (cy - h / 2.).clamp(0.0, height_original);
        let x2 = (cx + w / 2.).clamp(0.0, width_original);
        let y2 = (cy + h / 2.).clamp(0.0, height_original);

        detections.push(Detection::from_xyxy(
            x1,
            y1,
            x2,
            y2,
            id,
            class_label(id),
            confidence,
        ));
    }
    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 构造 [4 + nc, anchors] 预测
    fn preds(anchors: &[([f32; 4], usize, f32)], nc: usize) -> Array2<f32> {
        let mut a = Array2::<f32>::zeros((CXYWH_OFFSET + nc, anchors.len()));
        for (j, (cxcywh, cls, score)) in anchors.iter().enumerate() {
            for k in 0..4 {
                a[[k, j]] = cxcywh[k];
            }
            a[[CXYWH_OFFSET + cls, j]] = *score;
        }
        a
    }

    #[test]
    fn scale_wh_keeps_aspect_ratio() {
        let (r, w, h) = scale_wh(1280.0, 720.0, 640.0, 640.0);
        assert_eq!(r, 0.5);
        assert_eq!((w, h), (640.0, 360.0));
    }

    #[test]
    fn decode_maps_boxes_back_to_frame() {
        let p = preds(&[([100.0, 50.0, 40.0, 20.0], 0, 0.9)], 3);
        let dets = decode_predictions(p.view(), 0.5, 1280.0, 720.0, 0.25);
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!((d.x, d.y, d.width, d.height), (160.0, 80.0, 80.0, 40.0));
        assert_eq!(d.label, "person");
        assert!(d.is_person());
    }

    #[test]
    fn decode_drops_low_confidence_and_keeps_class() {
        let p = preds(
            &[
                ([10.0, 10.0, 4.0, 4.0], 0, 0.1),
                ([30.0, 30.0, 4.0, 4.0], 2, 0.8),
            ],
            3,
        );
        let dets = decode_predictions(p.view(), 1.0, 100.0, 100.0, 0.25);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 2);
        assert!(!dets[0].is_person());
    }

    #[test]
    fn decode_clamps_to_frame() {
        let p = preds(&[([2.0, 98.0, 10.0, 10.0], 0, 0.9)], 1);
        let dets = decode_predictions(p.view(), 1.0, 100.0, 100.0, 0.25);
        let b = dets[0].bbox();
        assert_eq!((b.x1, b.y1, b.x2, b.y2), (0.0, 93.0, 7.0, 100.0));
    }

    #[test]
    fn overlapping_chair_keeps_person_after_nms() {
        let p = preds(
            &[
                ([125.0, 150.0, 50.0, 100.0], 0, 0.90),
                ([127.0, 152.0, 50.0, 100.0], 56, 0.95),
            ],
            80,
        );
        let mut dets = decode_predictions(p.view(), 1.0, 640.0, 480.0, 0.25);
        non_max_suppression(&mut dets, 0.45);
        assert_eq!(dets.len(), 2);
        assert_eq!(dets.iter().filter(|d| d.is_person()).count(), 1);
    }
}
