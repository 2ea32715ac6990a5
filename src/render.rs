// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 标注帧输出 (Annotator)
//!
//! 作为 [`FrameObserver`] 接入处理循环, 不参与计数:
//! 分割线 + 区域标题 + 按区域着色的跟踪框与ID, 保存为JPEG

use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::counting::{Zone, ZoneCounts};
use crate::pipeline::{FrameObserver, FrameView};

/// 分割线颜色 (黄)
pub const LINE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
/// Zone A 颜色 (绿)
pub const ZONE_A_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Zone B 颜色 (红)
pub const ZONE_B_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const LINE_THICKNESS: i64 = 2;
const CAPTION_SCALE: f32 = 32.0;
const LABEL_SCALE: f32 = 20.0;

pub fn zone_color(zone: Zone) -> Rgb<u8> {
    match zone {
        Zone::A => ZONE_A_COLOR,
        Zone::B => ZONE_B_COLOR,
    }
}

/// 区域标题: 名称 + 累计人数
pub fn caption_text(zone: Zone, counts: &ZoneCounts) -> String {
    format!("{}: {}", zone.name(), counts.get(zone))
}

#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    pub out_dir: PathBuf,
    /// 每N帧保存一次
    pub save_every: u64,
    /// TrueType字体 (None 时只画几何图形)
    pub font: Option<PathBuf>,
}

pub struct Annotator {
    config: AnnotatorConfig,
    font: Option<FontVec>,
    saved: u64,
}

impl Annotator {
    pub fn new(config: AnnotatorConfig) -> Result<Self> {
        fs::create_dir_all(&config.out_dir)
            .with_context(|| format!("创建输出目录失败: {}", config.out_dir.display()))?;

        let font = match &config.font {
            Some(path) => {
                let data =
                    fs::read(path).with_context(|| format!("读取字体失败: {}", path.display()))?;
                let font = FontVec::try_from_vec(data)
                    .map_err(|e| anyhow::anyhow!("字体解析失败 {}: {}", path.display(), e))?;
                info!("✅ 字体加载成功: {}", path.display());
                Some(font)
            }
            None => {
                warn!("⚠️ 未指定字体, 标注帧不含文字");
                None
            }
        };

        Ok(Self {
            config,
            font,
            saved: 0,
        })
    }

    pub fn saved(&self) -> u64 {
        self.saved
    }

    /// 在帧副本上绘制标注
    pub fn annotate(&self, view: &FrameView<'_>) -> Option<RgbImage> {
        let mut img = view.frame.to_rgb_image()?;
        let (width, height) = img.dimensions();
        let split = view.split.line();

        // 分割线
        for dy in 0..LINE_THICKNESS {
            let y = (split + dy) as f32;
            if y >= 0.0 && y < height as f32 {
                draw_line_segment_mut(&mut img, (0.0, y), (width as f32, y), LINE_COLOR);
            }
        }

        if let Some(font) = &self.font {
            let caption = PxScale::from(CAPTION_SCALE);
            for (zone, y) in [(Zone::A, 15), (Zone::B, split as i32 + 15)] {
                let text = caption_text(zone, &view.counts);
                draw_text_mut(&mut img, zone_color(zone), 20, y, caption, font, &text);
            }
        }

        for zoned in view.tracks {
            let color = zone_color(zoned.zone);
            let (l, t, r, b) = zoned.track.to_ltrb();
            let (l, t, r, b) = (l as i32, t as i32, r as i32, b as i32);
            let w = (r - l).max(1) as u32;
            let h = (b - t).max(1) as u32;

            draw_hollow_rect_mut(&mut img, Rect::at(l, t).of_size(w, h), color);
            if w > 2 && h > 2 {
                draw_hollow_rect_mut(&mut img, Rect::at(l + 1, t + 1).of_size(w - 2, h - 2), color);
            }

            if let Some(font) = &self.font {
                let label = format!("ID {}", zoned.track.id);
                let y = (t - LABEL_SCALE as i32 - 4).max(0);
                draw_text_mut(&mut img, color, l, y, PxScale::from(LABEL_SCALE), font, &label);
            }
        }

        Some(img)
    }
}

impl FrameObserver for Annotator {
    fn on_frame(&mut self, view: &FrameView<'_>) -> Result<ControlFlow<()>> {
        if self.config.save_every == 0 || view.index % self.config.save_every != 0 {
            return Ok(ControlFlow::Continue(()));
        }

        let Some(img) = self.annotate(view) else {
            warn!(frame = view.index, "⚠️ RGB图像转换失败, 跳过标注");
            return Ok(ControlFlow::Continue(()));
        };

        let path = self
            .config
            .out_dir
            .join(format!("frame_{:06}.jpg", view.index));
        img.save(&path)
            .with_context(|| format!("保存标注帧失败: {}", path.display()))?;
        self.saved += 1;
        debug!(path = %path.display(), "标注帧已保存");

        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::ZoneSplit;
    use crate::detection::types::{BBox, DecodedFrame, Track, TrackId};
    use crate::pipeline::ZonedTrack;

    fn annotator(dir: PathBuf, save_every: u64) -> Annotator {
        Annotator::new(AnnotatorConfig {
            out_dir: dir,
            save_every,
            font: None,
        })
        .unwrap()
    }

    #[test]
    fn draws_split_line_and_zone_colored_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let ann = annotator(dir.path().to_path_buf(), 1);
        let frame = DecodedFrame::blank(64, 100);
        let tracks = vec![
            ZonedTrack {
                track: Track::new(TrackId(1), BBox::new(5.0, 10.0, 20.0, 30.0), true),
                zone: Zone::A,
            },
            ZonedTrack {
                track: Track::new(TrackId(2), BBox::new(30.0, 70.0, 50.0, 90.0), true),
                zone: Zone::B,
            },
        ];
        let view = FrameView {
            index: 0,
            frame: &frame,
            split: ZoneSplit::from_height(100),
            tracks: &tracks,
            counts: ZoneCounts { zone_a: 1, zone_b: 1 },
        };

        let img = ann.annotate(&view).unwrap();
        assert_eq!(*img.get_pixel(0, 50), LINE_COLOR);
        assert_eq!(*img.get_pixel(40, 51), LINE_COLOR);
        assert_eq!(*img.get_pixel(5, 10), ZONE_A_COLOR);
        assert_eq!(*img.get_pixel(30, 70), ZONE_B_COLOR);
        assert_eq!(*img.get_pixel(60, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn saves_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut ann = annotator(dir.path().join("frames"), 2);
        let frame = DecodedFrame::blank(8, 8);
        for index in 0..5 {
            let view = FrameView {
                index,
                frame: &frame,
                split: ZoneSplit::from_height(8),
                tracks: &[],
                counts: ZoneCounts::default(),
            };
            assert!(ann.on_frame(&view).unwrap().is_continue());
        }
        assert_eq!(ann.saved(), 3);
        assert!(dir.path().join("frames/frame_000004.jpg").exists());
        assert!(!dir.path().join("frames/frame_000001.jpg").exists());
    }

    #[test]
    fn captions_carry_zone_counts() {
        let counts = ZoneCounts { zone_a: 4, zone_b: 2 };
        assert_eq!(caption_text(Zone::A, &counts), "ZONE A: 4");
        assert_eq!(caption_text(Zone::B, &counts), "ZONE B: 2");
    }
}
