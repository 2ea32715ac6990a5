// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 分区人数统计 (Zone Counter)
///
/// 以首帧高度的一半为界, 分别统计上半区 (Zone A) 与下半区 (Zone B)
/// 出现过的不同人数。
///
/// 运行期间在终端输入 `q` 并回车可提前结束。
use std::io::BufRead;
use std::thread;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zone_counter::detection::ByteTracker;
use zone_counter::input::VideoDecoder;
use zone_counter::pipeline::FrameObserver;
use zone_counter::render::Annotator;
use zone_counter::report::ZoneReport;
use zone_counter::{Args, FrameSequencer, StopSignal, YOLOv8};

/// 监听退出键 (q + 回车)
fn spawn_quit_listener(stop: StopSignal) {
    let spawned = thread::Builder::new()
        .name("quit-key".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().eq_ignore_ascii_case("q") {
                    info!("⌨️ 收到退出键");
                    stop.raise();
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("⚠️ 退出键监听线程启动失败: {}", e);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("🚀 分区人数统计启动");
    info!("📦 检测模型: {}", args.model.display());
    info!("📹 输入源: {}", args.source);

    let detector = YOLOv8::new(args.detector_config())?;
    let tracker = ByteTracker::new(args.tracker_config());
    let mut annotator = match args.annotator_config() {
        Some(config) => Some(Annotator::new(config)?),
        None => None,
    };

    let stop = StopSignal::new();
    spawn_quit_listener(stop.clone());
    info!("⌨️ 输入 q 并回车可提前结束");

    let source = VideoDecoder::open(args.source.clone(), args.queue);
    let sequencer = FrameSequencer::new(detector, tracker, args.sequencer_config());
    let observer = annotator.as_mut().map(|a| a as &mut dyn FrameObserver);
    let outcome = sequencer.run(source, &stop, observer)?;

    if let Some(annotator) = &annotator {
        info!("🖼️ 已保存标注帧: {}", annotator.saved());
    }

    let report = ZoneReport::new(args.source.clone(), &outcome);
    report.log_summary();
    if let Some(path) = &args.report {
        report.write_json(path)?;
    }

    let (zone_a, zone_b) = report.counts();
    println!("Zone A (Top): {}", zone_a);
    println!("Zone B (Bottom): {}", zone_b);

    Ok(())
}
