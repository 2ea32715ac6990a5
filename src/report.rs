// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 结果报告

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::counting::Zone;
use crate::pipeline::RunOutcome;

#[derive(Clone, Debug, Serialize)]
pub struct ZoneReport {
    pub source: String,
    pub zone_a: usize,
    pub zone_b: usize,
    pub frames: u64,
    pub cancelled: bool,
    pub elapsed_ms: u128,
    /// 首帧分割线 (无帧时为 None)
    pub split_line: Option<i64>,
    pub finished_at: DateTime<Local>,
}

impl ZoneReport {
    pub fn new(source: impl Into<String>, outcome: &RunOutcome) -> Self {
        let (zone_a, zone_b) = outcome.counts.as_tuple();
        Self {
            source: source.into(),
            zone_a,
            zone_b,
            frames: outcome.frames,
            cancelled: outcome.cancelled,
            elapsed_ms: outcome.elapsed.as_millis(),
            split_line: outcome.split.map(|s| s.line()),
            finished_at: Local::now(),
        }
    }

    /// (zone_a, zone_b)
    pub fn counts(&self) -> (usize, usize) {
        (self.zone_a, self.zone_b)
    }

    pub fn log_summary(&self) {
        info!(
            "📊 {} | 帧数:{} | 耗时:{}ms{}",
            self.source,
            self.frames,
            self.elapsed_ms,
            if self.cancelled { " | 已中止" } else { "" }
        );
        info!(zone = Zone::A.name(), count = self.zone_a, "👥 上半区去重人数");
        info!(zone = Zone::B.name(), count = self.zone_b, "👥 下半区去重人数");
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建报告目录失败: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("报告序列化失败")?;
        fs::write(path, json).with_context(|| format!("写入报告失败: {}", path.display()))?;
        info!("💾 报告已保存: {}", path.display());
        Ok(())
    }
}
