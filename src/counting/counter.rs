// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 去重计数器 (Unique Counter)
//!
//! 每个区域维护一个跟踪ID集合, 只增不减。
//! 同一ID跨线后会同时出现在两个集合里。

use std::collections::HashSet;

use serde::Serialize;

use super::zone::{Zone, ZoneSplit};
use crate::detection::types::{Track, TrackId};

/// 各区域去重人数
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ZoneCounts {
    pub zone_a: usize,
    pub zone_b: usize,
}

impl ZoneCounts {
    pub fn get(&self, zone: Zone) -> usize {
        match zone {
            Zone::A => self.zone_a,
            Zone::B => self.zone_b,
        }
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.zone_a, self.zone_b)
    }
}

pub struct UniqueCounter {
    split: ZoneSplit,
    zone_a_ids: HashSet<TrackId>,
    zone_b_ids: HashSet<TrackId>,
}

impl UniqueCounter {
    pub fn new(split: ZoneSplit) -> Self {
        Self {
            split,
            zone_a_ids: HashSet::new(),
            zone_b_ids: HashSet::new(),
        }
    }

    pub fn split(&self) -> ZoneSplit {
        self.split
    }

    /// 判定并记录一个跟踪对象, 未确认的跟踪不计数
    pub fn observe(&mut self, track: &Track) -> Option<Zone> {
        if !track.is_confirmed() {
            return None;
        }
        let zone = self.split.classify_ltrb(&track.bbox);
        self.record(track.id, zone);
        Some(zone)
    }

    /// 幂等插入, 返回集合是否增长
    pub fn record(&mut self, id: TrackId, zone: Zone) -> bool {
        match zone {
            Zone::A => self.zone_a_ids.insert(id),
            Zone::B => self.zone_b_ids.insert(id),
        }
    }

    pub fn counts(&self) -> ZoneCounts {
        ZoneCounts {
            zone_a: self.zone_a_ids.len(),
            zone_b: self.zone_b_ids.len(),
        }
    }

    pub fn zone_a_ids(&self) -> &HashSet<TrackId> {
        &self.zone_a_ids
    }

    pub fn zone_b_ids(&self) -> &HashSet<TrackId> {
        &self.zone_b_ids
    }

    pub fn into_counts(self) -> ZoneCounts {
        self.counts()
    }
}
