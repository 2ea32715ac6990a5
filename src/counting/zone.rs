// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 分区判定 (Zone Classifier)
//!
//! 画面以水平分割线 `floor(H / 2)` 分为上下两区:
//! - Zone A: 框的垂直中心 < 分割线
//! - Zone B: 框的垂直中心 >= 分割线 (正好落在线上归B)

use std::fmt;

use serde::Serialize;

use crate::detection::types::BBox;

/// 区域
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    /// 上半区
    A,
    /// 下半区
    B,
}

impl Zone {
    pub fn name(&self) -> &'static str {
        match self {
            Zone::A => "ZONE A",
            Zone::B => "ZONE B",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 垂直中心: floor((top + bottom) / 2)
pub fn vertical_center(top: i64, bottom: i64) -> i64 {
    (top + bottom).div_euclid(2)
}

/// 水平分割线
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneSplit {
    line: i64,
}

impl ZoneSplit {
    /// 由帧高度计算分割线 (整数除法)
    pub fn from_height(height: u32) -> Self {
        Self {
            line: i64::from(height / 2),
        }
    }

    pub fn from_line(line: i64) -> Self {
        Self { line }
    }

    pub fn line(&self) -> i64 {
        self.line
    }

    /// 按中心点判定, 不考虑框与分割线的重叠面积
    pub fn classify(&self, top: i64, bottom: i64) -> Zone {
        if vertical_center(top, bottom) < self.line {
            Zone::A
        } else {
            Zone::B
        }
    }

    /// 浮点框先向零截断为整数像素再判定
    pub fn classify_ltrb(&self, bbox: &BBox) -> Zone {
        self.classify(bbox.y1 as i64, bbox.y2 as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uses_integer_division() {
        assert_eq!(ZoneSplit::from_height(100).line(), 50);
        assert_eq!(ZoneSplit::from_height(101).line(), 50);
        assert_eq!(ZoneSplit::from_height(0).line(), 0);
    }

    #[test]
    fn scenario_boxes_for_height_100() {
        let split = ZoneSplit::from_height(100);
        assert_eq!(split.classify(10, 20), Zone::A);
        assert_eq!(split.classify(80, 100), Zone::B);
        assert_eq!(split.classify(40, 60), Zone::B);
    }

    #[test]
    fn center_on_line_falls_to_b() {
        let split = ZoneSplit::from_line(50);
        for (top, bottom) in [(50, 50), (0, 100), (49, 51), (30, 71)] {
            assert_eq!(vertical_center(top, bottom), 50);
            assert_eq!(split.classify(top, bottom), Zone::B);
        }
        assert_eq!(split.classify(0, 99), Zone::A);
    }

    #[test]
    fn straddling_box_goes_by_center() {
        let split = ZoneSplit::from_line(50);
        // 大部分在A区, 但中心 = 50
        assert_eq!(split.classify(10, 90), Zone::B);
        assert_eq!(split.classify(10, 89), Zone::A);
    }

    #[test]
    fn center_floors_toward_negative_infinity() {
        assert_eq!(vertical_center(-3, 0), -2);
        assert_eq!(vertical_center(3, 4), 3);
        assert_eq!(ZoneSplit::from_line(0).classify(-3, 2), Zone::A);
    }

    #[test]
    fn float_boxes_are_truncated_before_centering() {
        let split = ZoneSplit::from_line(50);
        // 40.9 -> 40, 59.9 -> 59, 中心 49
        assert_eq!(split.classify_ltrb(&BBox::new(0.0, 40.9, 10.0, 59.9)), Zone::A);
        assert_eq!(split.classify_ltrb(&BBox::new(0.0, 40.0, 10.0, 60.0)), Zone::B);
    }
}
