/// 分区去重计数 (Zone Counting)
///
/// 纯计算模块, 不做任何I/O:
/// - Zone:    分割线判定
/// - Counter: 每区ID集合累积
pub mod counter;
pub mod zone;

pub use counter::{UniqueCounter, ZoneCounts};
pub use zone::{vertical_center, Zone, ZoneSplit};
