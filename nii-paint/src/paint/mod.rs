//! 画刷涂抹: 直线光栅化与圆盘印章.
//!
//! 一次拖动的流程为: 上一个指针位置与当前位置 (均已映射到切片坐标) 之间做
//! Bresenham 光栅化, 然后对路径上每个点以圆盘覆写标签.

mod brush;
mod line;

pub use brush::{Brush, DiskMask, InvalidBrush};
pub use line::{rasterize, LinePoints};
