#![warn(missing_docs)]

//! 核心库. 提供 NIfTI 3D 医学影像的逐体素标注 (画刷涂抹) 引擎.
//!
//! 用户在 2D 水平切片上拖动圆形画刷, 本库负责把指针轨迹转换为标签体上
//! 一组连通的体素修改, 只重绘受影响切片的标签图层, 并在保存时把标签体
//! 还原到原始文件的方向和仿射变换下.
//!
//! 该 crate 只提供 `safe` 接口, 不依赖任何窗口系统. 指针、滚轮和窗口尺寸事件由
//! 上层 (见 `tools/brush-replay`) 喂给 [`Session`].
//!
//! # 组成
//!
//! ### 坐标映射 ✅
//!
//! 显示像素坐标 <-> 切片体素索引. 涂抹和渲染使用同一个映射,
//! 保证画刷落点和屏幕上看到的位置一致.
//!
//! 实现位于 `nii-paint/src/geometry/mapper.rs`.
//!
//! ### 方向与仿射变换 ✅
//!
//! 加载时按照文件自身的仿射矩阵将数据重排到固定的工作方向
//! `(z, h, w)`: z 沿上方 (S) 增长, h 沿后方 (P) 增长, w 沿患者左侧 (L) 增长.
//! 保存时精确地逆转该重排, 并通过矩阵复合得到新的仿射矩阵.
//!
//! 实现位于 `nii-paint/src/geometry`.
//!
//! ### Bresenham 直线与圆形画刷 ✅
//!
//! 纯整数运算的 8-连通直线光栅化, 以及平方距离判定的圆盘印章.
//!
//! 实现位于 `nii-paint/src/paint`.
//!
//! ### 切片渲染缓存 ✅
//!
//! 以 `(切片索引, 输出尺寸)` 为键的严格 LRU 缓存. 标签修改与缓存失效在同一个
//! `&mut` 方法内完成, 不会返回过期的图层.
//!
//! 实现位于 `nii-paint/src/render`.
//!
//! ### 会话编排 ✅
//!
//! 加载 -> 方向规范化 -> 缓存重置 -> 初始渲染; 拖动 -> 映射 -> 光栅化 -> 印章 -> 失效 -> 重绘.
//!
//! 实现位于 `nii-paint/src/session.rs`.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 显示平面上的像素点 `(x, y)`. 指针可能位于显示区域之外, 因此允许为负.
pub type Point = (i32, i32);

/// 显示区域尺寸 `(宽, 高)`, 以像素为单位.
pub type Size = (u32, u32);

pub mod config;
pub mod consts;

/// 3D 体数据与标签体的基础数据结构.
mod data;

mod error;
pub mod geometry;
mod layer;
pub mod paint;
pub mod prelude;
pub mod render;
mod session;

pub use config::PainterConfig;
pub use data::{
    ImgWriteRaw, ImgWriteVis, IntensityWindow, LabelSlice, LabelSliceMut, LabelVolume,
    OwnedLabelSlice, ScanSlice, Volume, VolumeGeometry,
};
pub use error::{PaintError, PaintResult};
pub use layer::LabelLayer;
pub use session::{LoadedVolume, Session};
