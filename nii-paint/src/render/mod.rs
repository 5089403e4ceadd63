//! 切片渲染: 标签叠加层 (RGBA) 与强度切片 (灰度), 以及它们的缓存.
//!
//! 所有渲染都对每个输出像素使用 [`crate::geometry::DisplayMapper`] 做最近邻采样,
//! 与指针到体素的映射完全一致.

mod cache;
mod overlay;
mod scan;

pub use cache::{CacheKey, SliceCache};
pub use overlay::render_overlay;
pub use scan::render_scan;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        /// 按行填充行优先的像素缓冲区. `fill(line, i)` 负责第 `i` 行. 各行并行处理.
        fn fill_rows<F>(raw: &mut [u8], row_len: usize, fill: F)
        where
            F: Fn(&mut [u8], usize) + Send + Sync,
        {
            if row_len == 0 {
                return;
            }
            raw.par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(i, line)| fill(line, i));
        }
    } else {
        /// 按行填充行优先的像素缓冲区. `fill(line, i)` 负责第 `i` 行.
        fn fill_rows<F>(raw: &mut [u8], row_len: usize, fill: F)
        where
            F: Fn(&mut [u8], usize) + Send + Sync,
        {
            if row_len == 0 {
                return;
            }
            raw.chunks_mut(row_len)
                .enumerate()
                .for_each(|(i, line)| fill(line, i));
        }
    }
}
