//! 显示坐标 (画布像素) <-> 切片索引.

use crate::{Idx2d, Point, Size};

/// 画布与当前切片之间的线性映射 (最近邻).
///
/// 画布尺寸 `(宽 W, 高 H)`, 切片形状 `(rows, cols)`. 画布点 `(x, y)` 映射到
///
/// ```text
/// col = round(x * cols / W), row = round(y * rows / H)
/// ```
///
/// 并截断到切片范围内. 叠加层渲染对每个输出像素使用相同的映射,
/// 因此画在某处的标签总会显示在同一处.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisplayMapper {
    display: Size,
    slice: Idx2d,
}

/// 计算 `round(v * num / den)` 并截断到 `[0, len)`. 向上舍入半数.
#[inline]
fn scale_round(v: i64, num: usize, den: u32, len: usize) -> usize {
    if v <= 0 {
        return 0;
    }
    let (v, num, den) = (v as u128, num as u128, den as u128);
    let r = (2 * v * num + den) / (2 * den);
    r.min(len as u128 - 1) as usize
}

impl DisplayMapper {
    /// 创建映射. 长度为 0 的画布或切片维度按 1 处理.
    pub fn new((w, h): Size, (rows, cols): Idx2d) -> Self {
        Self {
            display: (w.max(1), h.max(1)),
            slice: (rows.max(1), cols.max(1)),
        }
    }

    /// 画布尺寸 `(宽, 高)`.
    #[inline]
    pub fn display(&self) -> Size {
        self.display
    }

    /// 切片形状 `(rows, cols)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        self.slice
    }

    /// 画布点 `(x, y)` -> 切片索引 `(row, col)`. 画布外的点被截断到最近的边缘.
    pub fn to_volume_index(&self, (x, y): Point) -> Idx2d {
        let (w, h) = self.display;
        let (rows, cols) = self.slice;
        (
            scale_round(y as i64, rows, h, rows),
            scale_round(x as i64, cols, w, cols),
        )
    }

    /// 切片索引 `(row, col)` -> 画布点 `(x, y)`.
    ///
    /// 画布不小于切片时, 这是 [`Self::to_volume_index`] 的右逆.
    pub fn to_display(&self, (row, col): Idx2d) -> Point {
        let (w, h) = self.display;
        let (rows, cols) = self.slice;
        let x = scale_round(col as i64, w as usize, cols as u32, w as usize);
        let y = scale_round(row as i64, h as usize, rows as u32, h as usize);
        (x as i32, y as i32)
    }

    /// 每个输出像素列对应的切片列.
    pub fn column_lut(&self) -> Vec<usize> {
        let (w, _) = self.display;
        (0..w as i64)
            .map(|x| scale_round(x, self.slice.1, w, self.slice.1))
            .collect()
    }

    /// 每个输出像素行对应的切片行.
    pub fn row_lut(&self) -> Vec<usize> {
        let (_, h) = self.display;
        (0..h as i64)
            .map(|y| scale_round(y, self.slice.0, h, self.slice.0))
            .collect()
    }

    /// 半径为 `radius` 个体素的画刷在画布上的半径 `(水平, 竖直)` (像素).
    ///
    /// 画布宽高比与切片不同时, 画刷在画布上显示为椭圆.
    pub fn radius_to_display(&self, radius: u32) -> (f64, f64) {
        let (w, h) = self.display;
        let (rows, cols) = self.slice;
        let r = radius as f64;
        (r * w as f64 / cols as f64, r * h as f64 / rows as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::DisplayMapper;

    #[test]
    fn test_identity_mapping() {
        let m = DisplayMapper::new((10, 10), (10, 10));
        assert_eq!(m.to_volume_index((3, 7)), (7, 3));
        assert_eq!(m.to_display((7, 3)), (3, 7));
    }

    #[test]
    fn test_scaled_mapping_rounds() {
        // 540x540 画布, 256x256 切片: 100 * 256 / 540 = 47.4 -> 47.
        let m = DisplayMapper::new((540, 540), (256, 256));
        assert_eq!(m.to_volume_index((100, 100)), (47, 47));
        // 540 * 256 / 540 = 256 -> 截断到 255.
        assert_eq!(m.to_volume_index((540, 540)), (255, 255));
    }

    #[test]
    fn test_out_of_canvas_is_clamped() {
        let m = DisplayMapper::new((100, 50), (20, 40));
        assert_eq!(m.to_volume_index((-5, -100)), (0, 0));
        assert_eq!(m.to_volume_index((1000, 1000)), (19, 39));
    }

    #[test]
    fn test_to_display_is_right_inverse_when_upscaling() {
        let m = DisplayMapper::new((540, 300), (64, 96));
        for row in 0..64 {
            for col in 0..96 {
                assert_eq!(m.to_volume_index(m.to_display((row, col))), (row, col));
            }
        }
    }

    #[test]
    fn test_lut_matches_point_mapping() {
        let m = DisplayMapper::new((37, 23), (11, 53));
        let cols = m.column_lut();
        let rows = m.row_lut();
        assert_eq!(cols.len(), 37);
        assert_eq!(rows.len(), 23);
        for (x, c) in cols.iter().enumerate() {
            for (y, r) in rows.iter().enumerate() {
                assert_eq!(m.to_volume_index((x as i32, y as i32)), (*r, *c));
            }
        }
    }

    #[test]
    fn test_zero_sized_display() {
        let m = DisplayMapper::new((0, 0), (8, 8));
        assert_eq!(m.display(), (1, 1));
        assert_eq!(m.to_volume_index((0, 0)), (0, 0));
    }

    #[test]
    fn test_radius_to_display() {
        let m = DisplayMapper::new((512, 256), (256, 256));
        let (rx, ry) = m.radius_to_display(4);
        assert!((rx - 8.0).abs() < 1e-12);
        assert!((ry - 4.0).abs() < 1e-12);
    }
}
