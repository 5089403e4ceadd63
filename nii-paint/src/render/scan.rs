use image::GrayImage;

use super::fill_rows;
use crate::geometry::DisplayMapper;
use crate::{IntensityWindow, ScanSlice, Size};

/// 将强度切片经强度窗 `window` 渲染为 `size = (宽, 高)` 的 8 位灰度图像.
///
/// 非有限强度显示为黑色.
pub fn render_scan(slice: &ScanSlice, window: &IntensityWindow, size: Size) -> GrayImage {
    let mapper = DisplayMapper::new(size, slice.shape());
    let (w, h) = mapper.display();
    let cols = mapper.column_lut();
    let rows = mapper.row_lut();

    let mut img = GrayImage::new(w, h);
    let raw: &mut [u8] = &mut img;
    fill_rows(raw, w as usize, |line, y| {
        let r = rows[y];
        for (px, &c) in line.iter_mut().zip(cols.iter()) {
            *px = window.eval(slice[(r, c)]).unwrap_or(u8::MIN);
        }
    });
    img
}
