use image::RgbaImage;

use super::fill_rows;
use crate::consts::label;
use crate::geometry::DisplayMapper;
use crate::{LabelSlice, Size};

/// 将标签切片按调色板渲染为 `size = (宽, 高)` 的 RGBA 叠加层.
///
/// 标签为 0 的位置完全透明. 长度为 0 的维度按 1 处理.
pub fn render_overlay(slice: &LabelSlice, size: Size) -> RgbaImage {
    let mapper = DisplayMapper::new(size, slice.shape());
    let (w, h) = mapper.display();
    let cols = mapper.column_lut();
    let rows = mapper.row_lut();

    let mut img = RgbaImage::new(w, h);
    let raw: &mut [u8] = &mut img;
    fill_rows(raw, w as usize * 4, |line, y| {
        let r = rows[y];
        for (px, &c) in line.chunks_exact_mut(4).zip(cols.iter()) {
            px.copy_from_slice(&label::rgba(slice[(r, c)]));
        }
    });
    img
}

#[cfg(test)]
mod tests {
    use super::render_overlay;
    use crate::consts::label::*;
    use crate::geometry::DisplayMapper;
    use crate::paint::DiskMask;
    use crate::OwnedLabelSlice;

    #[test]
    fn test_overlay_transparent_background() {
        let owned = OwnedLabelSlice::zeros((4, 4));
        let img = render_overlay(&owned.as_immut(), (8, 6));
        assert_eq!(img.dimensions(), (8, 6));
        assert!(img.pixels().all(|p| p.0 == TRANSPARENT));
    }

    #[test]
    fn test_overlay_colors_and_upscale() {
        let mut owned = OwnedLabelSlice::zeros((2, 2));
        owned.as_mutable().set((0, 1), RED);
        owned.as_mutable().set((1, 0), SKY_BLUE);
        let img = render_overlay(&owned.as_immut(), (2, 2));
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [135, 206, 235, 255]);
        assert_eq!(img.get_pixel(0, 0).0, TRANSPARENT);
    }

    #[test]
    fn test_painted_voxels_show_where_pointer_was() {
        // 画在显示坐标 p 处的体素, 渲染后 p 处一定是该颜色.
        let shape = (37, 53);
        let size = (300, 200);
        let mapper = DisplayMapper::new(size, shape);
        let mut owned = OwnedLabelSlice::zeros(shape);
        let pointer = [(0, 0), (151, 77), (299, 199), (12, 180)];
        for p in pointer {
            let (r, c) = mapper.to_volume_index(p);
            owned
                .as_mutable()
                .stamp([(c as i32, r as i32)], &DiskMask::new(0), GREEN);
        }
        let img = render_overlay(&owned.as_immut(), size);
        for (x, y) in pointer {
            assert_eq!(img.get_pixel(x as u32, y as u32).0, rgba(GREEN));
        }
    }
}
