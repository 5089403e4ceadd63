//! 标签图层: 标签体及其叠加层缓存.

use image::RgbaImage;
use ndarray::Array3;

use crate::paint::DiskMask;
use crate::render::{render_overlay, SliceCache};
use crate::{Idx3d, LabelVolume, PaintResult, Point, Size, VolumeGeometry};

/// 标签体与其叠加层渲染缓存的组合.
///
/// 所有修改标签的方法都在返回前使对应的缓存失效, 因此
/// [`LabelLayer::overlay`] 永远不会给出修改之前的图像.
#[derive(Debug, Clone)]
pub struct LabelLayer {
    labels: LabelVolume,
    overlays: SliceCache<RgbaImage>,
}

impl LabelLayer {
    /// 创建形状为 `shape` 的全零标签图层. 缓存容量为 `capacity`.
    pub fn new(shape: Idx3d, capacity: usize) -> Self {
        Self {
            labels: LabelVolume::create(shape),
            overlays: SliceCache::new(capacity),
        }
    }

    /// 标签体.
    #[inline]
    pub fn labels(&self) -> &LabelVolume {
        &self.labels
    }

    /// 叠加层缓存.
    #[inline]
    pub fn cache(&self) -> &SliceCache<RgbaImage> {
        &self.overlays
    }

    /// 在第 `z_index` 层沿 `path` 涂抹 `code`, 并使该层的叠加层失效.
    /// 返回实际改变的体素个数.
    pub fn stamp<I>(&mut self, z_index: usize, path: I, mask: &DiskMask, code: u8) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let changed = self.labels.stamp(z_index, path, mask, code);
        self.overlays.invalidate(z_index);
        changed
    }

    /// 设置单个体素. 越界或非法标签时什么都不做, 返回 `false`.
    pub fn set_voxel(&mut self, pos: Idx3d, code: u8) -> bool {
        let ok = self.labels.set(pos, code);
        if ok {
            self.overlays.invalidate(pos.0);
        }
        ok
    }

    /// 整体替换标签. 失败时标签和缓存保持不变.
    pub fn replace_with(&mut self, data: Array3<u8>) -> PaintResult<()> {
        self.labels.replace_with(data)?;
        self.overlays.clear();
        Ok(())
    }

    /// 清除所有标签.
    pub fn clear(&mut self) {
        self.labels.clear();
        self.overlays.clear();
    }

    /// 获取第 `z_index` 层在 `size` 下的叠加层. `z_index` 越界时返回 `None`.
    pub fn overlay(&mut self, z_index: usize, size: Size) -> Option<&RgbaImage> {
        if z_index >= self.labels.len_z() {
            return None;
        }
        let labels = &self.labels;
        Some(
            self.overlays
                .get_or_render(z_index, size, |z, size| {
                    render_overlay(&labels.slice_at(z), size)
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LabelLayer;
    use crate::consts::label::*;
    use crate::paint::{rasterize, DiskMask};
    use ndarray::Array3;

    #[test]
    fn test_overlay_follows_stamp() {
        let mut layer = LabelLayer::new((3, 10, 10), 8);
        let before = layer.overlay(1, (10, 10)).unwrap().clone();
        assert_eq!(before.get_pixel(2, 2).0, TRANSPARENT);

        layer.stamp(1, rasterize((2, 2), (2, 2)), &DiskMask::new(1), BLUE);
        let after = layer.overlay(1, (10, 10)).unwrap();
        assert_eq!(after.get_pixel(2, 2).0, rgba(BLUE));
        assert_eq!(after.get_pixel(3, 2).0, rgba(BLUE));
        assert_eq!(after.get_pixel(3, 3).0, TRANSPARENT);
    }

    #[test]
    fn test_stamp_invalidates_every_size() {
        let mut layer = LabelLayer::new((1, 4, 4), 8);
        layer.overlay(0, (4, 4));
        layer.overlay(0, (8, 8));
        assert_eq!(layer.cache().len(), 2);
        layer.stamp(0, [(0, 0)], &DiskMask::new(0), RED);
        assert!(layer.cache().is_empty());
        assert_eq!(layer.overlay(0, (8, 8)).unwrap().get_pixel(0, 0).0, rgba(RED));
    }

    #[test]
    fn test_set_voxel_and_clear() {
        let mut layer = LabelLayer::new((2, 3, 3), 4);
        layer.overlay(1, (3, 3));
        layer.overlay(0, (3, 3));
        assert!(layer.set_voxel((1, 0, 0), GREEN));
        assert!(!layer.cache().contains(1, (3, 3)));
        assert!(layer.cache().contains(0, (3, 3)));
        assert!(!layer.set_voxel((2, 0, 0), GREEN));

        layer.clear();
        assert_eq!(layer.labels().count(GREEN), 0);
        assert!(layer.cache().is_empty());
        assert!(layer.overlay(2, (3, 3)).is_none());
    }

    #[test]
    fn test_failed_replace_keeps_cache() {
        let mut layer = LabelLayer::new((1, 2, 2), 4);
        layer.overlay(0, (2, 2));
        assert!(layer.replace_with(Array3::zeros((1, 2, 3))).is_err());
        assert_eq!(layer.cache().len(), 1);
        layer
            .replace_with(Array3::from_elem((1, 2, 2), PURPLE))
            .unwrap();
        assert!(layer.cache().is_empty());
        assert_eq!(layer.labels().count(PURPLE), 4);
    }
}
