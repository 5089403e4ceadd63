use itertools::iproduct;

use crate::consts::{brush, label};
use crate::{Idx2d, LabelSliceMut, LabelVolume, Point, VolumeGeometry};

/// 画刷参数非法.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidBrush {
    /// 标签值不在 `0..=MAX_LABEL` 之内.
    Label(u8),
}

/// 圆形画刷. `size` 为显示直径 (像素), 涂抹半径 (体素) 为 `size / 2`.
///
/// 标签值为 [`label::CLEAR`] 时为橡皮擦.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Brush {
    size: u32,
    code: u8,
}

impl Default for Brush {
    #[inline]
    fn default() -> Self {
        Self {
            size: brush::DEFAULT_SIZE,
            code: brush::DEFAULT_LABEL,
        }
    }
}

impl Brush {
    /// 创建画刷. `code` 非法时返回 `Err`.
    pub fn new(size: u32, code: u8) -> Result<Self, InvalidBrush> {
        if label::is_valid(code) {
            Ok(Self { size, code })
        } else {
            Err(InvalidBrush::Label(code))
        }
    }

    /// 创建橡皮擦.
    #[inline]
    pub fn eraser(size: u32) -> Self {
        Self {
            size,
            code: label::CLEAR,
        }
    }

    /// 显示直径.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// 标签值.
    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// 涂抹半径 (体素).
    #[inline]
    pub fn radius(&self) -> u32 {
        self.size / 2
    }

    /// 是否为橡皮擦?
    #[inline]
    pub fn is_eraser(&self) -> bool {
        label::is_clear(self.code)
    }

    /// 修改显示直径.
    #[inline]
    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }

    /// 修改标签值. `code` 非法时返回 `Err`, 画刷不变.
    #[inline]
    pub fn with_code(self, code: u8) -> Result<Self, InvalidBrush> {
        Self::new(self.size, code)
    }

    /// 预计算该画刷的圆盘.
    #[inline]
    pub fn mask(&self) -> DiskMask {
        DiskMask::new(self.radius())
    }
}

/// 半径为 `r` 的离散圆盘: 所有满足 `dh² + dw² <= r²` 的整数偏移 `(dh, dw)`.
///
/// 不预先展开偏移表, 每次涂抹只遍历圆心附近且落在切片之内的包围盒,
/// 因此开销只与切片大小有关, 与半径无关.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiskMask {
    radius: u32,
}

impl DiskMask {
    /// 半径为 `radius` 的圆盘. 半径为 0 时只包含中心.
    #[inline]
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    /// 半径.
    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// 以 `(x, y) = (列, 行)` 为中心, 按行优先给出落在 `shape` 之内的所有体素 `(行, 列)`.
    pub fn cover(&self, (x, y): Point, (rows, cols): Idx2d) -> impl Iterator<Item = Idx2d> {
        let r = self.radius as i64;
        let (ch, cw) = (y as i64, x as i64);
        let r2 = (r as i128).pow(2);
        let hs = (ch - r).max(0)..(ch + r + 1).min(rows as i64);
        let ws = (cw - r).max(0)..(cw + r + 1).min(cols as i64);
        iproduct!(hs, ws)
            .filter(move |&(h, w)| {
                let (dh, dw) = ((h - ch) as i128, (w - cw) as i128);
                dh * dh + dw * dw <= r2
            })
            .map(|(h, w)| (h as usize, w as usize))
    }
}

/// 画刷涂抹.
impl LabelSliceMut<'_> {
    /// 沿 `path` (点为切片坐标 `(x, y) = (列, 行)`) 以圆盘 `mask` 涂抹标签 `code`.
    ///
    /// 切片之外的体素被忽略. 操作是覆写, 因此重复涂抹不会改变结果.
    /// `code` 非法时什么都不做. 返回值被实际改变的体素个数.
    pub fn stamp<I>(&mut self, path: I, mask: &DiskMask, code: u8) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        if !label::is_valid(code) {
            return 0;
        }
        let shape = self.shape();
        let mut changed = 0;
        for center in path {
            for pos in mask.cover(center, shape) {
                let pix = &mut self[pos];
                if *pix != code {
                    *pix = code;
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl LabelVolume {
    /// 在第 `z_index` 层切片上沿 `path` 涂抹. 见 [`LabelSliceMut::stamp`].
    ///
    /// `z_index` 越界时什么都不做, 返回 0.
    pub fn stamp<I>(&mut self, z_index: usize, path: I, mask: &DiskMask, code: u8) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        if z_index >= self.len_z() {
            return 0;
        }
        self.slice_at_mut(z_index).stamp(path, mask, code)
    }
}
