use crate::consts::label;
use crate::Idx2d;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维标签切片.
///
/// 切片是标签体的实时视图: 持有期间借用检查器保证标签体不会被修改.
/// 需要快照时使用 [`LabelSlice::to_owned`].
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelVolume`].
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维标签切片.
pub struct LabelSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelVolume`].
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> LabelSliceMut<'a> {
    /// 将 `pos` 处的标签设置为 `code`.
    ///
    /// 越界或 `code` 不是合法标签时什么都不做, 返回 `false`.
    #[inline]
    pub fn set(&mut self, pos: Idx2d, code: u8) -> bool {
        if !label::is_valid(code) {
            return false;
        }
        match self.data.get_mut(pos) {
            Some(p) => {
                *p = code;
                true
            }
            None => false,
        }
    }

    /// 将整个切片填充为 `code`.
    #[inline]
    pub fn fill(&mut self, code: u8) {
        self.data.fill(code);
    }
}

impl Index<Idx2d> for LabelSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// label 不可变方法集合.
macro_rules! impl_label_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, u8, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u8> {
                self.data.get(pos)
            }

            /// 该切片是否没有任何标签?
            #[inline]
            pub fn is_clear(&self) -> bool {
                self.data.iter().copied().all(label::is_clear)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 统计图像中值为 `code` 的像素总个数.
            #[inline]
            pub fn count(&self, code: u8) -> usize {
                self.data.iter().filter(|&p| *p == code).count()
            }

            /// 统计每个标签值的像素个数. 第 `i` 项为标签值 `i` 的个数.
            pub fn histogram(&self) -> [usize; label::LABEL_COUNT + 1] {
                let mut ans = [0; label::LABEL_COUNT + 1];
                for pixel in self.data.iter().filter(|p| label::is_valid(**p)) {
                    ans[*pixel as usize] += 1;
                }
                ans
            }

            /// 克隆自己, 获得一个拥有所有权的切片快照.
            pub fn to_owned(&self) -> OwnedLabelSlice {
                OwnedLabelSlice {
                    data: self.data.to_owned(),
                }
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }
        }
    };
}
impl_label_slice_immut!('a, LabelSlice<'a>, ArrayView2<'a, u8>);
impl_label_slice_immut!('a, LabelSliceMut<'a>, ArrayViewMut2<'a, u8>);

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维标签切片.
///
/// `OwnedLabelSlice` 仅提供到 `LabelSlice` 和 `LabelSliceMut`
/// 的轻量转换, 不提供任何其它方法.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedLabelSlice {
    data: Array2<u8>,
}

impl OwnedLabelSlice {
    /// 创建全为 [`label::CLEAR`] 的切片.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> LabelSlice<'_> {
        LabelSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> LabelSliceMut<'_> {
        LabelSliceMut::new(self.data.view_mut())
    }

}

/// 不可变、借用的二维强度切片.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Volume`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 强度值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::OwnedLabelSlice;
    use crate::consts::label::*;

    #[test]
    fn test_set_is_bounds_checked() {
        let mut owned = OwnedLabelSlice::zeros((3, 4));
        let mut s = owned.as_mutable();
        assert!(s.set((2, 3), BLUE));
        assert!(!s.set((3, 0), BLUE));
        assert!(!s.set((0, 4), BLUE));
        assert!(!s.set((0, 0), MAX_LABEL + 1));
        assert_eq!(s.count(BLUE), 1);
        assert_eq!(s[(2, 3)], BLUE);
    }

    #[test]
    fn test_histogram() {
        let mut owned = OwnedLabelSlice::zeros((2, 5));
        {
            let mut s = owned.as_mutable();
            s.fill(RED);
            s[(0, 0)] = PURPLE;
        }
        let s = owned.as_immut();
        let hist = s.histogram();
        assert_eq!(hist[RED as usize], 9);
        assert_eq!(hist[PURPLE as usize], 1);
        assert_eq!(hist.iter().sum::<usize>(), s.size());
        assert!(!s.is_clear());
    }

    #[test]
    fn test_snapshot_does_not_follow_mutation() {
        let mut owned = OwnedLabelSlice::zeros((2, 2));
        let snap = owned.as_immut().to_owned();
        owned.as_mutable().set((1, 1), YELLOW);
        assert!(snap.as_immut().is_clear());
        assert_eq!(owned.as_immut()[(1, 1)], YELLOW);
    }
}
