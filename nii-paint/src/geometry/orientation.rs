//! 体数据方向: 原始数组轴 <-> 工作方向 `(z, h, w)`.
//!
//! 工作方向的约定 (世界坐标为 RAS+):
//!
//! | 工作轴 | 世界轴 | 索引增长方向 |
//! |--------|--------|--------------|
//! | z      | S      | 向上          |
//! | h      | P      | 向后 (图像上方为前方) |
//! | w      | L      | 向患者左侧 (放射学约定) |
//!
//! 方向变换只包含轴置换和轴翻转, 因此可以被精确地逆转.

use ndarray::{Array3, ArrayView3, Axis};

use super::Affine;
use crate::Idx3d;

/// 原始数组的某一轴在世界坐标系中最接近的方向.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxisCode {
    /// 世界轴: 0 = R, 1 = A, 2 = S.
    pub world: usize,

    /// 数组索引增长时, 世界坐标是否沿正方向增长.
    pub positive: bool,
}

/// 工作方向第 `d` 轴对应的 (世界轴, 索引增长是否为世界正方向).
const WORKING: [(usize, bool); 3] = [(2, true), (1, false), (0, false)];

/// 求仿射矩阵 `affine` 下, 原始数组每一轴最接近的世界轴及其方向.
///
/// 先按列归一化 3x3 部分, 然后反复选取尚未使用的行列中绝对值最大的元素,
/// 因此结果一定是一个置换. 出现相等值时取先遍历到的一个, 结果可复现.
pub fn io_orientation(affine: &Affine) -> [AxisCode; 3] {
    let mut m = [[0.0f64; 3]; 3];
    for (c, col) in (0..3).map(|c| (c, affine.column(c))) {
        let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        for r in 0..3 {
            m[r][c] = if norm > 0.0 { col[r] / norm } else { 0.0 };
        }
    }

    let mut used_row = [false; 3];
    let mut used_col = [false; 3];
    let mut ans = [AxisCode {
        world: 0,
        positive: true,
    }; 3];
    for _ in 0..3 {
        let mut best: Option<(usize, usize, f64)> = None;
        for c in (0..3).filter(|c| !used_col[*c]) {
            for r in (0..3).filter(|r| !used_row[*r]) {
                let v = m[r][c].abs();
                if best.map_or(true, |(_, _, b)| v > b) {
                    best = Some((r, c, v));
                }
            }
        }
        let Some((r, c, _)) = best else {
            unreachable!()
        };
        used_row[r] = true;
        used_col[c] = true;
        ans[c] = AxisCode {
            world: r,
            positive: m[r][c] >= 0.0,
        };
    }
    ans
}

/// 原始数组 `[i, j, k]` 与工作方向数组 `[z, h, w]` 之间的轴置换 + 轴翻转.
///
/// 工作数组的第 `d` 轴来自原始数组的第 `perm[d]` 轴; 若 `flip[d]`, 则该轴索引反向.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxisTransform {
    perm: [usize; 3],
    flip: [bool; 3],
    native_shape: Idx3d,
}

#[inline]
fn idx_to_array((a, b, c): Idx3d) -> [usize; 3] {
    [a, b, c]
}

#[inline]
fn array_to_idx([a, b, c]: [usize; 3]) -> Idx3d {
    (a, b, c)
}

impl AxisTransform {
    /// 根据原始数组各轴的世界方向 `orientation` 创建到工作方向的变换.
    ///
    /// `orientation` 应当是 [`io_orientation`] 的结果 (世界轴构成置换).
    pub fn working(orientation: &[AxisCode; 3], native_shape: Idx3d) -> Self {
        let mut by_world = [0; 3];
        for (a, code) in orientation.iter().enumerate() {
            by_world[code.world] = a;
        }
        let mut perm = [0; 3];
        let mut flip = [false; 3];
        for (d, &(world, positive)) in WORKING.iter().enumerate() {
            let a = by_world[world];
            perm[d] = a;
            flip[d] = orientation[a].positive != positive;
        }
        Self {
            perm,
            flip,
            native_shape,
        }
    }

    /// 根据原始仿射矩阵创建到工作方向的变换.
    #[inline]
    pub fn from_affine(affine: &Affine, native_shape: Idx3d) -> Self {
        Self::working(&io_orientation(affine), native_shape)
    }

    /// 轴置换.
    #[inline]
    pub fn perm(&self) -> [usize; 3] {
        self.perm
    }

    /// 轴翻转.
    #[inline]
    pub fn flip(&self) -> [bool; 3] {
        self.flip
    }

    /// 原始数组形状 `(i, j, k)`.
    #[inline]
    pub fn native_shape(&self) -> Idx3d {
        self.native_shape
    }

    /// 工作数组形状 `(z, h, w)`.
    pub fn working_shape(&self) -> Idx3d {
        let n = idx_to_array(self.native_shape);
        (n[self.perm[0]], n[self.perm[1]], n[self.perm[2]])
    }

    /// 将原始数组重排为工作方向的标准布局数组.
    ///
    /// 如果 `native` 的形状与创建时给出的形状不一致, 则程序 panic.
    pub fn to_working<A: Clone>(&self, native: Array3<A>) -> Array3<A> {
        assert_eq!(
            idx_to_array(self.native_shape).as_slice(),
            native.shape(),
            "原始数组形状不符"
        );
        let mut ans = native.permuted_axes(self.perm);
        for d in (0..3).filter(|d| self.flip[*d]) {
            ans.invert_axis(Axis(d));
        }
        ans.as_standard_layout().into_owned()
    }

    /// 将工作方向数组精确地还原为原始方向的标准布局数组.
    ///
    /// 如果 `working` 的形状与 `self.working_shape()` 不一致, 则程序 panic.
    pub fn to_native<A: Clone>(&self, working: ArrayView3<A>) -> Array3<A> {
        assert_eq!(
            idx_to_array(self.working_shape()).as_slice(),
            working.shape(),
            "工作数组形状不符"
        );
        let mut view = working;
        for d in (0..3).filter(|d| self.flip[*d]) {
            view.invert_axis(Axis(d));
        }
        view.permuted_axes(self.inverse_perm())
            .as_standard_layout()
            .into_owned()
    }

    /// 逆置换: 原始数组第 `a` 轴位于工作数组的第 `inv[a]` 轴.
    fn inverse_perm(&self) -> [usize; 3] {
        let mut inv = [0; 3];
        for (d, a) in self.perm.iter().enumerate() {
            inv[*a] = d;
        }
        inv
    }

    /// 工作方向索引 -> 原始数组索引. 不检查越界.
    pub fn working_to_native_index(&self, pos: Idx3d) -> Idx3d {
        let n = idx_to_array(self.native_shape);
        let p = idx_to_array(pos);
        let mut ans = [0; 3];
        for d in 0..3 {
            let a = self.perm[d];
            ans[a] = if self.flip[d] { n[a] - 1 - p[d] } else { p[d] };
        }
        array_to_idx(ans)
    }

    /// 以齐次矩阵表示的 "工作索引 -> 原始索引" 映射 `T`.
    ///
    /// 工作方向数组的仿射矩阵即为 `native_affine * T`.
    pub fn working_to_native_matrix(&self) -> Affine {
        let n = idx_to_array(self.native_shape);
        let mut m = [[0.0; 4]; 4];
        m[3][3] = 1.0;
        for d in 0..3 {
            let a = self.perm[d];
            if self.flip[d] {
                m[a][d] = -1.0;
                m[a][3] = n[a] as f64 - 1.0;
            } else {
                m[a][d] = 1.0;
            }
        }
        Affine::from_rows(m)
    }

    /// 以齐次矩阵表示的 "原始索引 -> 工作索引" 映射 `T^-1`.
    pub fn native_to_working_matrix(&self) -> Affine {
        let n = idx_to_array(self.native_shape);
        let mut m = [[0.0; 4]; 4];
        m[3][3] = 1.0;
        for d in 0..3 {
            let a = self.perm[d];
            if self.flip[d] {
                m[d][a] = -1.0;
                m[d][3] = n[a] as f64 - 1.0;
            } else {
                m[d][a] = 1.0;
            }
        }
        Affine::from_rows(m)
    }
}
