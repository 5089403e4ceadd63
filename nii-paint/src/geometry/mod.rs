//! 几何: 仿射矩阵、体数据方向、显示坐标映射.
//!
//! 世界坐标系统一为 RAS+ (x 向患者右侧, y 向前方, z 向上方), 与 NIfTI 的约定一致.

mod mapper;
mod orientation;

use std::ops::Mul;

use nifti::NiftiHeader;

use crate::Idx3d;

pub use mapper::DisplayMapper;
pub use orientation::{io_orientation, AxisCode, AxisTransform};

/// 4x4 仿射矩阵, 行优先存储. 将 (齐次) 体素索引映射为世界坐标 (毫米).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Affine([[f64; 4]; 4]);

impl Default for Affine {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 读取 `pixdim[i]`. 非正数或非有限值视为 1 毫米.
#[inline]
fn pix_dim(header: &NiftiHeader, i: usize) -> f64 {
    match header.pixdim[i] as f64 {
        v if v.is_finite() && v > 0.0 => v,
        _ => 1.0,
    }
}

impl Affine {
    /// 单位矩阵.
    pub const IDENTITY: Affine = Affine([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// 以行优先数据直接构建.
    #[inline]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(rows)
    }

    /// 获取行优先数据.
    #[inline]
    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.0
    }

    /// 从 NIfTI header 获取仿射矩阵.
    ///
    /// 优先级与 NIfTI 标准一致:
    ///
    /// 1. `sform_code > 0` 时使用 `srow_{x, y, z}`;
    /// 2. 否则 `qform_code > 0` 时使用四元数 + `pixdim` + 偏移量;
    /// 3. 否则退化为以 `pixdim` 为对角线的缩放矩阵.
    pub fn from_header(header: &NiftiHeader) -> Self {
        if header.sform_code > 0 {
            let row = |r: &[f32; 4]| [r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64];
            Self([
                row(&header.srow_x),
                row(&header.srow_y),
                row(&header.srow_z),
                [0.0, 0.0, 0.0, 1.0],
            ])
        } else if header.qform_code > 0 {
            Self::from_qform(header)
        } else {
            let mut ans = Self::IDENTITY;
            for i in 0..3 {
                ans.0[i][i] = pix_dim(header, i + 1);
            }
            ans
        }
    }

    /// 由四元数表示的 qform 构建.
    fn from_qform(header: &NiftiHeader) -> Self {
        let (b, c, d) = (
            header.quatern_b as f64,
            header.quatern_c as f64,
            header.quatern_d as f64,
        );
        let a2 = 1.0 - (b * b + c * c + d * d);
        let (a, b, c, d) = if a2 < 1e-7 {
            // 180 度旋转, a 只能是 0, 需要重新归一化 (b, c, d).
            let n = (b * b + c * c + d * d).sqrt();
            (0.0, b / n, c / n, d / n)
        } else {
            (a2.sqrt(), b, c, d)
        };
        let r = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let zooms = [
            pix_dim(header, 1),
            pix_dim(header, 2),
            pix_dim(header, 3) * qfac,
        ];
        let offset = [
            header.quatern_x as f64,
            header.quatern_y as f64,
            header.quatern_z as f64,
        ];

        let mut ans = Self::IDENTITY;
        for row in 0..3 {
            for col in 0..3 {
                ans.0[row][col] = r[row][col] * zooms[col];
            }
            ans.0[row][3] = offset[row];
        }
        ans
    }

    /// 将矩阵写入 `header` 的 sform 部分, 并设置 `sform_code`.
    pub fn write_sform(&self, header: &mut NiftiHeader, code: i16) {
        let row = |r: &[f64; 4]| [r[0] as f32, r[1] as f32, r[2] as f32, r[3] as f32];
        header.srow_x = row(&self.0[0]);
        header.srow_y = row(&self.0[1]);
        header.srow_z = row(&self.0[2]);
        header.sform_code = code;
    }

    /// 获取左上 3x3 部分的第 `col` 列.
    #[inline]
    pub fn column(&self, col: usize) -> [f64; 3] {
        [self.0[0][col], self.0[1][col], self.0[2][col]]
    }

    /// 计算体素 (连续) 索引 `idx` 对应的世界坐标.
    pub fn apply(&self, idx: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        let mut ans = [0.0; 3];
        for (r, out) in ans.iter_mut().enumerate() {
            *out = m[r][0] * idx[0] + m[r][1] * idx[1] + m[r][2] * idx[2] + m[r][3];
        }
        ans
    }

    /// 计算体素索引 `(i, j, k)` 对应的世界坐标.
    #[inline]
    pub fn apply_index(&self, (i, j, k): Idx3d) -> [f64; 3] {
        self.apply([i as f64, j as f64, k as f64])
    }

    /// 逐元素比较, 误差不超过 `eps` 时认为相等.
    pub fn approx_eq(&self, other: &Affine, eps: f64) -> bool {
        self.0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

/// 矩阵乘法 `self * rhs`: 先应用 `rhs`, 再应用 `self`.
impl Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        let mut ans = [[0.0; 4]; 4];
        for (r, row) in ans.iter_mut().enumerate() {
            for (c, out) in row.iter_mut().enumerate() {
                *out = (0..4).map(|k| self.0[r][k] * rhs.0[k][c]).sum();
            }
        }
        Affine(ans)
    }
}
