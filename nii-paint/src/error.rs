//! 边界操作 (加载、外部标签导入、保存) 的运行时错误.
//!
//! 坐标映射、光栅化、印章和缓存操作都是全函数, 不会产生错误.

use std::path::PathBuf;

use crate::Idx3d;

/// 加载 / 导入 / 保存错误.
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    /// 文件扩展名不是 `.nii` 或 `.nii.gz`.
    #[error("不支持的文件类型 `{}`, 仅支持 .nii 和 .nii.gz", .0.display())]
    UnsupportedExtension(PathBuf),

    /// 文件不存在、不可读或不是合法的 NIfTI 文件.
    #[error("无法读取 `{}`: {source}", path.display())]
    Load {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: nifti::NiftiError,
    },

    /// 数据不是 3D 体数据 (去除尾部长度为 1 的维度之后).
    #[error("期望 3D 体数据, 但形状为 {0:?}")]
    NotVolumetric(Vec<usize>),

    /// 体数据中没有任何体素.
    #[error("体数据为空")]
    EmptyVolume,

    /// 外部标签体与当前体数据形状不一致. 两个形状均为工作方向 `(z, h, w)`.
    #[error("标签体形状 {found:?} 与当前体数据形状 {expected:?} 不一致")]
    ShapeMismatch {
        /// 当前体数据形状.
        expected: Idx3d,
        /// 外部标签体形状.
        found: Idx3d,
    },

    /// 外部标签体中存在非整数或超出 `0..=MAX_LABEL` 的值.
    #[error("标签值 `{0}` 不在允许的范围内")]
    LabelOutOfRange(f32),

    /// 写入标签文件失败. 内存中的标签不受影响.
    #[error("无法保存 `{}`: {source}", path.display())]
    Save {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: nifti::NiftiError,
    },

    /// 尚未加载体数据.
    #[error("尚未加载体数据")]
    NoVolume,
}

/// 加载 / 导入 / 保存结果.
pub type PaintResult<T> = Result<T, PaintError>;
