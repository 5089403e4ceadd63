//! 通用常量.

/// 标签值及其调色板.
pub mod label {
    /// 背景 / 擦除. 渲染时完全透明.
    pub const CLEAR: u8 = 0;

    /// 红色标签.
    pub const RED: u8 = 1;

    /// 绿色标签.
    pub const GREEN: u8 = 2;

    /// 蓝色标签.
    pub const BLUE: u8 = 3;

    /// 黄色标签.
    pub const YELLOW: u8 = 4;

    /// 天蓝色标签.
    pub const SKY_BLUE: u8 = 5;

    /// 紫色标签.
    pub const PURPLE: u8 = 6;

    /// 合法标签值的上界 (含).
    pub const MAX_LABEL: u8 = PURPLE;

    /// 标签类别个数 (不含背景).
    pub const LABEL_COUNT: usize = MAX_LABEL as usize;

    /// 完全透明的 RGBA 像素.
    pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

    /// 第 `i` 项为标签值 `i + 1` 的 RGBA 颜色.
    pub const PALETTE: [[u8; 4]; LABEL_COUNT] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 0, 255],
        [135, 206, 235, 255],
        [128, 0, 128, 255],
    ];

    /// 获取标签值的显示名称. 非法标签返回 `None`.
    pub const fn name(code: u8) -> Option<&'static str> {
        match code {
            CLEAR => Some("Clear"),
            RED => Some("Red"),
            GREEN => Some("Green"),
            BLUE => Some("Blue"),
            YELLOW => Some("Yellow"),
            SKY_BLUE => Some("Sky Blue"),
            PURPLE => Some("Purple"),
            _ => None,
        }
    }

    /// 标签值是否合法?
    #[inline]
    pub const fn is_valid(code: u8) -> bool {
        code <= MAX_LABEL
    }

    /// 标签值是否代表擦除?
    #[inline]
    pub const fn is_clear(code: u8) -> bool {
        matches!(code, CLEAR)
    }

    /// 获取标签值对应的 RGBA 颜色. 背景和非法值均为透明.
    #[inline]
    pub const fn rgba(code: u8) -> [u8; 4] {
        match code {
            1..=MAX_LABEL => PALETTE[(code - 1) as usize],
            _ => TRANSPARENT,
        }
    }
}

/// 画刷相关的默认值.
pub mod brush {
    /// 可选的画刷直径 (显示像素).
    pub const SIZE_PRESETS: [u32; 6] = [1, 2, 4, 8, 16, 32];

    /// 默认画刷直径 (显示像素).
    pub const DEFAULT_SIZE: u32 = 8;

    /// 默认画刷标签.
    pub const DEFAULT_LABEL: u8 = super::label::RED;
}

/// 切片渲染缓存默认容量.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// 画布默认尺寸 `(宽, 高)`.
pub const DEFAULT_DISPLAY: crate::Size = (540, 540);

/// 可以打开的体数据文件扩展名.
pub const NIFTI_EXTENSIONS: [&str; 2] = [".nii", ".nii.gz"];

/// 保存标签时使用的压缩格式扩展名.
pub const NIFTI_GZ_EXTENSION: &str = ".nii.gz";

#[cfg(test)]
mod tests {
    use super::label::*;

    #[test]
    fn test_palette_is_distinct_and_opaque() {
        for (i, a) in PALETTE.iter().enumerate() {
            assert_eq!(a[3], 255);
            for b in PALETTE.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_rgba_lookup() {
        assert_eq!(rgba(CLEAR), TRANSPARENT);
        assert_eq!(rgba(RED), [255, 0, 0, 255]);
        assert_eq!(rgba(PURPLE), [128, 0, 128, 255]);
        assert_eq!(rgba(MAX_LABEL + 1), TRANSPARENT);
        assert_eq!(name(SKY_BLUE), Some("Sky Blue"));
        assert_eq!(name(7), None);
    }
}
