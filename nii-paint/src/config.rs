//! 会话配置.

use std::env;
use std::str::FromStr;

use crate::consts::{self, brush, label};
use crate::Size;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [`crate::Session`] 的初始配置.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PainterConfig {
    /// 每个渲染缓存最多保留的图像个数. 至少为 1.
    pub cache_capacity: usize,

    /// 初始画刷直径 (显示像素). 画刷半径 (体素) 为其一半.
    pub brush_size: u32,

    /// 初始画刷标签.
    pub brush_label: u8,

    /// 初始画布尺寸 `(宽, 高)`.
    pub initial_display: Size,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            cache_capacity: consts::DEFAULT_CACHE_CAPACITY,
            brush_size: brush::DEFAULT_SIZE,
            brush_label: brush::DEFAULT_LABEL,
            initial_display: consts::DEFAULT_DISPLAY,
        }
    }
}

/// 读取并解析环境变量. 变量不存在或无法解析时返回 `None`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparsable ${key}=`{raw}`");
            None
        }
    }
}

impl PainterConfig {
    /// 以默认配置为基础, 用环境变量覆盖对应字段:
    ///
    /// 1. `$NII_PAINT_CACHE_CAPACITY` -> `cache_capacity`;
    /// 2. `$NII_PAINT_BRUSH_SIZE` -> `brush_size`;
    /// 3. `$NII_PAINT_BRUSH_LABEL` -> `brush_label` (非法标签被忽略).
    pub fn from_env() -> Self {
        let mut ans = Self::default();
        if let Some(c) = env_parse("NII_PAINT_CACHE_CAPACITY") {
            ans.cache_capacity = c;
        }
        if let Some(s) = env_parse("NII_PAINT_BRUSH_SIZE") {
            ans.brush_size = s;
        }
        if let Some(l) = env_parse::<u8>("NII_PAINT_BRUSH_LABEL").filter(|l| label::is_valid(*l)) {
            ans.brush_label = l;
        }
        ans.normalized()
    }

    /// 修正越界字段: 缓存容量至少为 1, 非法标签回落到默认值.
    pub fn normalized(mut self) -> Self {
        self.cache_capacity = self.cache_capacity.max(1);
        if !label::is_valid(self.brush_label) {
            self.brush_label = brush::DEFAULT_LABEL;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::PainterConfig;

    #[test]
    fn test_default_config() {
        let c = PainterConfig::default();
        assert_eq!(c.cache_capacity, 100);
        assert_eq!(c.brush_size, 8);
        assert_eq!(c.brush_label, 1);
        assert_eq!(c.initial_display, (540, 540));
    }

    #[test]
    fn test_normalized() {
        let c = PainterConfig {
            cache_capacity: 0,
            brush_label: 42,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.cache_capacity, 1);
        assert_eq!(c.brush_label, 1);
    }
}
