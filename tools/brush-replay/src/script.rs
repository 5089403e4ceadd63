//! 笔画脚本.
//!
//! ```json
//! {
//!   "display": [540, 540],
//!   "events": [
//!     { "op": "brush", "size": 4, "label": 2 },
//!     { "op": "down", "x": 100, "y": 120 },
//!     { "op": "move", "x": 180, "y": 160 },
//!     { "op": "up" },
//!     { "op": "scroll", "delta": 1 }
//!   ]
//! }
//! ```

use nii_paint::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 一个会话事件.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    /// 按下指针.
    Down { x: i32, y: i32 },

    /// 移动指针.
    Move { x: i32, y: i32 },

    /// 松开指针.
    Up,

    /// 滚动若干切片.
    Scroll { delta: i32 },

    /// 跳转到指定切片.
    Slice { index: usize },

    /// 修改画刷. 缺省的字段保持不变.
    Brush {
        #[serde(default)]
        size: Option<u32>,
        #[serde(default)]
        label: Option<u8>,
    },

    /// 画布尺寸变化.
    Resize { width: u32, height: u32 },

    /// 清除所有标签.
    Clear,

    /// 导入外部标签文件.
    LoadLabels { path: PathBuf },
}

/// 一段录制的事件序列.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// 初始画布尺寸. 缺省时使用会话配置.
    #[serde(default)]
    pub display: Option<Size>,

    /// 事件.
    pub events: Vec<Event>,
}

impl Script {
    /// 从 JSON 文本解析.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// 从文件读取.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(io::Error::from)
    }
}
