//! 标签 / 强度切片对象的操作.

mod core;
mod save;

pub use core::{LabelSlice, LabelSliceMut, OwnedLabelSlice, ScanSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};
