//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Point, Size};

pub use crate::data::slice::{
    ImgWriteRaw, ImgWriteVis, LabelSlice, LabelSliceMut, OwnedLabelSlice, ScanSlice,
};
pub use crate::data::window::IntensityWindow;
pub use crate::data::{LabelVolume, Volume, VolumeGeometry};

pub use crate::consts::label::{BLUE, CLEAR, GREEN, PURPLE, RED, SKY_BLUE};

pub use crate::geometry::{Affine, AxisTransform, DisplayMapper};
pub use crate::paint::{rasterize, Brush, DiskMask};
pub use crate::render::{render_overlay, render_scan, SliceCache};

pub use crate::{LabelLayer, LoadedVolume, PaintError, PaintResult, PainterConfig, Session};
