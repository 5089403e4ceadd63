//! 切片图像的持久化存储.

use crate::consts::label;
use crate::{IntensityWindow, LabelSlice, LabelSliceMut, ScanSlice};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 这意味着, 对于 `LabelSlice`, `LabelSliceMut`
/// 这类仅存在 0 ~ 6 像素值的图像, 在保存时会按调色板着色;
/// 对于 `ScanSlice` 这类以原始强度存储的切片, 在保存时会用强度窗规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 对于 `LabelSlice`, `LabelSliceMut` 这类图像可以直接存储为灰度图像,
/// 但面对 `ScanSlice` 这类浮点强度切片无能为力.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 标签值对应的不透明 RGB 颜色. 背景为黑色.
#[inline]
pub(crate) fn pretty(code: u8) -> image::Rgb<u8> {
    let [r, g, b, _] = label::rgba(code);
    image::Rgb([r, g, b])
}

macro_rules! impl_label_vis {
    ($($slice: ty),+) => {
        $(
            /// 按调色板着色, 背景及非法标签为黑色.
            impl ImgWriteVis for $slice {
                fn save<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::RgbImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, pretty(pix));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

macro_rules! impl_label_raw {
    ($($slice: ty),+) => {
        $(
            /// 按原样存储.
            impl ImgWriteRaw for $slice {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl ScanSlice<'_> {
    /// 以强度窗 `window` 将切片保存为灰度图像.
    pub fn save_with<P: AsRef<Path>>(&self, path: P, window: &IntensityWindow) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.indexed_iter() {
            let gray = window.eval(v).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

/// 以切片自身的强度范围作为窗口.
impl ImgWriteVis for ScanSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let window = IntensityWindow::from_min_max(self.data().iter().copied());
        self.save_with(path, &window)
    }
}

impl_label_vis!(LabelSlice<'_>, LabelSliceMut<'_>);
impl_label_raw!(LabelSlice<'_>, LabelSliceMut<'_>);
