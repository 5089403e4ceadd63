//! 会话编排: 加载、拖动涂抹、滚动切片、渲染与保存.
//!
//! 会话状态机:
//!
//! ```text
//! Empty -> Loaded <-> Painting
//!            |  ^
//!            +--+  (重新加载体数据 / 导入外部标签)
//! ```
//!
//! 保存只是副作用, 不改变状态.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};
use nifti::writer::WriterOptions;

use crate::consts::NIFTI_GZ_EXTENSION;
use crate::data::read_native;
use crate::geometry::{Affine, AxisTransform, DisplayMapper};
use crate::paint::{rasterize, Brush, DiskMask, InvalidBrush};
use crate::render::{render_scan, SliceCache};
use crate::{
    IntensityWindow, LabelLayer, LabelVolume, PainterConfig, PaintError, PaintResult, Point, Size,
    Volume, VolumeGeometry,
};

/// 已解码并重排到工作方向的体数据. 尚未装入任何会话.
///
/// [`LoadedVolume::open`] 是唯一耗时的步骤, 可以在其他线程上完成,
/// 然后通过 [`Session::install`] 一次性替换会话状态.
#[derive(Debug, Clone)]
pub struct LoadedVolume {
    path: PathBuf,
    volume: Volume,
    window: IntensityWindow,
}

impl LoadedVolume {
    /// 打开 `path` 处的体数据, 重排到工作方向, 并计算强度窗.
    pub fn open<P: AsRef<Path>>(path: P) -> PaintResult<Self> {
        let path = path.as_ref();
        let volume = Volume::open(path)?;
        let window = volume.intensity_window();
        Ok(Self {
            path: path.to_path_buf(),
            volume,
            window,
        })
    }

    /// 源文件路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 体数据.
    #[inline]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }
}

/// 已加载体数据的会话状态. 各部分总是一起被替换.
struct Loaded {
    source: PathBuf,
    volume: Volume,
    window: IntensityWindow,
    layer: LabelLayer,
    scans: SliceCache<GrayImage>,
    current: usize,
}

/// 切片索引变化的监听器.
type SliceListener = Box<dyn FnMut(usize)>;

/// 一个标注会话. 拥有体数据、标签图层和渲染缓存; 由上层窗口系统喂入事件.
pub struct Session {
    config: PainterConfig,
    brush: Brush,
    mask: DiskMask,
    display: Size,
    stroke: Option<Point>,
    state: Option<Loaded>,
    listeners: Vec<SliceListener>,
}

impl Default for Session {
    #[inline]
    fn default() -> Self {
        Self::new(PainterConfig::default())
    }
}

/// 保存标签时实际写入的路径: `.nii.gz` 保持不变, `.nii` 追加 `.gz`,
/// 其他情况追加 `.nii.gz`.
pub(crate) fn label_output_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(NIFTI_GZ_EXTENSION) {
        return path.to_path_buf();
    }
    let mut os = OsString::from(path.as_os_str());
    os.push(if name.ends_with(".nii") {
        ".gz"
    } else {
        NIFTI_GZ_EXTENSION
    });
    PathBuf::from(os)
}

impl Session {
    /// 以配置 `config` 创建空会话.
    pub fn new(config: PainterConfig) -> Self {
        let config = config.normalized();
        let brush = Brush::new(config.brush_size, config.brush_label)
            .unwrap_or_else(|_| Brush::default().with_size(config.brush_size));
        Self {
            config,
            brush,
            mask: brush.mask(),
            display: config.initial_display,
            stroke: None,
            state: None,
            listeners: Vec::new(),
        }
    }

    /// 会话配置.
    #[inline]
    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    /// 当前画刷.
    #[inline]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// 当前画布尺寸.
    #[inline]
    pub fn display(&self) -> Size {
        self.display
    }

    /// 是否已加载体数据?
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// 是否正在拖动涂抹?
    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// 体数据源文件路径.
    #[inline]
    pub fn source_path(&self) -> Option<&Path> {
        self.state.as_ref().map(|s| s.source.as_path())
    }

    /// 体数据.
    #[inline]
    pub fn volume(&self) -> Option<&Volume> {
        self.state.as_ref().map(|s| &s.volume)
    }

    /// 标签体.
    #[inline]
    pub fn labels(&self) -> Option<&LabelVolume> {
        self.state.as_ref().map(|s| s.layer.labels())
    }

    /// 当前切片索引. 未加载时返回 `None`.
    #[inline]
    pub fn current_slice_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current)
    }

    /// 注册切片索引变化的监听器.
    pub fn on_slice_changed<F: FnMut(usize) + 'static>(&mut self, listener: F) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, z_index: usize) {
        for listener in self.listeners.iter_mut() {
            listener(z_index);
        }
    }

    /// 修改画刷直径 (显示像素).
    pub fn set_brush_size(&mut self, size: u32) {
        self.brush = self.brush.with_size(size);
        self.mask = self.brush.mask();
    }

    /// 修改画刷标签. 只影响之后的涂抹. 非法标签返回 `Err`, 画刷不变.
    pub fn set_brush_label(&mut self, code: u8) -> Result<(), InvalidBrush> {
        self.brush = self.brush.with_code(code)?;
        Ok(())
    }

    /// 画布尺寸变化.
    pub fn on_resize(&mut self, size: Size) {
        self.display = size;
    }

    /// 当前画布与切片之间的映射.
    fn mapper(&self, state: &Loaded) -> DisplayMapper {
        DisplayMapper::new(self.display, state.volume.slice_shape())
    }

    /// 画布点 -> 切片坐标 `(x, y) = (列, 行)`.
    fn to_slice_point(&self, pos: Point) -> Option<Point> {
        let state = self.state.as_ref()?;
        let (row, col) = self.mapper(state).to_volume_index(pos);
        Some((col as i32, row as i32))
    }

    /// 按下指针: 开始一笔并在该点涂抹. 返回实际改变的体素个数.
    pub fn on_pointer_down(&mut self, pos: Point) -> usize {
        let Some(p) = self.to_slice_point(pos) else {
            return 0;
        };
        self.stroke = Some(p);
        self.paint_segment(p, p)
    }

    /// 移动指针: 拖动中时, 从上一点到该点光栅化并涂抹. 返回实际改变的体素个数.
    pub fn on_pointer_move(&mut self, pos: Point) -> usize {
        let (Some(prev), Some(p)) = (self.stroke, self.to_slice_point(pos)) else {
            return 0;
        };
        self.stroke = Some(p);
        self.paint_segment(prev, p)
    }

    /// 松开指针: 结束这一笔.
    pub fn on_pointer_up(&mut self) {
        self.stroke = None;
    }

    fn paint_segment(&mut self, from: Point, to: Point) -> usize {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        let changed = state
            .layer
            .stamp(state.current, rasterize(from, to), &self.mask, self.brush.code());
        log::debug!(
            "Stroke {from:?} -> {to:?} on slice {}: {changed} voxels changed",
            state.current
        );
        changed
    }

    /// 滚动 `delta` 个切片. 目标越界时什么都不做. 返回切片是否改变.
    pub fn on_scroll(&mut self, delta: i32) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let target = state.current as i64 + delta as i64;
        if delta == 0 || target < 0 || target >= state.volume.len_z() as i64 {
            return false;
        }
        self.change_slice(target as usize)
    }

    /// 直接跳转到第 `z_index` 层 (截断到合法范围). 返回实际所在的切片.
    pub fn set_slice_index(&mut self, z_index: usize) -> Option<usize> {
        let len_z = self.state.as_ref()?.volume.len_z();
        let z_index = z_index.min(len_z - 1);
        self.change_slice(z_index);
        Some(z_index)
    }

    fn change_slice(&mut self, z_index: usize) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.current == z_index {
            return false;
        }
        state.current = z_index;
        self.notify(z_index);
        true
    }

    /// 加载体数据. 失败时会话保持不变.
    pub fn load_volume<P: AsRef<Path>>(&mut self, path: P) -> PaintResult<()> {
        let loaded = LoadedVolume::open(path)?;
        self.install(loaded);
        Ok(())
    }

    /// 一次性装入已加载的体数据: 替换体数据、全零标签体和所有缓存,
    /// 并跳转到中间切片.
    pub fn install(&mut self, loaded: LoadedVolume) {
        let LoadedVolume {
            path,
            volume,
            window,
        } = loaded;
        let shape = volume.shape();
        let current = volume.len_z() / 2;
        log::info!(
            "Loaded `{}`: working shape {shape:?}, native shape {:?}",
            path.display(),
            volume.transform().native_shape()
        );
        self.stroke = None;
        self.state = Some(Loaded {
            source: path,
            volume,
            window,
            layer: LabelLayer::new(shape, self.config.cache_capacity),
            scans: SliceCache::new(self.config.cache_capacity),
            current,
        });
        self.notify(current);
    }

    /// 导入外部标签文件. 文件按其自身的仿射矩阵重排到工作方向.
    ///
    /// 形状不一致或含有非法标签时返回 `Err`, 当前标签保持不变.
    pub fn load_external_labels<P: AsRef<Path>>(&mut self, path: P) -> PaintResult<()> {
        let path = path.as_ref();
        let state = self.state.as_mut().ok_or(PaintError::NoVolume)?;
        let (header, native) = read_native(path)?;
        let transform = AxisTransform::from_affine(&Affine::from_header(&header), native.dim());
        let working = transform.to_working(native);

        let expected = state.layer.labels().shape();
        let result = if working.dim() != expected {
            Err(PaintError::ShapeMismatch {
                expected,
                found: working.dim(),
            })
        } else {
            LabelVolume::codes_from_f32(&working).and_then(|codes| state.layer.replace_with(codes))
        };
        match &result {
            Ok(()) => log::info!("Replaced labels from `{}`", path.display()),
            Err(e) => log::warn!("Rejected labels from `{}`: {e}", path.display()),
        }
        result
    }

    /// 保存标签. 标签被还原到原始文件的方向, 仿射矩阵与原始体数据一致.
    ///
    /// 返回实际写入的路径 (见 `.nii.gz` 后缀规则). 失败时内存中的标签不受影响.
    pub fn save_labels<P: AsRef<Path>>(&self, path: P) -> PaintResult<PathBuf> {
        let state = self.state.as_ref().ok_or(PaintError::NoVolume)?;
        let path = label_output_path(path.as_ref());
        let transform = state.volume.transform();
        let native = transform.to_native(state.layer.labels().data());

        let mut header = state.volume.header().clone();
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;
        let affine = state.volume.working_affine() * transform.native_to_working_matrix();
        let code = match (header.sform_code, header.qform_code) {
            (s, _) if s > 0 => s,
            (_, q) if q > 0 => q,
            _ => 1,
        };
        affine.write_sform(&mut header, code);

        WriterOptions::new(&path)
            .reference_header(&header)
            .write_nifti(&native)
            .map_err(|source| PaintError::Save {
                path: path.clone(),
                source,
            })?;
        log::info!("Saved labels to `{}`", path.display());
        Ok(path)
    }

    /// 清除所有标签.
    pub fn clear_all(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.layer.clear();
            log::info!("Cleared all labels");
        }
    }

    /// 当前切片在 `size` 下的标签叠加层.
    pub fn current_rendered_overlay(&mut self, size: Size) -> Option<&RgbaImage> {
        let state = self.state.as_mut()?;
        state.layer.overlay(state.current, size)
    }

    /// 当前切片在 `size` 下的灰度图像.
    pub fn current_rendered_scan(&mut self, size: Size) -> Option<&GrayImage> {
        let state = self.state.as_mut()?;
        let (volume, window) = (&state.volume, &state.window);
        Some(state.scans.get_or_render(state.current, size, |z, size| {
            render_scan(&volume.slice_at(z), window, size)
        }))
    }

    /// 画刷在画布上的半径 `(水平, 竖直)`, 与涂抹使用同一半径和映射.
    pub fn brush_cursor_radius(&self) -> Option<(f64, f64)> {
        let state = self.state.as_ref()?;
        Some(self.mapper(state).radius_to_display(self.brush.radius()))
    }
}
