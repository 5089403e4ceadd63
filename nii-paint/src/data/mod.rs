use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::{label, NIFTI_EXTENSIONS};
use crate::geometry::{Affine, AxisTransform};
use crate::{Idx2d, Idx3d, PaintError, PaintResult};

pub mod slice;
pub mod window;

pub use slice::{ImgWriteRaw, ImgWriteVis, LabelSlice, LabelSliceMut, OwnedLabelSlice, ScanSlice};

pub use window::IntensityWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 3D 体数据 (工作方向 `(z, h, w)`) 的共用属性和部分通用操作.
pub trait VolumeGeometry {
    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }
}

/// 文件名是否以 `.nii` 或 `.nii.gz` 结尾 (不区分大小写)?
pub(crate) fn has_nifti_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            let name = name.to_ascii_lowercase();
            NIFTI_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        })
        .unwrap_or(false)
}

/// 读取 NIfTI 文件, 获得 header 和原始方向 `[i, j, k]` 的强度数组.
///
/// 强度已按 `scl_slope`/`scl_inter` 换算. 尾部长度为 1 的维度 (如单帧 4D) 会被去除.
pub(crate) fn read_native(path: &Path) -> PaintResult<(NiftiHeader, Array3<f32>)> {
    if !has_nifti_extension(path) {
        return Err(PaintError::UnsupportedExtension(path.to_path_buf()));
    }
    let load_err = |source| PaintError::Load {
        path: path.to_path_buf(),
        source,
    };
    let obj = ReaderOptions::new().read_file(path).map_err(load_err)?;
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<f32>().map_err(load_err)?;
    Ok((header, squeeze_3d(data)?))
}

/// 去除第 3 维之后长度为 1 的维度, 得到 3D 数组.
fn squeeze_3d(mut data: ArrayD<f32>) -> PaintResult<Array3<f32>> {
    let shape = data.shape().to_vec();
    while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| PaintError::NotVolumetric(shape))?;
    if data.is_empty() {
        return Err(PaintError::EmptyVolume);
    }
    Ok(data)
}

/// nii 格式 3D 体数据, 包括 header、原始仿射矩阵和工作方向的强度数组.
///
/// 加载之后不可变.
#[derive(Debug, Clone)]
pub struct Volume {
    header: BoxedHeader,
    affine: Affine,
    transform: AxisTransform,
    data: Array3<f32>,
}

impl VolumeGeometry for Volume {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for Volume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Volume {
    /// 打开 nii 文件格式的 3D 体数据, 并重排为工作方向.
    /// `path` 必须以 `.nii` 或 `.nii.gz` 结尾.
    pub fn open<P: AsRef<Path>>(path: P) -> PaintResult<Self> {
        let (header, native) = read_native(path.as_ref())?;
        Ok(Self::from_native(header, native))
    }

    /// 由 header 和原始方向 `[i, j, k]` 的数组构建体数据.
    ///
    /// 仿射矩阵按 [`Affine::from_header`] 的规则从 `header` 中获取.
    pub fn from_native(header: NiftiHeader, native: Array3<f32>) -> Self {
        let affine = Affine::from_header(&header);
        let transform = AxisTransform::from_affine(&affine, native.dim());
        let data = transform.to_working(native);
        Self {
            header: Box::new(header),
            affine,
            transform,
            data,
        }
    }

    /// 原始 header.
    #[inline]
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// 原始数组的仿射矩阵.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 工作方向数组的仿射矩阵.
    #[inline]
    pub fn working_affine(&self) -> Affine {
        self.affine * self.transform.working_to_native_matrix()
    }

    /// 原始方向与工作方向之间的变换.
    #[inline]
    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    /// 获取 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 以整个体数据的强度范围构建强度窗.
    #[inline]
    pub fn intensity_window(&self) -> IntensityWindow {
        IntensityWindow::from_volume(self.data.view())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}

/// 工作方向的 3D 标签体. 标签值以 `u8` 保存, 总在 `0..=MAX_LABEL` 之内.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolume {
    data: Array3<u8>,
}

impl VolumeGeometry for LabelVolume {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for LabelVolume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

/// 找出 `it` 中第一个不是合法标签的值.
fn first_invalid_code<'a, I: IntoIterator<Item = &'a u8>>(it: I) -> Option<u8> {
    it.into_iter().copied().find(|c| !label::is_valid(*c))
}

impl LabelVolume {
    /// 创建形状为 `shape` 的全零标签体.
    #[inline]
    pub fn create(shape: Idx3d) -> Self {
        Self {
            data: Array3::zeros(shape),
        }
    }

    /// 将浮点数据转换为标签值. 任何非整数或超出 `0..=MAX_LABEL` 的值都会导致
    /// [`PaintError::LabelOutOfRange`].
    pub fn codes_from_f32(data: &Array3<f32>) -> PaintResult<Array3<u8>> {
        let max = label::MAX_LABEL as f32;
        if let Some(bad) = data
            .iter()
            .find(|v| !(v.fract() == 0.0 && (0.0..=max).contains(*v)))
        {
            return Err(PaintError::LabelOutOfRange(*bad));
        }
        Ok(data.mapv(|v| v as u8))
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片. 切片是实时视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> LabelSlice<'_> {
        LabelSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片. 越界时返回 `None`.
    #[inline]
    pub fn get_slice(&self, z_index: usize) -> Option<LabelSlice<'_>> {
        (z_index < self.len_z()).then(|| self.slice_at(z_index))
    }

    /// 获取 z 空间的第 `z_index` 层可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, z_index: usize) -> LabelSliceMut<'_> {
        LabelSliceMut::new(self.data.index_axis_mut(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = LabelSlice<'_>> {
        self.data.axis_iter(Axis(0)).map(LabelSlice::new)
    }

    /// 获取 `pos` 处的标签值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<u8> {
        self.data.get(pos).copied()
    }

    /// 将 `pos` 处的标签设置为 `code`.
    ///
    /// 越界或 `code` 不是合法标签时什么都不做, 返回 `false`.
    pub fn set(&mut self, pos: Idx3d, code: u8) -> bool {
        if !label::is_valid(code) {
            return false;
        }
        match self.data.get_mut(pos) {
            Some(p) => {
                *p = code;
                true
            }
            None => false,
        }
    }

    /// 用 `data` 整体替换标签. 形状不一致或含有非法标签时返回 `Err`,
    /// 此时原有标签保持不变.
    pub fn replace_with(&mut self, data: Array3<u8>) -> PaintResult<()> {
        if data.dim() != self.shape() {
            return Err(PaintError::ShapeMismatch {
                expected: self.shape(),
                found: data.dim(),
            });
        }
        if let Some(bad) = first_invalid_code(data.iter()) {
            return Err(PaintError::LabelOutOfRange(bad as f32));
        }
        self.data = data;
        Ok(())
    }

    /// 将所有体素重置为 [`label::CLEAR`].
    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(label::CLEAR);
    }

    /// 获取标签值为 `code` 的体素个数.
    #[inline]
    pub fn count(&self, code: u8) -> usize {
        self.data.iter().filter(|p| **p == code).count()
    }

    /// 统计每个标签值的体素个数. 第 `i` 项为标签值 `i` 的个数.
    pub fn histogram(&self) -> [usize; label::LABEL_COUNT + 1] {
        let mut ans = [0; label::LABEL_COUNT + 1];
        for pixel in self.data.iter() {
            ans[*pixel as usize] += 1;
        }
        ans
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::label::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_check() {
        assert!(has_nifti_extension(Path::new("/a/b/scan.nii")));
        assert!(has_nifti_extension(Path::new("scan.NII.GZ")));
        assert!(!has_nifti_extension(Path::new("scan.nii.zip")));
        assert!(!has_nifti_extension(Path::new("scan.png")));
        let err = Volume::open("volume.mha").unwrap_err();
        assert!(matches!(err, PaintError::UnsupportedExtension(p) if p == PathBuf::from("volume.mha")));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let path = std::env::temp_dir().join("nii-paint-does-not-exist.nii.gz");
        assert!(matches!(Volume::open(path), Err(PaintError::Load { .. })));
    }

    #[test]
    fn test_squeeze_3d() {
        let d4 = ArrayD::<f32>::zeros(vec![4, 3, 2, 1]);
        assert_eq!(squeeze_3d(d4).unwrap().dim(), (4, 3, 2));

        let d4 = ArrayD::<f32>::zeros(vec![4, 3, 2, 5]);
        assert!(matches!(squeeze_3d(d4), Err(PaintError::NotVolumetric(s)) if s == vec![4, 3, 2, 5]));

        let d2 = ArrayD::<f32>::zeros(vec![4, 3]);
        assert!(matches!(squeeze_3d(d2), Err(PaintError::NotVolumetric(_))));

        let empty = ArrayD::<f32>::zeros(vec![4, 0, 2]);
        assert!(matches!(squeeze_3d(empty), Err(PaintError::EmptyVolume)));
    }

    #[test]
    fn test_volume_from_native_identity_affine() {
        let native = Array3::from_shape_fn((4, 3, 2), |(i, j, k)| (i * 100 + j * 10 + k) as f32);
        let vol = Volume::from_native(NiftiHeader::default(), native);
        // (z, h, w) = (k, Y-1-j, X-1-i).
        assert_eq!(vol.shape(), (2, 3, 4));
        assert_eq!(vol[(1, 0, 0)], 321.0);
        assert_eq!(vol.slice_at(0).shape(), (3, 4));
        assert_eq!(vol.len_z(), 2);
    }

    #[test]
    fn test_label_volume_set_get() {
        let mut lv = LabelVolume::create((2, 3, 4));
        assert_eq!(lv.size(), 24);
        assert!(lv.set((1, 2, 3), RED));
        assert!(!lv.set((2, 0, 0), RED));
        assert!(!lv.set((0, 3, 0), RED));
        assert!(!lv.set((0, 0, 0), MAX_LABEL + 1));
        assert_eq!(lv.get((1, 2, 3)), Some(RED));
        assert_eq!(lv.get((5, 5, 5)), None);
        assert_eq!(lv.count(RED), 1);
        assert_eq!(lv.slice_at(1)[(2, 3)], RED);
        assert!(lv.get_slice(2).is_none());

        let hist = lv.histogram();
        assert_eq!(hist[CLEAR as usize], 23);
        assert_eq!(hist[RED as usize], 1);

        lv.clear();
        assert_eq!(lv.count(CLEAR), 24);
    }

    #[test]
    fn test_replace_with_shape_mismatch_keeps_labels() {
        let mut lv = LabelVolume::create((2, 3, 4));
        lv.set((0, 1, 1), BLUE);
        let before = lv.clone();

        let err = lv.replace_with(Array3::zeros((3, 3, 4))).unwrap_err();
        assert!(matches!(
            err,
            PaintError::ShapeMismatch {
                expected: (2, 3, 4),
                found: (3, 3, 4)
            }
        ));
        assert_eq!(lv, before);

        let err = lv.replace_with(Array3::from_elem((2, 3, 4), 9)).unwrap_err();
        assert!(matches!(err, PaintError::LabelOutOfRange(v) if v == 9.0));
        assert_eq!(lv, before);

        lv.replace_with(Array3::from_elem((2, 3, 4), GREEN)).unwrap();
        assert_eq!(lv.count(GREEN), 24);
    }

    #[test]
    fn test_codes_from_f32() {
        let ok = Array3::from_shape_vec((1, 1, 3), vec![0.0, 3.0, 6.0]).unwrap();
        assert_eq!(
            LabelVolume::codes_from_f32(&ok).unwrap().into_raw_vec(),
            vec![0, 3, 6]
        );
        for bad in [7.0, -1.0, 2.5, f32::NAN] {
            let arr = Array3::from_elem((1, 1, 1), bad);
            assert!(matches!(
                LabelVolume::codes_from_f32(&arr),
                Err(PaintError::LabelOutOfRange(_))
            ));
        }
    }
}
