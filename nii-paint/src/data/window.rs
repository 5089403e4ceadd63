use ndarray::ArrayView3;

/// 强度窗口, 包含下界和上界. 用于将体数据强度映射到 8 位灰度.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    lower: f32,
    upper: f32,
}

impl IntensityWindow {
    /// 构建强度窗.
    ///
    /// `lower` 和 `upper` 必须是有限值, 且 `lower <= upper`, 否则返回 `None`.
    /// `lower == upper` 时, 所有强度都会被映射为黑色.
    pub fn new(lower: f32, upper: f32) -> Option<IntensityWindow> {
        if lower.is_finite() && upper.is_finite() && lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 以窗位和窗宽构建强度窗. `width` 必须非负.
    pub fn from_level_width(level: f32, width: f32) -> Option<IntensityWindow> {
        if width < 0.0 {
            return None;
        }
        Self::new(level - width / 2.0, level + width / 2.0)
    }

    /// 以 `it` 中所有有限值的最小值和最大值构建强度窗.
    ///
    /// 若 `it` 中没有有限值, 则得到窗口 `[0, 0]`.
    pub fn from_min_max<I: IntoIterator<Item = f32>>(it: I) -> IntensityWindow {
        let (lower, upper) = it
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));
        Self { lower, upper }
    }

    /// 以整个体数据的强度范围构建强度窗.
    #[inline]
    pub fn from_volume(data: ArrayView3<f32>) -> IntensityWindow {
        Self::from_min_max(data.iter().copied())
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.upper
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        (self.lower + self.upper) / 2.0
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// 窗口宽度为 0?
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.width() <= 0.0
    }

    /// 求在当前窗设置下, 强度 `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.lower {
            // 窗宽为 0 时总会走到这里, 整幅图像为黑色.
            Some(u8::MIN)
        } else if v >= self.upper {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - self.lower) / self.width()) * 255.0) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IntensityWindow;
    use ndarray::Array3;

    #[test]
    fn test_window_invalid_input() {
        assert!(IntensityWindow::new(1.0, 0.0).is_none());
        assert!(IntensityWindow::new(f32::NAN, 1.0).is_none());
        assert!(IntensityWindow::from_level_width(0.0, -1.0).is_none());
        assert!(IntensityWindow::new(3.0, 3.0).is_some());
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let win = IntensityWindow::from_level_width(80.0, 40.0).unwrap();
        assert_eq!(win.eval(f32::NAN), None);
        assert_eq!(win.eval(f32::MIN), Some(0));
        assert_eq!(win.eval(f32::MAX), Some(255));

        assert_eq!(win.eval(60.0), Some(0));
        assert_eq!(win.eval(60.1), Some(0));
        assert_eq!(win.eval(70.0).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(win.eval(80.0).unwrap(), (255.0 * 0.5) as u8);
        assert_eq!(win.eval(99.999), Some(254));
        assert_eq!(win.eval(100.0), Some(255));
    }

    #[test]
    fn test_window_from_volume() {
        let data = Array3::from_shape_fn((2, 3, 4), |(z, h, w)| (z * 12 + h * 4 + w) as f32 - 5.0);
        let win = IntensityWindow::from_volume(data.view());
        assert_eq!(win.lower_bound(), -5.0);
        assert_eq!(win.upper_bound(), 18.0);
        assert_eq!(win.eval(-5.0), Some(0));
        assert_eq!(win.eval(18.0), Some(255));
    }

    #[test]
    fn test_flat_window_is_black() {
        let win = IntensityWindow::from_min_max([7.0, 7.0, f32::NAN, 7.0]);
        assert!(win.is_flat());
        assert_eq!(win.eval(7.0), Some(0));

        let empty = IntensityWindow::from_min_max(std::iter::empty());
        assert_eq!((empty.lower_bound(), empty.upper_bound()), (0.0, 0.0));
    }
}
