use std::iter::FusedIterator;

use crate::Point;

/// 整数 Bresenham 直线上的点, 按从起点到终点的顺序给出, 包含两端.
///
/// 相邻两点在每个坐标上至多相差 1 (8-连通), 总点数为 `max(|dx|, |dy|) + 1`.
#[derive(Clone, Debug)]
pub struct LinePoints {
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    remaining: usize,
}

impl LinePoints {
    /// 创建从 `from` 到 `to` 的直线.
    pub fn new((x0, y0): Point, (x1, y1): Point) -> Self {
        let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            dx,
            dy,
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
            err: dx - dy,
            remaining: dx.max(dy) as usize + 1,
        }
    }
}

impl Iterator for LinePoints {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.remaining == 0 {
            return None;
        }
        let ans = (self.x as i32, self.y as i32);
        self.remaining -= 1;
        if self.remaining > 0 {
            let e2 = 2 * self.err;
            if e2 > -self.dy {
                self.err -= self.dy;
                self.x += self.sx;
            }
            if e2 < self.dx {
                self.err += self.dx;
                self.y += self.sy;
            }
        }
        Some(ans)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for LinePoints {}

impl FusedIterator for LinePoints {}

/// 光栅化从 `from` 到 `to` 的线段. 见 [`LinePoints`].
#[inline]
pub fn rasterize(from: Point, to: Point) -> LinePoints {
    LinePoints::new(from, to)
}
