//! spot 包围盒采样.
//!
//! 给定 spot 中心 `c` 和整数半径 `r`, 每个轴上的包围盒为左闭右开区间
//! `[c - (r - 1), c + r)`, 并裁剪到 `[0, len]` 内. 这样包围盒以中心为基准对称,
//! 同时满足右开的切片语义.

use std::ops::Range;

use ndarray::{s, ArrayView3};

use super::{Measurement, Spot};
use crate::consts::FILL_VALUE;
use crate::Idx3d;

/// 3D 轴对齐包围盒, 每个轴均为左闭右开区间, 且保证位于帧范围内.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundingBox {
    /// z 方向范围.
    pub z: Range<usize>,

    /// y 方向范围.
    pub y: Range<usize>,

    /// x 方向范围.
    pub x: Range<usize>,
}

/// 按半径策略将 spot 半径转换为整数包围盒半径.
///
/// 回转半径向上取整后再加 1; 否则向零截断, 且至少为 1,
/// 以保证零半径的 spot 恰好采样中心体素. 过大的半径饱和到 `i64::MAX`.
#[inline]
fn box_radius(radius: f64, radius_is_gyration: bool) -> i64 {
    if radius_is_gyration {
        (radius.ceil() as i64).saturating_add(1)
    } else {
        (radius.trunc() as i64).max(1)
    }
}

/// 计算单个轴上裁剪后的区间. 坐标在裁剪后向零截断.
fn axis_range(center: f64, r: i64, len: usize) -> Range<usize> {
    // `as usize` 对负数饱和到 0.
    let lo = ((center - r.saturating_sub(1) as f64).max(0.0) as usize).min(len);
    let hi = ((center + r as f64).min(len as f64) as usize).max(lo);
    lo..hi
}

impl BoundingBox {
    /// 计算 `spot` 在形状为 `shape` 的帧中的包围盒.
    pub fn around(spot: &Spot, (lz, ly, lx): Idx3d, radius_is_gyration: bool) -> Self {
        let r = box_radius(spot.radius, radius_is_gyration);
        let [cz, cy, cx] = spot.center();
        Self {
            z: axis_range(cz, r, lz),
            y: axis_range(cy, r, ly),
            x: axis_range(cx, r, lx),
        }
    }

    /// 包围盒形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (self.z.len(), self.y.len(), self.x.len())
    }

    /// 包围盒是否不含任何体素 (即某个轴长度为 0)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty() || self.y.is_empty() || self.x.is_empty()
    }

    /// 包围盒是否位于形状为 `shape` 的帧内?
    #[inline]
    pub fn is_within(&self, (lz, ly, lx): Idx3d) -> bool {
        self.z.end <= lz && self.y.end <= ly && self.x.end <= lx
    }

    /// 获取 `frame` 中包围盒对应的子视图.
    ///
    /// 包围盒必须由同形状的帧计算得到, 否则程序 panic.
    #[inline]
    pub fn slice<'a>(&self, frame: ArrayView3<'a, f32>) -> ArrayView3<'a, f32> {
        frame.slice_move(s![self.z.clone(), self.y.clone(), self.x.clone()])
    }
}

/// 测量单个 spot 在 `frame` 中的强度.
///
/// 包围盒为空时不调用 `measurement`, 直接返回 [`FILL_VALUE`].
pub fn measure_spot(
    frame: ArrayView3<'_, f32>,
    spot: &Spot,
    measurement: Measurement,
    radius_is_gyration: bool,
) -> f32 {
    let bbox = BoundingBox::around(spot, frame.dim(), radius_is_gyration);
    if bbox.is_empty() {
        log::trace!("spot {:?} has an empty bounding box {bbox:?}", spot.center());
        return FILL_VALUE;
    }
    measurement.reduce(bbox.slice(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// `(2, 5, 6)`, 体素值为 `z * 100 + y * 10 + x`.
    fn ramp() -> Array3<f32> {
        Array3::from_shape_fn((2, 5, 6), |(z, y, x)| (z * 100 + y * 10 + x) as f32)
    }

    #[test]
    fn test_zero_radius_measures_center() {
        let frame = ramp();
        for (z, y, x) in [(0, 0, 0), (1, 2, 3), (1, 4, 5), (0, 3, 1)] {
            let spot = Spot::new_3d(z as f64, y as f64, x as f64, 0.0);
            let bbox = BoundingBox::around(&spot, frame.dim(), false);
            assert_eq!(bbox.shape(), (1, 1, 1));
            let v = measure_spot(frame.view(), &spot, Measurement::Mean, false);
            assert_eq!(v, frame[(z, y, x)]);
        }
    }

    #[test]
    fn test_box_symmetric_around_center() {
        let spot = Spot::new_3d(5.0, 5.0, 5.0, 2.0);
        let bbox = BoundingBox::around(&spot, (20, 20, 20), false);
        assert_eq!(bbox.y, 4..7);
        assert_eq!(bbox.shape(), (3, 3, 3));

        // 亚像素中心与半径均被截断.
        let spot = Spot::new_3d(5.9, 5.2, 5.0, 2.7);
        let bbox = BoundingBox::around(&spot, (20, 20, 20), false);
        assert_eq!(bbox.z, 4..7);
        assert_eq!(bbox.y, 4..7);
    }

    #[test]
    fn test_box_clipped_to_frame() {
        let shape = (2, 5, 6);
        let centers = [-7.0, -1.0, 0.0, 0.5, 2.0, 4.0, 5.0, 5.9, 6.0, 9.0, 100.0];
        for &c in centers.iter() {
            for radius in [0.0, 0.4, 1.0, 2.5, 3.0, 10.0] {
                for gyration in [false, true] {
                    let spot = Spot::new_3d(c, c, c, radius);
                    let bbox = BoundingBox::around(&spot, shape, gyration);
                    assert!(bbox.is_within(shape), "{bbox:?}");
                    assert!(bbox.z.start <= bbox.z.end);
                    assert!(bbox.y.start <= bbox.y.end);
                    assert!(bbox.x.start <= bbox.x.end);
                }
            }
        }
    }

    #[test]
    fn test_gyration_box_not_smaller() {
        let shape = (50, 50, 50);
        for radius in [0.0, 0.3, 1.0, 1.5, 2.0, 4.99] {
            let spot = Spot::new_3d(25.0, 25.0, 25.0, radius);
            let (fz, fy, fx) = BoundingBox::around(&spot, shape, false).shape();
            let (gz, gy, gx) = BoundingBox::around(&spot, shape, true).shape();
            assert!(gz >= fz && gy >= fy && gx >= fx);
        }
        // ceil(1.5) + 1 = 3 -> [23, 28)
        let spot = Spot::new_3d(25.0, 25.0, 25.0, 1.5);
        assert_eq!(BoundingBox::around(&spot, shape, true).x, 23..28);
    }

    #[test]
    fn test_huge_radius_covers_whole_frame() {
        let frame = ramp();
        let spot = Spot::new_2d(1.0, 1.0, 1e19);
        for gyration in [false, true] {
            let bbox = BoundingBox::around(&spot, frame.dim(), gyration);
            assert_eq!(bbox.shape(), frame.dim());
            assert_eq!(measure_spot(frame.view(), &spot, Measurement::Max, gyration), 145.0);
        }
        assert_eq!(box_radius(f64::MAX, true), i64::MAX);
    }

    #[test]
    fn test_missing_z_uses_first_plane() {
        let frame = ramp();
        let spot = Spot::new_2d(2.0, 3.0, 1.0);
        let bbox = BoundingBox::around(&spot, frame.dim(), false);
        assert_eq!(bbox.z, 0..1);
        assert_eq!(measure_spot(frame.view(), &spot, Measurement::Max, false), 23.0);
    }

    #[test]
    fn test_degenerate_box_yields_fill_value() {
        let frame = Array3::from_elem((1, 4, 4), 7.0f32);
        // 中心在帧外: x 轴区间退化.
        let spot = Spot::new_3d(0.0, 1.0, 9.0, 1.0);
        let bbox = BoundingBox::around(&spot, frame.dim(), false);
        assert!(bbox.is_empty());
        for m in [
            Measurement::Max,
            Measurement::Min,
            Measurement::Mean,
            Measurement::Sum,
            Measurement::Median,
        ] {
            assert_eq!(measure_spot(frame.view(), &spot, m, false), FILL_VALUE);
        }

        let spot = Spot::new_3d(0.0, -3.0, 1.0, 1.0);
        assert_eq!(
            measure_spot(frame.view(), &spot, Measurement::Max, false),
            FILL_VALUE
        );
    }

    #[test]
    fn test_box_measurement_over_neighbourhood() {
        let frame = ramp();
        let spot = Spot::new_3d(1.0, 2.0, 2.0, 2.0);
        // z: [0, 2), y: [1, 4), x: [1, 4)
        assert_eq!(measure_spot(frame.view(), &spot, Measurement::Max, false), 133.0);
        assert_eq!(measure_spot(frame.view(), &spot, Measurement::Min, false), 11.0);
    }
}
