//! 单帧强度提取.

use ndarray::{Array1, ArrayView3};
use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::bbox::{measure_spot, BoundingBox};
use super::SpotAttributes;
use crate::consts::FILL_VALUE;

/// 将包围盒区域归约为单个强度值的方式.
///
/// `Max` 和 `Min` 忽略 NaN 体素, 区域内全为 NaN 时返回 [`FILL_VALUE`].
/// `Mean`, `Sum` 和 `Median` 不做特殊处理.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Measurement {
    /// 最大值.
    #[default]
    Max,

    /// 最小值.
    Min,

    /// 平均值.
    Mean,

    /// 总和.
    Sum,

    /// 中位数. 偶数个元素时取中间两个的平均值.
    Median,
}

impl Measurement {
    /// 归约 `region`. `region` 为空时返回 [`FILL_VALUE`].
    pub fn reduce(&self, region: ArrayView3<'_, f32>) -> f32 {
        if region.is_empty() {
            return FILL_VALUE;
        }
        match self {
            Measurement::Max => non_nan(region).reduce(f32::max).unwrap_or(FILL_VALUE),
            Measurement::Min => non_nan(region).reduce(f32::min).unwrap_or(FILL_VALUE),
            Measurement::Mean => region.sum() / region.len() as f32,
            Measurement::Sum => region.sum(),
            Measurement::Median => {
                let mut buf: Vec<OrderedFloat<f32>> =
                    region.iter().copied().map(OrderedFloat).collect();
                buf.sort_unstable();
                let mid = buf.len() / 2;
                if buf.len() % 2 == 1 {
                    buf[mid].0
                } else {
                    (buf[mid - 1].0 + buf[mid].0) / 2.0
                }
            }
        }
    }
}

fn non_nan<'a>(region: ArrayView3<'a, f32>) -> impl Iterator<Item = f32> + 'a {
    region.into_iter().copied().filter(|v| !v.is_nan())
}

/// 测量 `spots` 中每个 spot 在 3D 帧 `frame` 中的强度.
///
/// 返回值与 `spots` 的行一一对应. 该操作不修改 `spots`.
pub fn measure_spot_intensity(
    frame: ArrayView3<'_, f32>,
    spots: &SpotAttributes,
    measurement: Measurement,
    radius_is_gyration: bool,
) -> Array1<f32> {
    spots
        .iter()
        .map(|spot| measure_spot(frame.view(), spot, measurement, radius_is_gyration))
        .collect()
}

/// 计算 `spots` 中每个 spot 在形状为 `frame` 的帧中的包围盒.
pub fn spot_bounding_boxes(
    frame: ArrayView3<'_, f32>,
    spots: &SpotAttributes,
    radius_is_gyration: bool,
) -> Vec<BoundingBox> {
    let shape = frame.dim();
    spots
        .iter()
        .map(|spot| BoundingBox::around(spot, shape, radius_is_gyration))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spots::Spot;
    use ndarray::{arr3, Array3};

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_reduce() {
        let region = arr3(&[[[1.0f32, 5.0], [3.0, 2.0]]]);
        let v = region.view();
        assert_eq!(Measurement::Max.reduce(v), 5.0);
        assert_eq!(Measurement::Min.reduce(v), 1.0);
        assert!(f32_eq(Measurement::Mean.reduce(v), 2.75));
        assert_eq!(Measurement::Sum.reduce(v), 11.0);
        assert!(f32_eq(Measurement::Median.reduce(v), 2.5));

        let odd = arr3(&[[[4.0f32, -1.0, 9.0]]]);
        assert_eq!(Measurement::Median.reduce(odd.view()), 4.0);
    }

    #[test]
    fn test_reduce_empty_region() {
        let empty = Array3::<f32>::zeros((1, 0, 3));
        assert_eq!(Measurement::Max.reduce(empty.view()), FILL_VALUE);
        assert_eq!(Measurement::Median.reduce(empty.view()), FILL_VALUE);
    }

    #[test]
    fn test_max_min_skip_nan() {
        let region = arr3(&[[[f32::NAN, 2.0], [-4.0, f32::NAN]]]);
        assert_eq!(Measurement::Max.reduce(region.view()), 2.0);
        assert_eq!(Measurement::Min.reduce(region.view()), -4.0);

        let all_nan = Array3::from_elem((1, 2, 2), f32::NAN);
        assert_eq!(Measurement::Max.reduce(all_nan.view()), FILL_VALUE);
        assert_eq!(Measurement::Min.reduce(all_nan.view()), FILL_VALUE);
        assert!(Measurement::Sum.reduce(all_nan.view()).is_nan());
    }

    #[test]
    fn test_intensity_aligned_with_rows() {
        let frame = Array3::from_shape_fn((1, 4, 4), |(_, y, x)| (y * 4 + x) as f32);
        let spots = SpotAttributes::new(vec![
            Spot::new_2d(3.0, 3.0, 0.0),
            Spot::new_2d(0.0, 0.0, 0.0),
            Spot::new_2d(1.0, 2.0, 2.0),
            Spot::new_2d(1.0, 40.0, 1.0),
        ])
        .unwrap();
        let out = measure_spot_intensity(frame.view(), &spots, Measurement::Max, false);
        assert_eq!(out.to_vec(), vec![15.0, 0.0, 11.0, FILL_VALUE]);

        let boxes = spot_bounding_boxes(frame.view(), &spots, false);
        assert_eq!(boxes.len(), 4);
        assert_eq!(boxes[2].y, 0..3);
        assert_eq!(boxes[2].x, 1..4);
        assert!(boxes[3].is_empty());
    }
}
