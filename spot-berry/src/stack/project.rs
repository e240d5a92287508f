//! 最大值投影.

use ndarray::{ArrayView3, Axis};

use super::ImageStack;
use crate::consts::Axes;
use crate::error::{DetectError, DetectResult};

impl ImageStack {
    /// 沿 `axes` 中的每个轴做最大值投影.
    ///
    /// 被投影的轴保留, 但长度变为 1, 因此结果仍是五维图像栈. 物理范围不变.
    /// 重复的轴只投影一次. 长度为 0 的轴投影后长度为 1, 值为 `f32::NEG_INFINITY`.
    pub fn max_proj(&self, axes: &[Axes]) -> ImageStack {
        let mut data = self.data.clone();
        for axis in Axes::ALL.into_iter().filter(|a| axes.contains(a)) {
            let ax = Axis(axis.index());
            data = data
                .fold_axis(ax, f32::NEG_INFINITY, |&acc, &v| acc.max(v))
                .insert_axis(ax);
        }
        ImageStack::new(data, self.extent)
    }

    /// 将 round 和 ch 轴均为 1 的图像栈压缩为单个 `(z, y, x)` 体数据.
    ///
    /// 若 round 或 ch 轴长度不为 1, 则返回 `Err(DetectError::ReferenceNotVolume)`.
    pub fn squeezed_volume(&self) -> DetectResult<ArrayView3<'_, f32>> {
        for axis in [Axes::Round, Axes::Ch] {
            let len = self.len_of(axis);
            if len != 1 {
                return Err(DetectError::ReferenceNotVolume { axis, len });
            }
        }
        Ok(self.data.index_axis(Axis(0), 0).index_axis_move(Axis(0), 0))
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::Axes;
    use crate::error::DetectError;
    use crate::ImageStack;
    use ndarray::Array5;

    /// `(2, 3, 1, 2, 2)`, 体素值为 `r * 100 + c * 10 + y * 2 + x`.
    fn ramp_stack() -> ImageStack {
        let data = Array5::from_shape_fn((2, 3, 1, 2, 2), |(r, c, _, y, x)| {
            (r * 100 + c * 10 + y * 2 + x) as f32
        });
        ImageStack::from_array(data)
    }

    #[test]
    fn test_max_proj_round_ch() {
        let stack = ramp_stack();
        let proj = stack.max_proj(&[Axes::Round, Axes::Ch]);
        assert_eq!(proj.shape(), (1, 1, 1, 2, 2));
        let vol = proj.squeezed_volume().unwrap();
        assert_eq!(vol.dim(), (1, 2, 2));
        assert_eq!(vol[(0, 0, 0)], 120.0);
        assert_eq!(vol[(0, 1, 1)], 123.0);
    }

    #[test]
    fn test_max_proj_spatial_axis_keeps_volume_rank() {
        let stack = ramp_stack();
        let proj = stack.max_proj(&[Axes::Round, Axes::Ch, Axes::Y]);
        assert_eq!(proj.shape(), (1, 1, 1, 1, 2));
        let vol = proj.squeezed_volume().unwrap();
        assert_eq!(vol[(0, 0, 0)], 122.0);
        assert_eq!(vol[(0, 0, 1)], 123.0);
    }

    #[test]
    fn test_squeeze_requires_single_frame() {
        let stack = ramp_stack();
        let err = stack.max_proj(&[Axes::Ch]).squeezed_volume().unwrap_err();
        assert!(matches!(
            err,
            DetectError::ReferenceNotVolume {
                axis: Axes::Round,
                len: 2
            }
        ));
        let err = stack.max_proj(&[Axes::Round]).squeezed_volume().unwrap_err();
        assert!(matches!(
            err,
            DetectError::ReferenceNotVolume {
                axis: Axes::Ch,
                len: 3
            }
        ));
    }

    #[test]
    fn test_max_proj_without_axes_is_identity() {
        let stack = ramp_stack();
        assert_eq!(stack.max_proj(&[]).data(), stack.data());
    }
}
