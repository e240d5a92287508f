//! 多轮次、多通道 3D 图像栈.
//!
//! 图像栈按照 `(round, ch, z, y, x)` 组织, 每个 `(ch, round)` 对应一个 3D 帧.
//! 流水线只通过 [`FrameSource`] 只读地访问图像栈.

use std::num::NonZeroUsize;
use std::ops::Index;

use itertools::iproduct;
use ndarray::{s, Array3, Array5, ArrayView3, ArrayView5, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::Axes;
use crate::error::{DetectError, DetectResult};
use crate::{Idx3d, Shape5d};

mod npy;
mod physical;
mod project;

pub use physical::{transfer_physical_coords, PhysicalExtent};

/// 帧索引, 唯一确定图像栈中的一个 3D 帧.
///
/// 排序时先比较 `round` 再比较 `ch`, 这也是帧的规范枚举顺序.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameKey {
    /// 轮次标签.
    pub round: usize,

    /// 通道标签.
    pub ch: usize,
}

impl FrameKey {
    /// 以通道 `ch` 和轮次 `round` 创建帧索引.
    #[inline]
    pub const fn new(ch: usize, round: usize) -> Self {
        Self { round, ch }
    }
}

impl std::fmt::Display for FrameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(c={}, r={})", self.ch, self.round)
    }
}

/// 流水线对图像栈的只读访问接口.
pub trait FrameSource {
    /// 获取 `axis` 轴上的所有标签, 升序排列.
    fn axis_labels(&self, axis: Axes) -> Vec<usize>;

    /// 获取 `key` 对应的 3D 帧视图, 形状为 `(z, y, x)`.
    ///
    /// 如果 `key` 超出范围则返回 `Err(DetectError::FrameOutOfRange)`.
    fn get_slice(&self, key: FrameKey) -> DetectResult<ArrayView3<'_, f32>>;

    /// 单个 3D 帧的形状.
    fn frame_shape(&self) -> Idx3d;

    /// 空间轴的物理范围.
    fn physical_extent(&self) -> PhysicalExtent;

    /// 按规范顺序 (先 round 后 ch) 枚举所有帧索引.
    fn frame_keys(&self) -> Vec<FrameKey> {
        iproduct!(self.axis_labels(Axes::Round), self.axis_labels(Axes::Ch))
            .map(|(round, ch)| FrameKey::new(ch, round))
            .collect()
    }
}

/// 五维 `f32` 图像栈及其物理范围.
#[derive(Clone, Debug)]
pub struct ImageStack {
    data: Array5<f32>,
    extent: PhysicalExtent,
}

impl ImageStack {
    /// 直接创建图像栈. `data` 按照 `(round, ch, z, y, x)` 组织.
    #[inline]
    pub fn new(data: Array5<f32>, extent: PhysicalExtent) -> Self {
        Self { data, extent }
    }

    /// 从数组创建图像栈, 物理坐标与像素坐标一致.
    pub fn from_array(data: Array5<f32>) -> Self {
        let (_, _, z, y, x) = data.dim();
        Self {
            extent: PhysicalExtent::pixels((z, y, x)),
            data,
        }
    }

    /// 由 `n_round * n_ch` 个 3D 帧拼接图像栈. `frames` 按规范顺序 (先 round 后 ch) 排列.
    ///
    /// 帧个数不对或帧形状不一致时返回 `Err(DetectError::ShapeMismatch)`.
    pub fn from_frames(n_round: usize, n_ch: usize, frames: &[Array3<f32>]) -> DetectResult<Self> {
        if frames.len() != n_round * n_ch {
            return Err(DetectError::ShapeMismatch {
                expected: vec![n_round * n_ch],
                found: vec![frames.len()],
            });
        }
        let (z, y, x) = frames.first().map_or((0, 0, 0), |f| f.dim());
        let mut data = Array5::<f32>::zeros((n_round, n_ch, z, y, x));
        for ((round, ch), src) in iproduct!(0..n_round, 0..n_ch).zip(frames.iter()) {
            if src.dim() != (z, y, x) {
                return Err(DetectError::ShapeMismatch {
                    expected: vec![z, y, x],
                    found: src.shape().to_vec(),
                });
            }
            data.slice_mut(s![round, ch, .., .., ..]).assign(src);
        }
        Ok(Self::from_array(data))
    }

    /// 图像栈形状 `(round, ch, z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Shape5d {
        self.data.dim()
    }

    /// `axis` 轴的长度.
    #[inline]
    pub fn len_of(&self, axis: Axes) -> usize {
        self.data.len_of(Axis(axis.index()))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView5<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array5<f32> {
        self.data
    }

    /// 对每个帧并行地实施 `op`, 返回 `(结果, 帧索引)` 列表.
    ///
    /// 分组键为 `{round, ch}`. 结果总是按规范顺序排列, 与完成顺序无关.
    /// 任一帧返回 `Err` 时整体返回该错误.
    pub fn transform_frames<T, F>(
        &self,
        op: F,
        workers: NonZeroUsize,
    ) -> DetectResult<Vec<(T, FrameKey)>>
    where
        T: Send,
        F: Fn(ArrayView3<'_, f32>) -> DetectResult<T> + Sync + Send,
    {
        let keys = self.frame_keys();
        log::debug!(
            "transforming {} frames with {} workers",
            keys.len(),
            workers.get()
        );
        let apply = |key: FrameKey| -> DetectResult<(T, FrameKey)> {
            log::trace!("frame {key}");
            Ok((op(self.get_slice(key)?)?, key))
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                use rayon::iter::{IntoParallelIterator, ParallelIterator};

                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers.get())
                    .build()?;
                // `collect` 保持索引顺序.
                pool.install(|| keys.into_par_iter().map(apply).collect())
            } else {
                keys.into_iter().map(apply).collect()
            }
        }
    }
}

impl Index<(usize, usize, usize, usize, usize)> for ImageStack {
    type Output = f32;

    #[inline]
    fn index(&self, index: (usize, usize, usize, usize, usize)) -> &Self::Output {
        &self.data[index]
    }
}

impl FrameSource for ImageStack {
    #[inline]
    fn axis_labels(&self, axis: Axes) -> Vec<usize> {
        (0..self.len_of(axis)).collect()
    }

    fn get_slice(&self, key: FrameKey) -> DetectResult<ArrayView3<'_, f32>> {
        let (n_round, n_ch, ..) = self.shape();
        if key.round >= n_round || key.ch >= n_ch {
            return Err(DetectError::FrameOutOfRange(key));
        }
        Ok(self.data.slice(s![key.round, key.ch, .., .., ..]))
    }

    #[inline]
    fn frame_shape(&self) -> Idx3d {
        let (_, _, z, y, x) = self.shape();
        (z, y, x)
    }

    #[inline]
    fn physical_extent(&self) -> PhysicalExtent {
        self.extent
    }
}
