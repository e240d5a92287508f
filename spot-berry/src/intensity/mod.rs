//! `(feature, channel, round)` 强度张量.

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{Axes, FILL_VALUE};
use crate::spots::{Spot, SpotAttributes};

mod assemble;
mod merge;

pub use assemble::measure_spot_intensities;
pub use merge::concatenate_spot_attributes_to_intensities;

/// 每个 feature 携带的、不随通道/轮次变化的属性.
///
/// 与 [`Spot`] 相比, 不包含只在单帧内有意义的编号和强度.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureAttributes {
    /// z 坐标 (像素). 原 spot 没有 z 坐标时为 0.
    pub z: f64,

    /// y 坐标 (像素).
    pub y: f64,

    /// x 坐标 (像素).
    pub x: f64,

    /// 半径.
    pub radius: f64,

    /// 检测置信度.
    pub quality: f64,
}

impl From<&Spot> for FeatureAttributes {
    #[inline]
    fn from(spot: &Spot) -> Self {
        Self {
            z: spot.z_or_zero(),
            y: spot.y,
            x: spot.x,
            radius: spot.radius,
            quality: spot.quality,
        }
    }
}

/// feature 的物理坐标.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicalCoord {
    /// z 方向物理坐标.
    pub zc: f64,

    /// y 方向物理坐标.
    pub yc: f64,

    /// x 方向物理坐标.
    pub xc: f64,
}

/// 强度张量, 形状为 `(feature, ch, round)`.
///
/// 通道和轮次通过 **标签** 访问; 标签总是升序排列且不重复.
/// feature 个数为 0 的张量是合法的 (代表没有检测到 spot).
///
/// 反序列化时会重新检查上述约束, 以及数据形状与 feature 个数、
/// 物理坐标个数的一致性.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IntensityTable {
    data: Array3<f32>,
    ch_labels: Vec<usize>,
    round_labels: Vec<usize>,
    features: Vec<FeatureAttributes>,
    physical: Option<Vec<PhysicalCoord>>,
}

/// 排序并去重.
fn normalize_labels<I: IntoIterator<Item = usize>>(labels: I) -> Vec<usize> {
    let mut v: Vec<usize> = labels.into_iter().collect();
    v.sort_unstable();
    v.dedup();
    v
}

impl IntensityTable {
    /// 创建以 [`FILL_VALUE`] 填充的张量. 每个 spot 对应一个 feature.
    ///
    /// `round_labels` 和 `ch_labels` 会被排序并去重.
    pub fn zeros<R, C>(spots: &SpotAttributes, round_labels: R, ch_labels: C) -> Self
    where
        R: IntoIterator<Item = usize>,
        C: IntoIterator<Item = usize>,
    {
        Self::from_features(
            spots.iter().map(FeatureAttributes::from).collect(),
            round_labels,
            ch_labels,
        )
    }

    /// 与 [`Self::zeros`] 相同, 但直接以 feature 属性创建.
    pub fn from_features<R, C>(
        features: Vec<FeatureAttributes>,
        round_labels: R,
        ch_labels: C,
    ) -> Self
    where
        R: IntoIterator<Item = usize>,
        C: IntoIterator<Item = usize>,
    {
        let ch_labels = normalize_labels(ch_labels);
        let round_labels = normalize_labels(round_labels);
        let data = Array3::from_elem(
            (features.len(), ch_labels.len(), round_labels.len()),
            FILL_VALUE,
        );
        Self {
            data,
            ch_labels,
            round_labels,
            features,
            physical: None,
        }
    }

    /// 张量形状 `(feature, ch, round)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// feature 个数.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// 是否没有任何 feature?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 获取 `axis` 的标签. 只支持 `Axes::Ch` 和 `Axes::Round`, 其他轴返回空切片.
    #[inline]
    pub fn labels(&self, axis: Axes) -> &[usize] {
        match axis {
            Axes::Ch => &self.ch_labels,
            Axes::Round => &self.round_labels,
            _ => &[],
        }
    }

    /// 通道标签 `ch` 在张量中的位置.
    #[inline]
    pub fn ch_index(&self, ch: usize) -> Option<usize> {
        self.ch_labels.binary_search(&ch).ok()
    }

    /// 轮次标签 `round` 在张量中的位置.
    #[inline]
    pub fn round_index(&self, round: usize) -> Option<usize> {
        self.round_labels.binary_search(&round).ok()
    }

    /// 获取 `(feature, ch, round)` 处的强度. `ch` 和 `round` 为标签.
    ///
    /// 任一索引不存在时返回 `None`.
    pub fn get(&self, feature: usize, ch: usize, round: usize) -> Option<f32> {
        let (c, r) = (self.ch_index(ch)?, self.round_index(round)?);
        self.data.get((feature, c, r)).copied()
    }

    /// 获取 `(*, ch, round)` 处的强度列. 标签不存在时返回 `None`.
    pub fn column(&self, ch: usize, round: usize) -> Option<ArrayView1<'_, f32>> {
        let (c, r) = (self.ch_index(ch)?, self.round_index(round)?);
        Some(self.data.index_axis(Axis(2), r).index_axis_move(Axis(1), c))
    }

    /// 获取 `(*, ch, round)` 处的可变强度列. 标签不存在时返回 `None`.
    pub(crate) fn column_mut(
        &mut self,
        ch: usize,
        round: usize,
    ) -> Option<ArrayViewMut1<'_, f32>> {
        let (c, r) = (self.ch_index(ch)?, self.round_index(round)?);
        Some(
            self.data
                .index_axis_mut(Axis(2), r)
                .index_axis_move(Axis(1), c),
        )
    }

    /// 获得强度数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层强度数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }

    /// 每个 feature 的属性.
    #[inline]
    pub fn features(&self) -> &[FeatureAttributes] {
        &self.features
    }

    /// 每个 feature 的物理坐标. 尚未附加物理坐标时返回 `None`.
    #[inline]
    pub fn physical_coords(&self) -> Option<&[PhysicalCoord]> {
        self.physical.as_deref()
    }

    /// 附加物理坐标, 与 feature 一一对应.
    ///
    /// `coords` 长度与 feature 个数不一致时程序 panic.
    pub fn set_physical_coords(&mut self, coords: Vec<PhysicalCoord>) {
        assert_eq!(coords.len(), self.n_features(), "物理坐标与 feature 个数不一致");
        self.physical = Some(coords);
    }
}

/// 标签是否严格升序 (即已排序且不重复)?
#[cfg(feature = "serde")]
fn is_normalized(labels: &[usize]) -> bool {
    labels.windows(2).all(|w| w[0] < w[1])
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for IntensityTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Raw {
            data: Array3<f32>,
            ch_labels: Vec<usize>,
            round_labels: Vec<usize>,
            features: Vec<FeatureAttributes>,
            physical: Option<Vec<PhysicalCoord>>,
        }

        let Raw {
            data,
            ch_labels,
            round_labels,
            features,
            physical,
        } = Raw::deserialize(deserializer)?;

        let expected = (features.len(), ch_labels.len(), round_labels.len());
        if data.dim() != expected {
            return Err(D::Error::custom(format!(
                "intensity data has shape {:?}, expected {expected:?}",
                data.dim()
            )));
        }
        for (axis, labels) in [(Axes::Ch, &ch_labels), (Axes::Round, &round_labels)] {
            if !is_normalized(labels) {
                return Err(D::Error::custom(format!(
                    "axis `{axis}` labels {labels:?} are not strictly increasing"
                )));
            }
        }
        if let Some(coords) = &physical {
            if coords.len() != features.len() {
                return Err(D::Error::custom(format!(
                    "{} physical coordinates for {} features",
                    coords.len(),
                    features.len()
                )));
            }
        }

        Ok(Self {
            data,
            ch_labels,
            round_labels,
            features,
            physical,
        })
    }
}
