//! spot 属性表, 检测函数接口与包围盒强度测量.

use std::ops::Index;

use ndarray::ArrayView3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult, FinderError};

mod bbox;
mod measure;

pub use bbox::{measure_spot, BoundingBox};
pub use measure::{measure_spot_intensity, spot_bounding_boxes, Measurement};

/// 单个 spot. 坐标以像素为单位, 可以是亚像素值.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spot {
    /// z 坐标. 2D 数据没有该坐标, 此时视为第 0 层.
    pub z: Option<f64>,

    /// y 坐标.
    pub y: f64,

    /// x 坐标.
    pub x: f64,

    /// 半径, 非负.
    pub radius: f64,

    /// 检测置信度.
    pub quality: f64,

    /// 逐帧检测时的 spot 编号. 只在单个帧内有意义.
    pub spot_id: Option<usize>,

    /// 逐帧检测时已测得的强度. 只在单个帧内有意义.
    pub intensity: Option<f32>,
}

impl Spot {
    /// 以 `(z, y, x)` 坐标和半径创建 spot, 其余字段为默认值.
    #[inline]
    pub fn new_3d(z: f64, y: f64, x: f64, radius: f64) -> Self {
        Self {
            z: Some(z),
            y,
            x,
            radius,
            ..Default::default()
        }
    }

    /// 以 `(y, x)` 坐标和半径创建不含 z 坐标的 spot.
    #[inline]
    pub fn new_2d(y: f64, x: f64, radius: f64) -> Self {
        Self {
            y,
            x,
            radius,
            ..Default::default()
        }
    }

    /// 设置检测置信度.
    #[inline]
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// 设置逐帧检测时已测得的强度.
    #[inline]
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// 设置逐帧检测时的编号.
    #[inline]
    pub fn with_spot_id(mut self, spot_id: usize) -> Self {
        self.spot_id = Some(spot_id);
        self
    }

    /// z 坐标; 不存在时为 0.
    #[inline]
    pub fn z_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// 中心坐标, 按 `(z, y, x)` 顺序.
    #[inline]
    pub fn center(&self) -> [f64; 3] {
        [self.z_or_zero(), self.y, self.x]
    }

    fn check(&self) -> Result<(), &'static str> {
        if !self.center().iter().all(|c| c.is_finite()) {
            Err("coordinates must be finite")
        } else if !self.radius.is_finite() {
            Err("radius must be finite")
        } else if self.radius < 0.0 {
            Err("radius must be non-negative")
        } else {
            Ok(())
        }
    }
}

/// spot 属性表, 每行一个 spot.
///
/// 构造时会检查每个 spot 的坐标和半径, 因此表内的 spot 总是合法的.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpotAttributes {
    data: Vec<Spot>,
}

impl SpotAttributes {
    /// 由 spot 列表创建属性表.
    ///
    /// 若任一 spot 坐标不是有限值, 或半径为负/非有限值, 则返回
    /// `Err(DetectError::InvalidSpot)`.
    pub fn new(data: Vec<Spot>) -> DetectResult<Self> {
        for (row, spot) in data.iter().enumerate() {
            spot.check()
                .map_err(|reason| DetectError::InvalidSpot { row, reason })?;
        }
        Ok(Self { data })
    }

    /// 空表.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// 获得 spot 个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 按行迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Spot> {
        self.data.iter()
    }

    /// 以切片形式获得全部行.
    #[inline]
    pub fn as_slice(&self) -> &[Spot] {
        &self.data
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Vec<Spot> {
        self.data
    }
}

impl Index<usize> for SpotAttributes {
    type Output = Spot;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a SpotAttributes {
    type Item = &'a Spot;
    type IntoIter = std::slice::Iter<'a, Spot>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SpotAttributes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            data: Vec<Spot>,
        }

        let Raw { data } = Raw::deserialize(deserializer)?;
        Self::new(data).map_err(serde::de::Error::custom)
    }
}

/// spot 检测函数.
///
/// 输入为一个 `(z, y, x)` 体数据, 输出检测到的 spot. 检测参数由实现者自身携带.
/// 对相同输入, 实现应当给出相同输出, 以保证流水线可复现.
pub trait SpotFinder: Sync {
    /// 在 `image` 中检测 spot.
    fn find(&self, image: ArrayView3<'_, f32>) -> Result<SpotAttributes, FinderError>;
}

impl<F> SpotFinder for F
where
    F: Fn(ArrayView3<'_, f32>) -> Result<SpotAttributes, FinderError> + Sync,
{
    #[inline]
    fn find(&self, image: ArrayView3<'_, f32>) -> Result<SpotAttributes, FinderError> {
        self(image)
    }
}
