//! 像素坐标到物理坐标的转换.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::FrameSource;
use crate::consts::Axes;
use crate::intensity::{IntensityTable, PhysicalCoord};
use crate::Idx3d;

/// 三个空间轴的物理范围 `[min, max]`, 单位由采集设备决定 (一般为微米).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicalExtent {
    /// z 方向范围.
    pub z: (f64, f64),

    /// y 方向范围.
    pub y: (f64, f64),

    /// x 方向范围.
    pub x: (f64, f64),
}

impl PhysicalExtent {
    /// 物理坐标与像素坐标一致的范围, 即每个轴为 `[0, len]`.
    pub fn pixels((z, y, x): Idx3d) -> Self {
        Self {
            z: (0.0, z as f64),
            y: (0.0, y as f64),
            x: (0.0, x as f64),
        }
    }

    /// 获取空间轴 `axis` 的范围. 非空间轴返回 `None`.
    #[inline]
    pub fn range(&self, axis: Axes) -> Option<(f64, f64)> {
        match axis {
            Axes::Z => Some(self.z),
            Axes::Y => Some(self.y),
            Axes::X => Some(self.x),
            Axes::Round | Axes::Ch => None,
        }
    }

    /// 空间轴 `axis` 上单个像素的物理尺寸. 该轴共有 `len` 个像素.
    ///
    /// `len` 为 0 时返回 `Some(0.0)`; 非空间轴返回 `None`.
    #[inline]
    pub fn pixel_size(&self, axis: Axes, len: usize) -> Option<f64> {
        self.range(axis).map(|range| pixel_size(range, len))
    }

    /// 将 `axis` 轴上的像素坐标 `pixel` 转换为物理坐标. 非空间轴返回 `None`.
    #[inline]
    pub fn to_physical(&self, axis: Axes, pixel: f64, len: usize) -> Option<f64> {
        self.range(axis).map(|range| to_physical(range, pixel, len))
    }

    /// 将 `(z, y, x)` 像素坐标转换为物理坐标. 帧形状为 `shape`.
    pub fn to_physical_zyx(&self, [z, y, x]: [f64; 3], (lz, ly, lx): Idx3d) -> [f64; 3] {
        [
            to_physical(self.z, z, lz),
            to_physical(self.y, y, ly),
            to_physical(self.x, x, lx),
        ]
    }
}

#[inline]
fn pixel_size((lo, hi): (f64, f64), len: usize) -> f64 {
    if len == 0 {
        0.0
    } else {
        (hi - lo) / len as f64
    }
}

#[inline]
fn to_physical(range: (f64, f64), pixel: f64, len: usize) -> f64 {
    range.0 + pixel * pixel_size(range, len)
}

/// 根据 `stack` 的物理范围, 给 `table` 中每个 feature 附加物理坐标.
///
/// 该操作会覆盖之前附加的物理坐标.
pub fn transfer_physical_coords<S: FrameSource + ?Sized>(stack: &S, table: &mut IntensityTable) {
    let extent = stack.physical_extent();
    let shape = stack.frame_shape();
    let coords = table
        .features()
        .iter()
        .map(|f| {
            let [zc, yc, xc] = extent.to_physical_zyx([f.z, f.y, f.x], shape);
            PhysicalCoord { zc, yc, xc }
        })
        .collect();
    table.set_physical_coords(coords);
}
