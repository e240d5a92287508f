//! 检测流水线配置.

use std::num::NonZeroUsize;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::Axes;
use crate::spots::Measurement;

/// 获得可并行核心数.
///
/// 优先使用标准库给出的可用并行度, 失败时退回 `num_cpus`. 结果至少为 1.
pub fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or_else(|_| {
        NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
    })
}

/// [`crate::detect_spots`] 的参数.
///
/// 是否使用参考图像不在配置中体现, 而是由调用时是否传入参考图像决定.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectConfig {
    /// 参考图像在检测前需要最大值投影的轴. `None` 代表直接使用参考图像.
    pub reference_max_projection_axes: Option<Vec<Axes>>,

    /// 包围盒内强度的归约方式. 默认为 [`Measurement::Max`].
    pub measurement: Measurement,

    /// 若为 `true`, 则半径被视为回转半径 (radius of gyration),
    /// 包围盒半径向上取整并额外扩张一个单位; 否则向零截断.
    pub radius_is_gyration: bool,

    /// 独立检测模式下的工作线程数. `None` 代表使用 [`default_workers`].
    pub n_workers: Option<NonZeroUsize>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            reference_max_projection_axes: None,
            measurement: Measurement::Max,
            radius_is_gyration: false,
            n_workers: None,
        }
    }
}

impl DetectConfig {
    /// 指定参考图像需要最大值投影的轴.
    #[inline]
    pub fn with_projection<I: IntoIterator<Item = Axes>>(mut self, axes: I) -> Self {
        self.reference_max_projection_axes = Some(axes.into_iter().collect());
        self
    }

    /// 指定强度归约方式.
    #[inline]
    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = measurement;
        self
    }

    /// 指定半径是否为回转半径.
    #[inline]
    pub fn with_radius_is_gyration(mut self, radius_is_gyration: bool) -> Self {
        self.radius_is_gyration = radius_is_gyration;
        self
    }

    /// 指定工作线程数.
    #[inline]
    pub fn with_workers(mut self, n_workers: NonZeroUsize) -> Self {
        self.n_workers = Some(n_workers);
        self
    }

    /// 实际使用的工作线程数.
    #[inline]
    pub fn workers(&self) -> NonZeroUsize {
        self.n_workers.unwrap_or_else(default_workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = DetectConfig::default();
        assert_eq!(cfg.measurement, Measurement::Max);
        assert!(!cfg.radius_is_gyration);
        assert!(cfg.reference_max_projection_axes.is_none());
        assert_eq!(cfg.workers(), default_workers());
    }

    #[test]
    fn test_builder() {
        let two = NonZeroUsize::new(2).unwrap();
        let cfg = DetectConfig::default()
            .with_projection([Axes::Round, Axes::Ch])
            .with_measurement(Measurement::Mean)
            .with_radius_is_gyration(true)
            .with_workers(two);
        assert_eq!(
            cfg.reference_max_projection_axes.as_deref(),
            Some([Axes::Round, Axes::Ch].as_slice())
        );
        assert_eq!(cfg.measurement, Measurement::Mean);
        assert!(cfg.radius_is_gyration);
        assert_eq!(cfg.workers(), two);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_partial_json() {
        let cfg: DetectConfig =
            serde_json::from_str(r#"{ "radius_is_gyration": true, "n_workers": 3 }"#).unwrap();
        assert!(cfg.radius_is_gyration);
        assert_eq!(cfg.workers().get(), 3);
        assert_eq!(cfg.measurement, Measurement::Max);
    }
}
