#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 在多轮次 (round)、多通道 (channel) 的 3D 显微图像栈中定位点状特征 (spot),
//! 并测量每个 spot 在所有采集帧上的强度, 输出 `(feature, channel, round)`
//! 三维强度张量 [`IntensityTable`], 供下游解码使用.
//!
//! # 注意
//!
//! 1. spot 检测算法本身 (高斯/拉普拉斯 blob 检测等) 不在本 crate 范围内,
//!   由调用者通过 [`SpotFinder`] 提供.
//! 2. 强度到基因的解码不在本 crate 范围内.
//! 3. 所有 3D 帧均按照 `(z, y, x)` 组织; 图像栈按照 `(round, ch, z, y, x)` 组织.
//!
//! # 流水线
//!
//! ### 包围盒采样 ✅
//!
//! 以 spot 中心和半径计算裁剪后的轴对齐包围盒, 并以 [`Measurement`] 归约为标量.
//!
//! 实现位于 `spot-berry/src/spots/bbox.rs`.
//!
//! ### 单帧强度提取 ✅
//!
//! 对一个 3D 帧上的所有 spot 应用包围盒采样.
//!
//! 实现位于 `spot-berry/src/spots/measure.rs`.
//!
//! ### 强度张量组装 ✅
//!
//! 参考图像模式下, 同一组 spot 在每个 `(channel, round)` 帧上测量一次.
//!
//! 实现位于 `spot-berry/src/intensity/assemble.rs`.
//!
//! ### 逐帧合并 ✅
//!
//! 独立检测模式下, 将每帧各自检测到的 spot 拼接成一个张量. 不做跨帧匹配.
//!
//! 实现位于 `spot-berry/src/intensity/merge.rs`.
//!
//! ### 调度 ✅
//!
//! 在两种检测策略间选择, 并在最后附加物理坐标.
//!
//! 实现位于 `spot-berry/src/detect.rs`.

/// 三维索引 / 形状, 按 `(z, y, x)` 顺序.
pub type Idx3d = (usize, usize, usize);

/// 五维形状, 按 `(round, ch, z, y, x)` 顺序.
pub type Shape5d = (usize, usize, usize, usize, usize);

pub mod config;
pub mod consts;
pub mod detect;
mod error;
pub mod intensity;
pub mod prelude;
pub mod spots;
pub mod stack;

pub use config::DetectConfig;
pub use consts::Axes;
pub use detect::detect_spots;
pub use error::{DetectError, DetectResult, FinderError};
pub use intensity::{FeatureAttributes, IntensityTable, PhysicalCoord};
pub use spots::{Measurement, Spot, SpotAttributes, SpotFinder};
pub use stack::{FrameKey, FrameSource, ImageStack, PhysicalExtent};
