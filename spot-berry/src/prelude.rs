//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Shape5d};

pub use crate::config::DetectConfig;
pub use crate::consts::{Axes, FILL_VALUE};
pub use crate::detect::detect_spots;
pub use crate::error::{DetectError, DetectResult, FinderError};

pub use crate::intensity::{
    concatenate_spot_attributes_to_intensities, measure_spot_intensities, IntensityTable,
};
pub use crate::spots::{measure_spot_intensity, Measurement, Spot, SpotAttributes, SpotFinder};
pub use crate::stack::{FrameKey, FrameSource, ImageStack, PhysicalExtent};
