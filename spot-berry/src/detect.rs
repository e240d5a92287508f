//! 检测调度.
//!
//! 两种互斥的检测策略, 由是否提供参考图像决定:
//!
//! 1. 参考图像模式: 在 (可选地经过最大值投影的) 参考图像上检测一次 spot,
//!   然后在数据图像栈的每个 `(ch, round)` 帧上测量同一组位置的强度.
//! 2. 独立模式: 在数据图像栈的每个帧上分别检测 spot (并行), 再逐帧合并.
//!   该模式假设实验不是多路复用的, 每个 spot 只在一个 `(ch, round)` 上有强度.
//!
//! 两种模式最后都会附加物理坐标.

use crate::config::DetectConfig;
use crate::consts::Axes;
use crate::error::{DetectError, DetectResult};
use crate::intensity::{
    concatenate_spot_attributes_to_intensities, measure_spot_intensities, IntensityTable,
};
use crate::spots::{SpotAttributes, SpotFinder};
use crate::stack::{transfer_physical_coords, FrameSource, ImageStack};

/// 在 `data_stack` 上运行 `finder`, 得到强度张量.
///
/// 若给出 `reference`, 则使用参考图像模式, 否则使用独立模式. 见模块文档.
///
/// # 错误
///
/// - 参考图像 (投影后) 不是单个 3D 体数据时返回 `Err(DetectError::ReferenceNotVolume)`;
/// - `finder` 的错误原样返回 (`DetectError::Finder`), 不会重试;
/// - 独立模式下 spot 缺少强度时返回 `Err(DetectError::MissingIntensity)`.
///
/// 没有检测到任何 spot 不是错误, 此时返回 feature 个数为 0 的张量.
pub fn detect_spots<F: SpotFinder + ?Sized>(
    data_stack: &ImageStack,
    finder: &F,
    config: &DetectConfig,
    reference: Option<&ImageStack>,
) -> DetectResult<IntensityTable> {
    let mut table = match reference {
        Some(reference) => {
            let spots = find_reference_spots(reference, finder, config)?;
            log::debug!("{} spots found in reference image", spots.len());
            measure_spot_intensities(
                data_stack,
                &spots,
                config.measurement,
                config.radius_is_gyration,
            )?
        }
        None => {
            log::debug!("no reference image, detecting spots in every frame");
            let frames = data_stack
                .transform_frames(|frame| Ok(finder.find(frame)?), config.workers())?;
            let table = concatenate_spot_attributes_to_intensities(&frames)?;
            check_labels(data_stack, &table)?;
            table
        }
    };

    transfer_physical_coords(data_stack, &mut table);
    log::debug!("intensity table shape: {:?}", table.shape());
    Ok(table)
}

/// 在参考图像上检测 spot. 按配置先做最大值投影.
fn find_reference_spots<F: SpotFinder + ?Sized>(
    reference: &ImageStack,
    finder: &F,
    config: &DetectConfig,
) -> DetectResult<SpotAttributes> {
    match &config.reference_max_projection_axes {
        Some(axes) => {
            log::debug!("max-projecting reference image over {axes:?}");
            let projected = reference.max_proj(axes);
            Ok(finder.find(projected.squeezed_volume()?)?)
        }
        None => Ok(finder.find(reference.squeezed_volume()?)?),
    }
}

/// 合并结果的通道/轮次标签必须都由 `stack` 声明.
fn check_labels<S: FrameSource + ?Sized>(stack: &S, table: &IntensityTable) -> DetectResult<()> {
    for axis in [Axes::Ch, Axes::Round] {
        let declared = stack.axis_labels(axis);
        if let Some(&label) = table.labels(axis).iter().find(|l| !declared.contains(l)) {
            return Err(DetectError::AxisMismatch { axis, label });
        }
    }
    Ok(())
}
