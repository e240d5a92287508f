//! 参考图像模式下的强度张量组装.

use itertools::iproduct;

use super::IntensityTable;
use crate::consts::Axes;
use crate::error::DetectResult;
use crate::spots::{measure_spot_intensity, Measurement, SpotAttributes};
use crate::stack::{FrameKey, FrameSource};

/// 在 `stack` 的每个 `(ch, round)` 帧上测量 `spots` 中每个 spot 的强度.
///
/// 张量的通道/轮次标签取自 `stack`. 若 `spots` 为空, 则直接返回空张量,
/// 不会读取任何帧. 张量在本地组装完毕后才返回, 因此调用者看不到部分写入的状态;
/// 任一帧读取失败时整体返回该错误.
pub fn measure_spot_intensities<S: FrameSource + ?Sized>(
    stack: &S,
    spots: &SpotAttributes,
    measurement: Measurement,
    radius_is_gyration: bool,
) -> DetectResult<IntensityTable> {
    let ch_labels = stack.axis_labels(Axes::Ch);
    let round_labels = stack.axis_labels(Axes::Round);

    let mut table = IntensityTable::zeros(
        spots,
        round_labels.iter().copied(),
        ch_labels.iter().copied(),
    );
    if table.is_empty() {
        log::debug!("no spots to measure, skipping all frames");
        return Ok(table);
    }

    log::debug!(
        "measuring {} spots across {} channels x {} rounds",
        spots.len(),
        ch_labels.len(),
        round_labels.len()
    );
    // 各帧写入互不相交的列, 迭代顺序不影响结果.
    for (&ch, &round) in iproduct!(ch_labels.iter(), round_labels.iter()) {
        let frame = stack.get_slice(FrameKey::new(ch, round))?;
        let intensities = measure_spot_intensity(frame, spots, measurement, radius_is_gyration);
        // 标签取自 `stack`, 列必定存在.
        if let Some(mut column) = table.column_mut(ch, round) {
            column.assign(&intensities);
        }
    }
    Ok(table)
}
