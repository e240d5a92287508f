//! 独立检测模式下的逐帧合并.

use super::{FeatureAttributes, IntensityTable};
use crate::error::{DetectError, DetectResult};
use crate::spots::SpotAttributes;
use crate::stack::FrameKey;

/// 将逐帧检测得到的 spot 表合并为一个强度张量, 不跨通道/轮次合并 spot.
///
/// 通道/轮次标签为所有 `frames` 中出现过的值的并集 (升序; 没有 spot 的帧也计入).
/// feature 按 `frames` 的顺序依次拼接编号, 不做去重或空间匹配:
/// 在两个帧中各自检测到的同一位置的 spot 是两个 feature.
/// 每个 feature 只在其来源帧对应的单元格写入强度, 其余单元格保持填充值.
///
/// 任一 spot 没有强度时返回 `Err(DetectError::MissingIntensity)`.
pub fn concatenate_spot_attributes_to_intensities(
    frames: &[(SpotAttributes, FrameKey)],
) -> DetectResult<IntensityTable> {
    let features: Vec<FeatureAttributes> = frames
        .iter()
        .flat_map(|(spots, _)| spots.iter().map(FeatureAttributes::from))
        .collect();

    let mut table = IntensityTable::from_features(
        features,
        frames.iter().map(|(_, key)| key.round),
        frames.iter().map(|(_, key)| key.ch),
    );
    log::debug!(
        "merging {} frames into {} features",
        frames.len(),
        table.n_features()
    );

    let mut feature = 0usize;
    for (spots, key) in frames {
        // 标签为全部帧索引的并集, 一定存在.
        let c = table.ch_index(key.ch).unwrap_or_default();
        let r = table.round_index(key.round).unwrap_or_default();
        for (row, spot) in spots.iter().enumerate() {
            let intensity = spot
                .intensity
                .ok_or(DetectError::MissingIntensity { frame: *key, row })?;
            table.data[(feature, c, r)] = intensity;
            feature += 1;
        }
    }
    debug_assert_eq!(feature, table.n_features());
    Ok(table)
}
