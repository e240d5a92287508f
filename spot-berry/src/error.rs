//! 运行时错误.

use thiserror::Error;

use crate::consts::Axes;
use crate::stack::FrameKey;

/// spot 检测函数返回的错误. 流水线不检查其内容, 原样向上传递.
pub type FinderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 检测 / 测量流水线错误.
#[derive(Error, Debug)]
pub enum DetectError {
    /// 参考图像在 (投影后) 仍不是单个 3D 体数据.
    ///
    /// 参数分别代表未被压缩的轴及其长度.
    #[error("reference image is not a single volume: axis `{axis}` has length {len}, expected 1")]
    ReferenceNotVolume {
        /// 长度不为 1 的非空间轴.
        axis: Axes,
        /// 该轴的长度.
        len: usize,
    },

    /// spot 坐标或半径不合法 (非有限值或负半径).
    #[error("spot #{row} is invalid: {reason}")]
    InvalidSpot {
        /// spot 所在行.
        row: usize,
        /// 原因.
        reason: &'static str,
    },

    /// 独立检测模式下, 检测函数没有给出 spot 的强度.
    #[error("spot #{row} detected in frame {frame} carries no intensity")]
    MissingIntensity {
        /// 该 spot 所在帧.
        frame: FrameKey,
        /// spot 在该帧中的行.
        row: usize,
    },

    /// 帧索引超出图像栈范围.
    #[error("frame {0} is out of range")]
    FrameOutOfRange(FrameKey),

    /// 合并结果的标签与图像栈声明的标签不一致.
    #[error("axis `{axis}` label {label} is not declared by the image stack")]
    AxisMismatch {
        /// 出现问题的轴.
        axis: Axes,
        /// 图像栈中不存在的标签.
        label: usize,
    },

    /// 数组形状不一致.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 线程池创建失败.
    #[cfg(feature = "rayon")]
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// spot 检测函数自身的错误.
    #[error(transparent)]
    Finder(#[from] FinderError),

    /// 读取 npy 文件错误.
    #[error("failed to read npy: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// 写入 npy 文件错误.
    #[error("failed to write npy: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 检测 / 测量运行时结果.
pub type DetectResult<T> = Result<T, DetectError>;
