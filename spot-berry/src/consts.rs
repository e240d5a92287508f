//! 通用常量.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 强度张量的中性填充值. 未被测量 (或无定义) 的单元格保持该值.
pub const FILL_VALUE: f32 = 0.0;

/// 图像栈的五个轴. 图像栈数据按照 [`Axes::ALL`] 的顺序存储.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axes {
    /// 成像轮次.
    Round,

    /// 通道.
    Ch,

    /// 空间方向 (相邻 2D 平面的方向).
    Z,

    /// 自然图像的垂直方向.
    Y,

    /// 自然图像的水平方向.
    X,
}

impl Axes {
    /// 全部轴, 按存储顺序排列.
    pub const ALL: [Axes; 5] = [Axes::Round, Axes::Ch, Axes::Z, Axes::Y, Axes::X];

    /// 该轴在五维图像栈中的位置.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            Axes::Round => 0,
            Axes::Ch => 1,
            Axes::Z => 2,
            Axes::Y => 3,
            Axes::X => 4,
        }
    }

    /// 轴的短名称, 用于日志与错误信息.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Axes::Round => "r",
            Axes::Ch => "c",
            Axes::Z => "z",
            Axes::Y => "y",
            Axes::X => "x",
        }
    }
}

impl std::fmt::Display for Axes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
