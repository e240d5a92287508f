//! `.npy` 格式图像栈读写.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::Array5;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use super::ImageStack;
use crate::error::DetectResult;

impl ImageStack {
    /// 从 `reader` 读取 `.npy` 格式的五维 `f32` 数组, 按 `(round, ch, z, y, x)` 解释.
    /// 物理坐标与像素坐标一致.
    pub fn read_npy<R: Read>(reader: R) -> DetectResult<Self> {
        let data = Array5::<f32>::read_npy(reader)?;
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        Ok(Self::from_array(data))
    }

    /// 打开 `.npy` 文件. `path` 为文件的本地路径.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> DetectResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_npy(BufReader::new(file))
    }

    /// 以 `.npy` 格式将底层数组写入 `writer`. 物理范围不会被保存.
    pub fn write_npy<W: Write>(&self, writer: W) -> DetectResult<()> {
        self.data.write_npy(writer)?;
        Ok(())
    }

    /// 以 `.npy` 格式保存到 `path`.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> DetectResult<()> {
        let file = File::create(path.as_ref())?;
        self.write_npy(BufWriter::new(file))
    }
}
