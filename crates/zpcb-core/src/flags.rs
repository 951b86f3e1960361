//! 对象标志位
//!
//! 与捕捉掩码一样使用手写位域，便于序列化和快速测试。

use serde::{Deserialize, Serialize};

/// 最大铜层数量（每层占用热焊盘/覆铜包含掩码中的一位）
pub const MAX_LAYERS: usize = 16;

/// 对象标志位集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectFlags {
    bits: u32,
}

impl ObjectFlags {
    /// 被选中
    pub const SELECTED: u32 = 1 << 0;
    /// 过孔
    pub const VIA: u32 = 1 << 1;
    /// 元件引脚
    pub const PIN: u32 = 1 << 2;
    /// 飞线
    pub const RAT: u32 = 1 << 3;
    /// 位于焊接面（文字镜像绘制 / 元件在背面）
    pub const ON_SOLDER: u32 = 1 << 4;
    /// 走线与覆铜之间保留间隙
    pub const CLEAR_LINE: u32 = 1 << 5;
    /// 拖动过程中的橡皮筋端点标记
    pub const RUBBER_END: u32 = 1 << 6;

    pub const NONE: ObjectFlags = ObjectFlags { bits: 0 };

    pub const fn new(bits: u32) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.bits & bit == bit
    }

    pub fn insert(&mut self, bit: u32) {
        self.bits |= bit;
    }

    pub fn remove(&mut self, bit: u32) {
        self.bits &= !bit;
    }

    pub fn set(&mut self, bit: u32, enabled: bool) {
        if enabled {
            self.insert(bit);
        } else {
            self.remove(bit);
        }
    }

    /// 返回去掉指定位之后的副本
    pub fn without(mut self, bit: u32) -> Self {
        self.remove(bit);
        self
    }

    /// 返回加上指定位之后的副本
    pub fn with(mut self, bit: u32) -> Self {
        self.insert(bit);
        self
    }
}

/// 按层索引的位掩码（热焊盘、覆铜包含）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask {
    bits: u32,
}

impl LayerMask {
    pub const NONE: LayerMask = LayerMask { bits: 0 };

    pub const fn new(bits: u32) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn contains(&self, layer: usize) -> bool {
        layer < MAX_LAYERS && self.bits & (1 << layer) != 0
    }

    pub fn set(&mut self, layer: usize, enabled: bool) {
        if layer >= MAX_LAYERS {
            return;
        }
        if enabled {
            self.bits |= 1 << layer;
        } else {
            self.bits &= !(1 << layer);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// 所有置位的层索引
    pub fn layers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_LAYERS).filter(move |&l| self.contains(l))
    }
}
