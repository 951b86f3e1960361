//! 编辑操作
//!
//! - `move_object`: 各类型的原地移动
//! - `move_to_layer`: 各类型的换层
//! - `rubberband`: 拖拽时跟随移动的走线端点
//! - `replay`: 撤销/重做记录的执行

mod move_object;
mod move_to_layer;
mod replay;
pub mod rubberband;

pub use rubberband::{RubberbandLink, RubberbandSet};
