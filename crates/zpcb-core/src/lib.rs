//! ZPCB 核心编辑引擎
//!
//! 电路板版图编辑器的几何修改核心：原地移动或换层任意电路板实体（走线、圆弧、文字、
//! 覆铜、过孔、元件、端点、飞线），同时保持显示一致、橡皮筋走线同步移动、
//! 派生状态（包围盒、覆铜包含标志、焊接面标志）正确，并为每次修改记录可逆的撤销日志。
//!
//! # 架构设计
//!
//! - `Board`: 分层的实体存储，每类实体保存在分代索引存储中
//! - `EntityRef`: 实体的类型化引用，移动和换层通过穷尽匹配分派
//! - `Editor`: 对外操作入口，持有电路板、撤销日志和显示后端
//!
//! # 示例
//!
//! ```rust
//! use zpcb_core::prelude::*;
//!
//! let mut board = Board::new(Settings::default());
//! let top = board.add_layer("component", GroupId(0)).unwrap();
//! let line = board
//!     .create_line(top, Point2::new(0, 0), Point2::new(1000, 0), 250, 250, ObjectFlags::NONE)
//!     .unwrap();
//!
//! let mut editor = Editor::new(board, NullRenderer);
//! let mut rubberband = RubberbandSet::new();
//! editor
//!     .move_entity_with_rubberband(EntityRef::Line { layer: top, line }, Vector2::new(100, 0), &mut rubberband)
//!     .unwrap();
//! assert!(editor.undo());
//! ```

pub mod arena;
pub mod board;
pub mod dispatch;
pub mod editor;
pub mod entity;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod layer;
pub mod math;
pub mod ops;
pub mod polygon;
pub mod render;
pub mod search;
pub mod settings;
pub mod undo;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::arena::{Arena, Handle};
    pub use crate::board::Board;
    pub use crate::dispatch::{EntityKind, EntityRef, KindMask, ObjectRef};
    pub use crate::editor::Editor;
    pub use crate::entity::{Endpoint, ObjectId};
    pub use crate::error::EditError;
    pub use crate::flags::{LayerMask, ObjectFlags};
    pub use crate::geometry::{Arc, Element, Line, Pad, Pin, Polygon, Rat, Text, Via};
    pub use crate::layer::{GroupId, Layer, LayerGroups, LayerId};
    pub use crate::math::{BoundingBox2, Coord, Point2, Vector2};
    pub use crate::ops::{RubberbandLink, RubberbandSet};
    pub use crate::render::{Drawable, NullRenderer, RecordingRenderer, Renderer};
    pub use crate::search::find_entity_at;
    pub use crate::settings::{Settings, Visibility};
    pub use crate::undo::{UndoLog, UndoRecord};
}
