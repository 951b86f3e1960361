//! 编辑器入口
//!
//! [`Editor`] 持有电路板、撤销日志和显示后端，对外提供移动、换层和撤销/重做操作。
//!
//! 事务边界：
//! - `move_entity` 只追加记录，不结束事务
//! - `move_entity_with_rubberband` 结束事务
//! - `move_entity_to_layer` 非批量时结束事务
//! - `move_selection_to_layer` 整批结束后结束一次事务
//!
//! 换层走线在源层留下的连接点先记下，到批次最后一次调用时统一插入过孔，
//! 这些过孔与换层记录属于同一事务。

use crate::board::Board;
use crate::dispatch::{EntityRef, LayerMoveContext, MoveContext};
use crate::error::EditError;
use crate::flags::ObjectFlags;
use crate::layer::LayerId;
use crate::math::{Point2, Vector2};
use crate::ops::RubberbandSet;
use crate::render::Renderer;
use crate::undo::{UndoLog, UndoRecord};

/// 电路板编辑器
pub struct Editor<R: Renderer> {
    pub board: Board,
    pub undo: UndoLog,
    pub renderer: R,
    /// 批次中待检查的连接点（源层，坐标）
    pub(crate) junctions: Vec<(LayerId, Point2)>,
}

impl<R: Renderer> Editor<R> {
    pub fn new(board: Board, renderer: R) -> Self {
        let undo = UndoLog::new(board.settings.undo_depth);
        Self {
            board,
            undo,
            renderer,
            junctions: Vec::new(),
        }
    }

    /// 原地移动一个实体，记录逆操作但不结束事务
    ///
    /// 该类型不支持移动时返回 `Ok(None)`。
    pub fn move_entity(&mut self, target: EntityRef, offset: Vector2) -> Result<Option<EntityRef>, EditError> {
        if !Self::is_movable(&target) {
            return Ok(None);
        }
        self.board.validate(&target)?;
        self.undo.append(UndoRecord::Move {
            target: self.board.object_ref(&target)?,
            offset,
        });
        self.dispatch_move(target, &MoveContext { offset })
    }

    /// 移动一个实体及其橡皮筋走线，作为一个事务
    ///
    /// 橡皮筋端点按加入顺序先于主对象移动，集合随后清空。偏移为零时什么都不做。
    pub fn move_entity_with_rubberband(
        &mut self,
        target: EntityRef,
        offset: Vector2,
        rubberband: &mut RubberbandSet,
    ) -> Result<Option<EntityRef>, EditError> {
        if offset.x == 0 && offset.y == 0 {
            return Ok(None);
        }
        self.board.validate(&target)?;
        for link in rubberband.links() {
            self.board.line(link.layer, link.line)?;
        }

        let ctx = MoveContext { offset };
        for link in rubberband.take() {
            let line = self.board.line_mut(link.layer, link.line)?;
            line.flags.remove(ObjectFlags::RUBBER_END);
            let point = EntityRef::LinePoint {
                layer: link.layer,
                line: link.line,
                end: link.end,
            };
            self.undo.append(UndoRecord::Move {
                target: self.board.object_ref(&point)?,
                offset,
            });
            self.move_line_point(link.layer, link.line, link.end, &ctx)?;
        }

        let result = if Self::is_movable(&target) {
            self.undo.append(UndoRecord::Move {
                target: self.board.object_ref(&target)?,
                offset,
            });
            self.dispatch_move(target, &ctx)?
        } else {
            None
        };
        self.undo.bump_transaction();
        Ok(result)
    }

    /// 把一个实体换到目标层
    ///
    /// `destination` 为 `None` 表示换层已在上游取消。`batched` 为真时推迟自动过孔和事务结束，
    /// 由批次中最后一次非批量调用为整批完成。
    pub fn move_entity_to_layer(
        &mut self,
        target: EntityRef,
        destination: Option<LayerId>,
        batched: bool,
    ) -> Result<Option<EntityRef>, EditError> {
        if !Self::is_layer_movable(&target) {
            return Ok(None);
        }
        self.board.validate(&target)?;
        let ctx = LayerMoveContext {
            destination,
            more_to_come: batched,
        };
        let result = self.dispatch_move_to_layer(target, &ctx)?;
        if !batched {
            self.insert_pending_junction_vias()?;
            self.undo.bump_transaction();
        }
        Ok(result)
    }

    /// 把所有选中的实体换到目标层，作为一个事务
    ///
    /// 先取选择快照再逐个处理；所有走线留下的连接点在整批结束后统一插入过孔。
    /// 返回是否有实体被处理。
    pub fn move_selection_to_layer(&mut self, destination: LayerId) -> Result<bool, EditError> {
        self.board.layer(destination)?;
        let selected: Vec<EntityRef> = self
            .board
            .selected()
            .into_iter()
            .filter(|target| Self::is_layer_movable(target))
            .collect();

        let mut changed = false;
        let count = selected.len();
        for (i, target) in selected.into_iter().enumerate() {
            let ctx = LayerMoveContext {
                destination: Some(destination),
                more_to_come: i + 1 < count,
            };
            changed |= self.dispatch_move_to_layer(target, &ctx)?.is_some();
        }
        let vias = self.insert_pending_junction_vias()?;
        tracing::debug!(count, vias, %destination, "selection moved to layer");
        self.undo.bump_transaction();
        Ok(changed)
    }
}
