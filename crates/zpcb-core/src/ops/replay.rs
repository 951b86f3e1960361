//! 撤销记录的执行
//!
//! 执行一条记录即把它描述的修改反过来做一遍，并返回能把这次执行再反过来的记录。
//! 撤销和重做因此共用同一套执行逻辑。

use crate::board::Board;
use crate::dispatch::{EntityKind, EntityRef, LayerMoveContext, MoveContext};
use crate::editor::Editor;
use crate::error::EditError;
use crate::flags::{LayerMask, ObjectFlags};
use crate::render::{Drawable, Renderer};
use crate::undo::{FlagState, Transaction, UndoRecord};

impl Board {
    /// 读取实体的标志位状态
    pub fn flag_state(&self, target: &EntityRef) -> Result<FlagState, EditError> {
        let plain = |flags: ObjectFlags| FlagState {
            flags,
            thermal: LayerMask::NONE,
            pip: LayerMask::NONE,
        };
        Ok(match *target {
            EntityRef::Line { layer, line } | EntityRef::LinePoint { layer, line, .. } => {
                plain(self.line(layer, line)?.flags)
            }
            EntityRef::Arc { layer, arc } => plain(self.arc(layer, arc)?.flags),
            EntityRef::Text { layer, text } => plain(self.text(layer, text)?.flags),
            EntityRef::Polygon { layer, polygon } | EntityRef::PolygonPoint { layer, polygon, .. } => {
                plain(self.polygon(layer, polygon)?.flags)
            }
            EntityRef::Element(element) | EntityRef::ElementName(element) => plain(self.element(element)?.flags),
            EntityRef::Pad { element, pad } => {
                let element = self.element(element)?;
                let pad = element.pads.get(pad).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pad,
                    owner: element.id,
                    index: pad,
                })?;
                plain(pad.flags)
            }
            EntityRef::Rat(rat) | EntityRef::RatPoint { rat, .. } => plain(self.rat(rat)?.flags),
            EntityRef::Via(via) => {
                let via = self.via(via)?;
                FlagState {
                    flags: via.flags,
                    thermal: via.thermal,
                    pip: via.pip,
                }
            }
            EntityRef::Pin { element, pin } => {
                let element = self.element(element)?;
                let pin = element.pins.get(pin).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pin,
                    owner: element.id,
                    index: pin,
                })?;
                FlagState {
                    flags: pin.flags,
                    thermal: pin.thermal,
                    pip: pin.pip,
                }
            }
        })
    }

    /// 写回标志位状态
    pub fn set_flag_state(&mut self, target: &EntityRef, state: FlagState) -> Result<(), EditError> {
        match *target {
            EntityRef::Line { layer, line } | EntityRef::LinePoint { layer, line, .. } => {
                self.line_mut(layer, line)?.flags = state.flags;
            }
            EntityRef::Arc { layer, arc } => self.arc_mut(layer, arc)?.flags = state.flags,
            EntityRef::Text { layer, text } => self.text_mut(layer, text)?.flags = state.flags,
            EntityRef::Polygon { layer, polygon } | EntityRef::PolygonPoint { layer, polygon, .. } => {
                self.polygon_mut(layer, polygon)?.flags = state.flags;
            }
            EntityRef::Element(element) | EntityRef::ElementName(element) => {
                self.element_mut(element)?.flags = state.flags;
            }
            EntityRef::Pad { element, pad } => {
                let element = self.element_mut(element)?;
                let owner = element.id;
                let pad = element.pads.get_mut(pad).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pad,
                    owner,
                    index: pad,
                })?;
                pad.flags = state.flags;
            }
            EntityRef::Rat(rat) | EntityRef::RatPoint { rat, .. } => self.rat_mut(rat)?.flags = state.flags,
            EntityRef::Via(via) => {
                let via = self.via_mut(via)?;
                via.flags = state.flags;
                via.thermal = state.thermal;
                via.pip = state.pip;
            }
            EntityRef::Pin { element, pin } => {
                let element = self.element_mut(element)?;
                let owner = element.id;
                let pin = element.pins.get_mut(pin).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pin,
                    owner,
                    index: pin,
                })?;
                pin.flags = state.flags;
                pin.thermal = state.thermal;
                pin.pip = state.pip;
            }
        }
        Ok(())
    }
}

impl<R: Renderer> Editor<R> {
    /// 执行一条记录，返回它的逆记录
    pub(crate) fn execute(&mut self, record: UndoRecord) -> Result<UndoRecord, EditError> {
        tracing::debug!(record = record.name(), "replay");
        match record {
            UndoRecord::Move { target, offset } => {
                let entity = self.board.resolve(&target)?;
                let ctx = MoveContext { offset: -offset };
                self.dispatch_move(entity, &ctx)?;
                Ok(UndoRecord::Move {
                    target,
                    offset: -offset,
                })
            }
            UndoRecord::MoveToLayer { target, previous } => {
                let entity = self.board.resolve(&target)?;
                let current = entity.layer().ok_or(EditError::NotRemovable(entity.kind()))?;
                // 日志锁定期间不记连接点，过孔由单独的记录恢复
                let ctx = LayerMoveContext {
                    destination: Some(previous),
                    more_to_come: true,
                };
                self.dispatch_move_to_layer(entity, &ctx)?;
                Ok(UndoRecord::MoveToLayer {
                    target,
                    previous: current,
                })
            }
            UndoRecord::Create { target } => {
                let entity = self.board.resolve(&target)?;
                self.erase_entity(&entity)?;
                let snapshot = self.board.remove(&entity)?;
                self.renderer.flush();
                Ok(UndoRecord::Remove { snapshot })
            }
            UndoRecord::Remove { snapshot } => {
                let target = snapshot.object_ref();
                let entity = self.board.restore(snapshot)?;
                self.draw_entity(&entity)?;
                self.renderer.flush();
                Ok(UndoRecord::Create { target })
            }
            UndoRecord::ChangeFlags { target, state } => {
                let entity = self.board.resolve(&target)?;
                let current = self.board.flag_state(&entity)?;
                self.board.set_flag_state(&entity, state)?;
                Ok(UndoRecord::ChangeFlags { target, state: current })
            }
            UndoRecord::ChangePoints { polygon, points } => {
                let (layer, h) = self.board.find_polygon(polygon).ok_or(EditError::ObjectNotFound(polygon))?;
                let on = self.board.is_layer_on(layer)?;
                let p = self.board.polygon_mut(layer, h)?;
                if on {
                    self.renderer.erase(&Drawable::Polygon(layer, p));
                }
                let current = std::mem::replace(&mut p.points, points);
                p.update_bounding_box();
                if on {
                    self.renderer.draw(&Drawable::Polygon(layer, p));
                    self.renderer.flush();
                }
                Ok(UndoRecord::ChangePoints { polygon, points: current })
            }
        }
    }

    /// 逆序执行事务中的记录；返回的逆记录按产生顺序保存，下次同样逆序执行即可还原
    fn replay(&mut self, transaction: Transaction) -> Transaction {
        self.undo.set_locked(true);
        let mut inverse = Vec::with_capacity(transaction.records.len());
        for record in transaction.records.into_iter().rev() {
            let name = record.name();
            match self.execute(record) {
                Ok(undone) => inverse.push(undone),
                Err(e) => tracing::warn!("Skipping unresolved {} record: {}", name, e),
            }
        }
        self.undo.set_locked(false);
        Transaction {
            serial: transaction.serial,
            records: inverse,
        }
    }

    /// 撤销最近一个事务；没有可撤销内容时返回 false
    pub fn undo(&mut self) -> bool {
        self.undo.bump_transaction();
        let Some(transaction) = self.undo.pop_undo() else {
            return false;
        };
        tracing::info!("Undo transaction #{}", transaction.serial);
        let inverse = self.replay(transaction);
        self.undo.push_redo(inverse);
        self.renderer.flush();
        true
    }

    /// 重做最近撤销的事务；没有可重做内容时返回 false
    pub fn redo(&mut self) -> bool {
        let Some(transaction) = self.undo.pop_redo() else {
            return false;
        };
        tracing::info!("Redo transaction #{}", transaction.serial);
        let inverse = self.replay(transaction);
        self.undo.push_undo(inverse);
        self.renderer.flush();
        true
    }

    fn erase_entity(&mut self, target: &EntityRef) -> Result<(), EditError> {
        let board = &self.board;
        match *target {
            EntityRef::Line { layer, line } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.erase(&Drawable::Line(layer, board.line(layer, line)?));
            }
            EntityRef::Arc { layer, arc } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.erase(&Drawable::Arc(layer, board.arc(layer, arc)?));
            }
            EntityRef::Text { layer, text } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.erase(&Drawable::Text(layer, board.text(layer, text)?));
            }
            EntityRef::Polygon { layer, polygon } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.erase(&Drawable::Polygon(layer, board.polygon(layer, polygon)?));
            }
            EntityRef::Via(via) if board.visibility.vias_on => {
                self.renderer.erase(&Drawable::Via(board.via(via)?));
            }
            EntityRef::Element(element) if board.visibility.elements_on => {
                self.renderer.erase(&Drawable::Element(board.element(element)?));
            }
            EntityRef::Rat(rat) if board.visibility.rats_on => {
                self.renderer.erase(&Drawable::Rat(board.rat(rat)?));
            }
            _ => {}
        }
        Ok(())
    }

    fn draw_entity(&mut self, target: &EntityRef) -> Result<(), EditError> {
        let board = &self.board;
        match *target {
            EntityRef::Line { layer, line } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.draw(&Drawable::Line(layer, board.line(layer, line)?));
            }
            EntityRef::Arc { layer, arc } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.draw(&Drawable::Arc(layer, board.arc(layer, arc)?));
            }
            EntityRef::Text { layer, text } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.draw(&Drawable::Text(layer, board.text(layer, text)?));
            }
            EntityRef::Polygon { layer, polygon } if board.is_layer_on(layer).unwrap_or(false) => {
                self.renderer.draw(&Drawable::Polygon(layer, board.polygon(layer, polygon)?));
            }
            EntityRef::Via(via) if board.visibility.vias_on => {
                self.renderer.draw(&Drawable::Via(board.via(via)?));
            }
            EntityRef::Element(element) if board.visibility.elements_on => {
                self.renderer.draw(&Drawable::Element(board.element(element)?));
            }
            EntityRef::Rat(rat) if board.visibility.rats_on => {
                self.renderer.draw(&Drawable::Rat(board.rat(rat)?));
            }
            _ => {}
        }
        Ok(())
    }
}
