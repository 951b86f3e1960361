//! 换层处理函数
//!
//! 换层保持坐标不变，只把实体从源层的存储移到目标层的存储。移动之后源句柄失效，
//! 调用方只能使用返回的新引用。
//!
//! 走线换到不同层组时，如果某个端点在源层上仍与其他走线相连且没有引脚/过孔锚定，
//! 会在该端点自动插入过孔以保持电气连通。端点先记入待检查列表，批次结束时统一处理，
//! 因此同一批中一起换层的走线之间不会留下多余的过孔。

use crate::arena::Handle;
use crate::dispatch::{EntityRef, LayerMoveContext, ObjectRef};
use crate::editor::Editor;
use crate::entity::Endpoint;
use crate::error::EditError;
use crate::flags::ObjectFlags;
use crate::geometry::{Arc, Line, Polygon, Rat, Text};
use crate::layer::LayerId;
use crate::math::Point2;
use crate::polygon::PipScope;
use crate::render::{Drawable, Renderer};
use crate::search::pin_or_via_at;
use crate::undo::UndoRecord;

/// 换层目标的判定结果
enum Destination {
    /// 目标与源相同
    Same,
    /// 换层已在上游取消
    Aborted,
    Other(LayerId),
}

fn destination(src: LayerId, ctx: &LayerMoveContext) -> Destination {
    match ctx.destination {
        None => Destination::Aborted,
        Some(dest) if dest == src => Destination::Same,
        Some(dest) => Destination::Other(dest),
    }
}

impl<R: Renderer> Editor<R> {
    pub(crate) fn move_line_to_layer(
        &mut self,
        layer: LayerId,
        h: Handle<Line>,
        ctx: &LayerMoveContext,
    ) -> Result<EntityRef, EditError> {
        let dest = match destination(layer, ctx) {
            Destination::Same => {
                // 单个对象换到同一层：只重绘
                if !ctx.more_to_come && self.board.is_layer_on(layer)? {
                    self.renderer.draw(&Drawable::Line(layer, self.board.line(layer, h)?));
                    self.renderer.flush();
                }
                return Ok(EntityRef::Line { layer, line: h });
            }
            Destination::Aborted => return Ok(EntityRef::Line { layer, line: h }),
            Destination::Other(dest) => dest,
        };
        let src_on = self.board.is_layer_on(layer)?;
        let dest_on = self.board.is_layer_on(dest)?;

        let line = self.board.line(layer, h)?;
        self.undo.append(UndoRecord::MoveToLayer {
            target: ObjectRef::Line(line.id),
            previous: layer,
        });
        if src_on {
            self.renderer.erase(&Drawable::Line(layer, line));
        }
        let moved = self.board.relocate_line(layer, h, dest)?;
        if dest_on {
            self.renderer.draw(&Drawable::Line(dest, self.board.line(dest, moved)?));
        }
        self.renderer.flush();

        // 重放时过孔由单独的记录恢复
        if self.board.settings.auto_via && !self.undo.is_locked() && !self.board.groups.same_group(layer, dest) {
            let line = self.board.line(dest, moved)?;
            let endpoints = [line.point(Endpoint::Point1), line.point(Endpoint::Point2)];
            self.junctions.extend(endpoints.map(|point| (layer, point)));
        }
        Ok(EntityRef::Line { layer: dest, line: moved })
    }

    /// 处理批次中记下的连接点，返回插入的过孔数
    pub(crate) fn insert_pending_junction_vias(&mut self) -> Result<usize, EditError> {
        let mut inserted = 0;
        for (src, point) in std::mem::take(&mut self.junctions) {
            if self.insert_junction_via(src, &point)? {
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.renderer.flush();
        }
        Ok(inserted)
    }

    /// 源层上该点仍是走线连接点且没有引脚/过孔时插入过孔
    fn insert_junction_via(&mut self, src: LayerId, point: &Point2) -> Result<bool, EditError> {
        if pin_or_via_at(&self.board, point) || !self.board.layer(src)?.has_line_endpoint_at(point, None) {
            return Ok(false);
        }
        let settings = self.board.settings.clone();
        let Some(via) = self.board.create_via(
            *point,
            settings.via_thickness,
            2 * settings.keepaway,
            0,
            settings.via_drilling_hole,
            "",
            ObjectFlags::new(ObjectFlags::VIA),
        ) else {
            return Ok(false);
        };
        self.update_pip_flags(PipScope::Via(via), false)?;
        let created = self.board.via(via)?;
        self.undo.append(UndoRecord::Create {
            target: ObjectRef::Via(created.id),
        });
        tracing::debug!(x = point.x, y = point.y, "junction via inserted");
        self.renderer.draw(&Drawable::Via(created));
        Ok(true)
    }

    /// 圆弧换层；圆弧端点不触发自动过孔
    pub(crate) fn move_arc_to_layer(
        &mut self,
        layer: LayerId,
        h: Handle<Arc>,
        ctx: &LayerMoveContext,
    ) -> Result<EntityRef, EditError> {
        let dest = match destination(layer, ctx) {
            Destination::Same => {
                if !ctx.more_to_come && self.board.is_layer_on(layer)? {
                    self.renderer.draw(&Drawable::Arc(layer, self.board.arc(layer, h)?));
                    self.renderer.flush();
                }
                return Ok(EntityRef::Arc { layer, arc: h });
            }
            Destination::Aborted => return Ok(EntityRef::Arc { layer, arc: h }),
            Destination::Other(dest) => dest,
        };
        let src_on = self.board.is_layer_on(layer)?;
        let dest_on = self.board.is_layer_on(dest)?;

        let arc = self.board.arc(layer, h)?;
        self.undo.append(UndoRecord::MoveToLayer {
            target: ObjectRef::Arc(arc.id),
            previous: layer,
        });
        if src_on {
            self.renderer.erase(&Drawable::Arc(layer, arc));
        }
        let moved = self.board.relocate_arc(layer, h, dest)?;
        if dest_on {
            self.renderer.draw(&Drawable::Arc(dest, self.board.arc(dest, moved)?));
        }
        self.renderer.flush();
        Ok(EntityRef::Arc { layer: dest, arc: moved })
    }

    /// 文字换层；目标层属于焊接面层组时文字镜像
    pub(crate) fn move_text_to_layer(
        &mut self,
        layer: LayerId,
        h: Handle<Text>,
        ctx: &LayerMoveContext,
    ) -> Result<EntityRef, EditError> {
        let Destination::Other(dest) = destination(layer, ctx) else {
            return Ok(EntityRef::Text { layer, text: h });
        };
        let src_on = self.board.is_layer_on(layer)?;
        let dest_on = self.board.is_layer_on(dest)?;

        let text = self.board.text(layer, h)?;
        self.undo.append(UndoRecord::MoveToLayer {
            target: ObjectRef::Text(text.id),
            previous: layer,
        });
        if src_on {
            self.renderer.erase(&Drawable::Text(layer, text));
        }
        let moved = self.board.relocate_text(layer, h, dest)?;
        if dest_on {
            self.renderer.draw(&Drawable::Text(dest, self.board.text(dest, moved)?));
        }
        if src_on || dest_on {
            self.renderer.flush();
        }
        Ok(EntityRef::Text { layer: dest, text: moved })
    }

    /// 覆铜换层：先把覆铜内引脚/过孔的热焊盘标志迁到目标层，再移动存储，
    /// 最后重算源层和目标层的覆铜包含标志
    pub(crate) fn move_polygon_to_layer(
        &mut self,
        layer: LayerId,
        h: Handle<Polygon>,
        ctx: &LayerMoveContext,
    ) -> Result<EntityRef, EditError> {
        let Destination::Other(dest) = destination(layer, ctx) else {
            return Ok(EntityRef::Polygon { layer, polygon: h });
        };
        let src_on = self.board.is_layer_on(layer)?;
        let dest_on = self.board.is_layer_on(dest)?;

        let polygon = self.board.polygon(layer, h)?.clone();
        self.undo.append(UndoRecord::MoveToLayer {
            target: ObjectRef::Polygon(polygon.id),
            previous: layer,
        });
        if src_on {
            self.renderer.erase(&Drawable::Polygon(layer, &polygon));
        }
        self.transfer_thermals(&polygon, layer, dest)?;

        let moved = self.board.relocate_polygon(layer, h, dest)?;
        self.update_pip_flags(PipScope::Layer(layer), true)?;
        self.update_pip_flags(PipScope::Layer(dest), true)?;
        if dest_on {
            self.renderer.draw(&Drawable::Polygon(dest, self.board.polygon(dest, moved)?));
            self.renderer.flush();
        }
        Ok(EntityRef::Polygon {
            layer: dest,
            polygon: moved,
        })
    }

    /// 飞线换层：在目标层新建一条走线替代飞线，飞线本身被删除
    ///
    /// 换层已取消时不做任何事，返回 `None`。
    pub(crate) fn move_rat_to_layer(
        &mut self,
        h: Handle<Rat>,
        ctx: &LayerMoveContext,
    ) -> Result<Option<EntityRef>, EditError> {
        let Some(dest) = ctx.destination else {
            return Ok(None);
        };
        self.board.layer(dest)?;
        let rat = self.board.rat(h)?;
        let settings = &self.board.settings;
        let mut flags = rat.flags.without(ObjectFlags::RAT);
        if settings.clear_new {
            flags.insert(ObjectFlags::CLEAR_LINE);
        }
        let line = Line::new(rat.point1, rat.point2, settings.line_thickness, settings.keepaway, flags);
        let line_id = line.id;
        let moved = self.board.add_line(dest, line)?;
        self.undo.append(UndoRecord::Create {
            target: ObjectRef::Line(line_id),
        });

        if self.board.visibility.rats_on {
            self.renderer.erase(&Drawable::Rat(self.board.rat(h)?));
        }
        let snapshot = self.board.remove(&EntityRef::Rat(h))?;
        self.undo.append(UndoRecord::Remove { snapshot });

        self.renderer.draw(&Drawable::Line(dest, self.board.line(dest, moved)?));
        self.renderer.flush();
        Ok(Some(EntityRef::Line { layer: dest, line: moved }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::dispatch::EntityKind;
    use crate::layer::GroupId;
    use crate::render::{RecordingRenderer, RenderOp};
    use crate::search::anchors_at;
    use crate::settings::Settings;

    /// 四层板：元件面(组0)、焊接面(组1)、两个内层同属组2
    fn editor() -> (Editor<RecordingRenderer>, [LayerId; 4]) {
        let mut board = Board::new(Settings::default());
        let top = board.add_layer("component", GroupId(0)).unwrap();
        let bottom = board.add_layer("solder", GroupId(1)).unwrap();
        let inner1 = board.add_layer("inner1", GroupId(2)).unwrap();
        let inner2 = board.add_layer("inner2", GroupId(2)).unwrap();
        board.groups.component = Some(GroupId(0));
        board.groups.solder = Some(GroupId(1));
        (Editor::new(board, RecordingRenderer::new()), [top, bottom, inner1, inner2])
    }

    fn line(editor: &mut Editor<RecordingRenderer>, layer: LayerId, a: (i64, i64), b: (i64, i64)) -> Handle<Line> {
        editor
            .board
            .create_line(layer, Point2::new(a.0, a.1), Point2::new(b.0, b.1), 1000, 1000, ObjectFlags::NONE)
            .unwrap()
    }

    #[test]
    fn test_relayer_returns_new_handle() {
        let (mut editor, [top, bottom, ..]) = editor();
        let h = line(&mut editor, top, (0, 0), (10000, 0));
        let id = editor.board.line(top, h).unwrap().id;

        let result = editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: h }, Some(bottom), false)
            .unwrap()
            .unwrap();
        let EntityRef::Line { layer, line: moved } = result else {
            panic!("expected a line, got {:?}", result);
        };
        assert_eq!(layer, bottom);
        assert_eq!(editor.board.line(bottom, moved).unwrap().id, id);
        assert!(matches!(editor.board.line(top, h), Err(EditError::StaleHandle(EntityKind::Line))));

        // 旧句柄不能再用于任何操作
        let stale = editor.move_entity_to_layer(EntityRef::Line { layer: top, line: h }, Some(bottom), false);
        assert!(matches!(stale, Err(EditError::StaleHandle(_))));
    }

    #[test]
    fn test_same_layer_is_noop() {
        let (mut editor, [top, ..]) = editor();
        let h = line(&mut editor, top, (0, 0), (10000, 0));
        let target = EntityRef::Line { layer: top, line: h };
        let serial = editor.undo.serial();

        let result = editor.move_entity_to_layer(target, Some(top), false).unwrap();
        assert_eq!(result, Some(target));
        assert!(editor.undo.pending().is_empty());
        assert_eq!(editor.undo.undo_len(), 0);
        assert_eq!(editor.undo.serial(), serial);
        // 只重绘
        assert_eq!(editor.renderer.count(RenderOp::Draw), 1);
        assert_eq!(editor.renderer.count(RenderOp::Erase), 0);
    }

    #[test]
    fn test_aborted_destination_is_noop() {
        let (mut editor, [top, ..]) = editor();
        let h = line(&mut editor, top, (0, 0), (10000, 0));
        let target = EntityRef::Line { layer: top, line: h };

        assert_eq!(editor.move_entity_to_layer(target, None, false).unwrap(), Some(target));
        assert_eq!(editor.undo.undo_len(), 0);
        assert!(editor.renderer.events.is_empty());
    }

    #[test]
    fn test_junction_via_inserted_between_groups() {
        let (mut editor, [top, bottom, ..]) = editor();
        let moving = line(&mut editor, top, (0, 0), (10000, 0));
        line(&mut editor, top, (10000, 0), (10000, 10000));

        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: moving }, Some(bottom), false)
            .unwrap();

        // 只有与其他走线相连的端点得到过孔
        assert_eq!(editor.board.vias.len(), 1);
        assert_eq!(anchors_at(&editor.board, &Point2::new(10000, 0)), 1);
        assert_eq!(anchors_at(&editor.board, &Point2::new(0, 0)), 0);

        let via = editor.board.vias.values().next().unwrap();
        assert_eq!(via.thickness, editor.board.settings.via_thickness);
        assert_eq!(via.clearance, 2 * editor.board.settings.keepaway);
        assert!(via.flags.contains(ObjectFlags::VIA));

        // 过孔创建和换层属于同一事务
        let last = editor.undo.last_transaction().unwrap();
        assert_eq!(last.records.len(), 2);
        assert!(matches!(last.records[1], UndoRecord::Create { target: ObjectRef::Via(_) }));
    }

    #[test]
    fn test_no_via_when_batched_until_terminal_move() {
        let (mut editor, [top, bottom, ..]) = editor();
        let first = line(&mut editor, top, (0, 0), (10000, 0));
        let second = line(&mut editor, top, (20000, 0), (30000, 0));
        line(&mut editor, top, (10000, 0), (10000, 10000));
        line(&mut editor, top, (30000, 0), (30000, 10000));

        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: first }, Some(bottom), true)
            .unwrap();
        assert_eq!(editor.board.vias.len(), 0);
        // 批量中不结束事务
        assert_eq!(editor.undo.undo_len(), 0);

        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: second }, Some(bottom), false)
            .unwrap();
        // 结束批次的调用为整批插入过孔
        assert_eq!(editor.board.vias.len(), 2);
        assert_eq!(anchors_at(&editor.board, &Point2::new(10000, 0)), 1);
        assert_eq!(anchors_at(&editor.board, &Point2::new(30000, 0)), 1);
        assert_eq!(editor.undo.undo_len(), 1);
        let creates = editor
            .undo
            .last_transaction()
            .unwrap()
            .records
            .iter()
            .filter(|r| matches!(r, UndoRecord::Create { target: ObjectRef::Via(_) }))
            .count();
        assert_eq!(creates, 2);
    }

    #[test]
    fn test_batch_ended_by_text_still_inserts_vias() {
        let (mut editor, [top, bottom, ..]) = editor();
        let moving = line(&mut editor, top, (0, 0), (10000, 0));
        line(&mut editor, top, (10000, 0), (10000, 10000));
        let text = editor
            .board
            .add_text(top, Text::new(Point2::new(0, 50000), 0, 100, "T", ObjectFlags::NONE))
            .unwrap();

        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: moving }, Some(bottom), true)
            .unwrap();
        assert!(editor.board.vias.is_empty());
        editor
            .move_entity_to_layer(EntityRef::Text { layer: top, text }, Some(bottom), false)
            .unwrap();
        assert_eq!(anchors_at(&editor.board, &Point2::new(10000, 0)), 1);
    }

    #[test]
    fn test_no_via_within_same_group() {
        let (mut editor, [_, _, inner1, inner2]) = editor();
        let moving = line(&mut editor, inner1, (0, 0), (10000, 0));
        line(&mut editor, inner1, (10000, 0), (10000, 10000));

        editor
            .move_entity_to_layer(EntityRef::Line { layer: inner1, line: moving }, Some(inner2), false)
            .unwrap();
        assert!(editor.board.vias.is_empty());
    }

    #[test]
    fn test_no_via_when_disabled_or_anchored() {
        let (mut editor, [top, bottom, ..]) = editor();
        let a = line(&mut editor, top, (0, 0), (10000, 0));
        line(&mut editor, top, (10000, 0), (10000, 10000));
        editor.board.settings.auto_via = false;
        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: a }, Some(bottom), false)
            .unwrap();
        assert!(editor.board.vias.is_empty());

        let (mut editor, [top, bottom, ..]) = self::editor();
        let a = line(&mut editor, top, (0, 0), (10000, 0));
        line(&mut editor, top, (10000, 0), (10000, 10000));
        editor
            .board
            .create_via(Point2::new(10000, 0), 6000, 2000, 0, 2800, "", ObjectFlags::new(ObjectFlags::VIA))
            .unwrap();
        editor
            .move_entity_to_layer(EntityRef::Line { layer: top, line: a }, Some(bottom), false)
            .unwrap();
        assert_eq!(editor.board.vias.len(), 1);
    }

    // 已知限制：圆弧端点即使与其他走线相连也不插入过孔
    #[test]
    fn test_arc_endpoints_never_get_vias() {
        let (mut editor, [top, bottom, ..]) = editor();
        let arc = editor
            .board
            .add_arc(top, Arc::new(Point2::new(0, 0), 10000, 10000, 0, 90, 1000, 1000, ObjectFlags::NONE))
            .unwrap();
        let start = editor.board.arc(top, arc).unwrap().start_point();
        line(&mut editor, top, (start.x, start.y), (start.x + 10000, start.y));

        let result = editor
            .move_entity_to_layer(EntityRef::Arc { layer: top, arc }, Some(bottom), false)
            .unwrap();
        assert!(matches!(result, Some(EntityRef::Arc { layer, .. }) if layer == bottom));
        assert!(editor.board.vias.is_empty());
    }

    #[test]
    fn test_text_mirrors_on_solder_layer() {
        let (mut editor, [top, bottom, ..]) = editor();
        let h = editor
            .board
            .add_text(top, Text::new(Point2::new(0, 0), 0, 100, "REF", ObjectFlags::NONE))
            .unwrap();

        let result = editor
            .move_entity_to_layer(EntityRef::Text { layer: top, text: h }, Some(bottom), false)
            .unwrap();
        let Some(EntityRef::Text { text: moved, .. }) = result else {
            panic!("expected text");
        };
        let text = editor.board.text(bottom, moved).unwrap();
        assert!(text.on_solder());
        assert_eq!(text.bbox, text.compute_bounding_box());
    }

    fn square(x: i64, size: i64) -> Polygon {
        Polygon::new(
            vec![
                Point2::new(x, 0),
                Point2::new(x + size, 0),
                Point2::new(x + size, size),
                Point2::new(x, size),
            ],
            ObjectFlags::NONE,
        )
    }

    #[test]
    fn test_thermal_transfer_only_inside_polygon() {
        let (mut editor, [top, bottom, ..]) = editor();
        let polygon = editor.board.add_polygon(top, square(0, 100000)).unwrap();
        // 第二块覆铜留在元件面，罩住外侧的过孔
        editor.board.add_polygon(top, square(150000, 100000)).unwrap();
        let flags = ObjectFlags::new(ObjectFlags::VIA);
        let inside = editor
            .board
            .create_via(Point2::new(50000, 50000), 6000, 2000, 0, 2800, "", flags)
            .unwrap();
        let outside = editor
            .board
            .create_via(Point2::new(200000, 50000), 6000, 2000, 0, 2800, "", flags)
            .unwrap();
        for h in [inside, outside] {
            editor.board.via_mut(h).unwrap().thermal.set(top.index(), true);
        }

        editor
            .move_entity_to_layer(EntityRef::Polygon { layer: top, polygon }, Some(bottom), false)
            .unwrap();

        let inside = editor.board.via(inside).unwrap();
        assert!(!inside.thermal.contains(top.index()));
        assert!(inside.thermal.contains(bottom.index()));
        assert!(inside.pip.contains(bottom.index()));
        assert!(!inside.pip.contains(top.index()));

        let outside = editor.board.via(outside).unwrap();
        assert!(outside.thermal.contains(top.index()));
        assert!(!outside.thermal.contains(bottom.index()));
        assert!(outside.pip.contains(top.index()));

        // 每个迁移的对象单独记录修改前的标志
        let records = &editor.undo.last_transaction().unwrap().records;
        let flag_changes = records
            .iter()
            .filter(|r| matches!(r, UndoRecord::ChangeFlags { .. }))
            .count();
        assert!(flag_changes >= 1);
        assert!(matches!(records[0], UndoRecord::MoveToLayer { .. }));
    }

    #[test]
    fn test_rat_becomes_line() {
        let (mut editor, [top, ..]) = editor();
        let rat = editor
            .board
            .add_rat(Rat::new(Point2::new(0, 0), Point2::new(5000, 5000), 0, 0, 100));

        let result = editor
            .move_entity_to_layer(EntityRef::Rat(rat), Some(top), false)
            .unwrap();
        let Some(EntityRef::Line { layer, line: h }) = result else {
            panic!("expected a line");
        };
        assert_eq!(layer, top);
        assert!(editor.board.rats.is_empty());

        let line = editor.board.line(top, h).unwrap();
        assert_eq!(line.point2, Point2::new(5000, 5000));
        assert_eq!(line.thickness, editor.board.settings.line_thickness);
        assert!(!line.flags.contains(ObjectFlags::RAT));
        assert!(line.flags.contains(ObjectFlags::CLEAR_LINE));

        let records = &editor.undo.last_transaction().unwrap().records;
        assert!(matches!(records[0], UndoRecord::Create { .. }));
        assert!(matches!(records[1], UndoRecord::Remove { .. }));
    }

    #[test]
    fn test_rat_without_destination_is_untouched() {
        let (mut editor, _) = editor();
        let rat = editor
            .board
            .add_rat(Rat::new(Point2::new(0, 0), Point2::new(5000, 5000), 0, 0, 100));
        assert_eq!(editor.move_entity_to_layer(EntityRef::Rat(rat), None, false).unwrap(), None);
        assert_eq!(editor.board.rats.len(), 1);
    }
}
