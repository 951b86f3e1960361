//! 原地移动处理函数
//!
//! 每个处理函数的步骤相同：可见时擦除，平移，重算包围盒，重算派生标志，可见时重绘并刷新。

use crate::arena::Handle;
use crate::dispatch::{EntityKind, EntityRef, MoveContext};
use crate::editor::Editor;
use crate::entity::Endpoint;
use crate::error::EditError;
use crate::geometry::{Arc, Element, Line, Polygon, Rat, Text, Via};
use crate::layer::LayerId;
use crate::polygon::PipScope;
use crate::render::{Drawable, Renderer};

impl<R: Renderer> Editor<R> {
    pub(crate) fn move_line(
        &mut self,
        layer: LayerId,
        h: Handle<Line>,
        ctx: &MoveContext,
    ) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let line = self.board.line_mut(layer, h)?;
        if on {
            self.renderer.erase(&Drawable::Line(layer, line));
        }
        line.translate(&ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Line(layer, line));
            self.renderer.flush();
        }
        Ok(EntityRef::Line { layer, line: h })
    }

    pub(crate) fn move_arc(&mut self, layer: LayerId, h: Handle<Arc>, ctx: &MoveContext) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let arc = self.board.arc_mut(layer, h)?;
        if on {
            self.renderer.erase(&Drawable::Arc(layer, arc));
        }
        // 圆弧包围盒在平移中整体重算
        arc.translate(&ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Arc(layer, arc));
            self.renderer.flush();
        }
        Ok(EntityRef::Arc { layer, arc: h })
    }

    pub(crate) fn move_text(&mut self, layer: LayerId, h: Handle<Text>, ctx: &MoveContext) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let text = self.board.text_mut(layer, h)?;
        if on {
            self.renderer.erase(&Drawable::Text(layer, text));
        }
        text.translate(&ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Text(layer, text));
            self.renderer.flush();
        }
        Ok(EntityRef::Text { layer, text: h })
    }

    pub(crate) fn move_polygon(
        &mut self,
        layer: LayerId,
        h: Handle<Polygon>,
        ctx: &MoveContext,
    ) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let polygon = self.board.polygon_mut(layer, h)?;
        if on {
            self.renderer.erase(&Drawable::Polygon(layer, polygon));
        }
        polygon.translate(&ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Polygon(layer, polygon));
            self.renderer.flush();
        }
        self.update_pip_flags(PipScope::Layer(layer), true)?;
        Ok(EntityRef::Polygon { layer, polygon: h })
    }

    pub(crate) fn move_via(&mut self, h: Handle<Via>, ctx: &MoveContext) -> Result<EntityRef, EditError> {
        let on = self.board.visibility.vias_on;
        let via = self.board.via_mut(h)?;
        if on {
            self.renderer.erase(&Drawable::Via(via));
        }
        via.translate(&ctx.offset);
        self.update_pip_flags(PipScope::Via(h), true)?;
        if on {
            self.renderer.draw(&Drawable::Via(self.board.via(h)?));
            self.renderer.flush();
        }
        Ok(EntityRef::Via(h))
    }

    /// 移动元件
    ///
    /// 元件可见且朝向当前视面（或显示背面对象）时整体擦除重绘；
    /// 否则只处理引脚和焊盘，背面元件只平移不绘制。
    pub(crate) fn move_element(&mut self, h: Handle<Element>, ctx: &MoveContext) -> Result<EntityRef, EditError> {
        let visibility = self.board.visibility.clone();
        let element = self.board.element_mut(h)?;
        let front = element.on_solder() == visibility.show_solder_side;
        let mut did_draw = false;

        if visibility.elements_on && (front || visibility.invisible_objects_on) {
            self.renderer.erase(&Drawable::Element(element));
            element.translate(&ctx.offset);
            self.renderer.draw(&Drawable::ElementName(element));
            self.renderer.draw(&Drawable::ElementPackage(element));
            did_draw = true;
        } else {
            if visibility.pins_on {
                self.renderer.erase(&Drawable::ElementPins(element));
            }
            element.translate(&ctx.offset);
        }

        self.update_pip_flags(PipScope::Element(h), true)?;
        if visibility.pins_on {
            self.renderer.draw(&Drawable::ElementPins(self.board.element(h)?));
            did_draw = true;
        }
        if did_draw {
            self.renderer.flush();
        }
        Ok(EntityRef::Element(h))
    }

    /// 只移动元件名称标签
    pub(crate) fn move_element_name(
        &mut self,
        h: Handle<Element>,
        ctx: &MoveContext,
    ) -> Result<EntityRef, EditError> {
        let visibility = self.board.visibility.clone();
        let element = self.board.element_mut(h)?;
        let front = element.on_solder() == visibility.show_solder_side;

        if visibility.elements_on && (front || visibility.invisible_objects_on) {
            self.renderer.erase(&Drawable::ElementName(element));
            element.translate_names(&ctx.offset);
            self.renderer.draw(&Drawable::ElementName(element));
            self.renderer.flush();
        } else {
            element.translate_names(&ctx.offset);
        }
        Ok(EntityRef::ElementName(h))
    }

    /// 移动走线的一个端点（拖拽端点和橡皮筋都走这里）
    pub(crate) fn move_line_point(
        &mut self,
        layer: LayerId,
        h: Handle<Line>,
        end: Endpoint,
        ctx: &MoveContext,
    ) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let line = self.board.line_mut(layer, h)?;
        if on {
            self.renderer.erase(&Drawable::Line(layer, line));
        }
        line.move_endpoint(end, &ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Line(layer, line));
            self.renderer.flush();
        }
        Ok(EntityRef::LinePoint { layer, line: h, end })
    }

    /// 移动飞线端点；飞线不属于任何层，可见性由飞线显示开关决定
    pub(crate) fn move_rat_point(&mut self, h: Handle<Rat>, end: Endpoint, ctx: &MoveContext) -> Result<EntityRef, EditError> {
        let on = self.board.visibility.rats_on;
        let rat = self.board.rat_mut(h)?;
        if on {
            self.renderer.erase(&Drawable::Rat(rat));
        }
        rat.move_endpoint(end, &ctx.offset);
        if on {
            self.renderer.draw(&Drawable::Rat(rat));
            self.renderer.flush();
        }
        Ok(EntityRef::RatPoint { rat: h, end })
    }

    /// 移动覆铜的一个顶点
    ///
    /// 之后尝试压缩多余顶点；发生压缩时包围盒和重绘由压缩负责，这里不再重复。
    /// 重放撤销记录时不压缩，顶点变化由单独的记录恢复。
    pub(crate) fn move_polygon_point(
        &mut self,
        layer: LayerId,
        h: Handle<Polygon>,
        point: usize,
        ctx: &MoveContext,
    ) -> Result<EntityRef, EditError> {
        let on = self.board.is_layer_on(layer)?;
        let polygon = self.board.polygon_mut(layer, h)?;
        if point >= polygon.points.len() {
            return Err(EditError::IndexOutOfRange {
                kind: EntityKind::PolygonPoint,
                owner: polygon.id,
                index: point,
            });
        }
        if on {
            self.renderer.erase(&Drawable::Polygon(layer, polygon));
        }
        polygon.move_point(point, &ctx.offset);

        let compacted = !self.undo.is_locked() && self.compact_points(layer, h)?;
        if !compacted {
            let polygon = self.board.polygon_mut(layer, h)?;
            polygon.update_bounding_box();
            if on {
                self.renderer.draw(&Drawable::Polygon(layer, polygon));
                self.renderer.flush();
            }
        }
        self.update_pip_flags(PipScope::Layer(layer), true)?;

        let remaining = self.board.polygon(layer, h)?.points.len();
        if point < remaining {
            Ok(EntityRef::PolygonPoint { layer, polygon: h, point })
        } else {
            Ok(EntityRef::Polygon { layer, polygon: h })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::flags::ObjectFlags;
    use crate::geometry::{Pad, Pin};
    use crate::layer::GroupId;
    use crate::math::{Point2, Vector2};
    use crate::render::{RecordingRenderer, RenderOp};
    use crate::settings::Settings;

    fn editor() -> (Editor<RecordingRenderer>, LayerId) {
        let mut board = Board::new(Settings::default());
        let top = board.add_layer("component", GroupId(0)).unwrap();
        board.add_layer("solder", GroupId(1)).unwrap();
        board.groups.component = Some(GroupId(0));
        board.groups.solder = Some(GroupId(1));
        (Editor::new(board, RecordingRenderer::new()), top)
    }

    #[test]
    fn test_move_line_and_back_is_exact() {
        let (mut editor, top) = editor();
        let h = editor
            .board
            .create_line(top, Point2::new(3, 7), Point2::new(100, -20), 13, 5, ObjectFlags::NONE)
            .unwrap();
        let before = editor.board.line(top, h).unwrap().clone();
        let target = EntityRef::Line { layer: top, line: h };

        editor.move_entity(target, Vector2::new(1234, -987)).unwrap();
        let moved = editor.board.line(top, h).unwrap();
        assert_eq!(moved.point1, Point2::new(1237, -980));
        assert_eq!(moved.bbox, moved.compute_bounding_box());

        editor.move_entity(target, Vector2::new(-1234, 987)).unwrap();
        assert_eq!(editor.board.line(top, h).unwrap(), &before);
    }

    #[test]
    fn test_move_arc_and_back_is_exact() {
        let (mut editor, top) = editor();
        let h = editor
            .board
            .add_arc(top, Arc::new(Point2::new(0, 0), 500, 500, 30, 100, 20, 0, ObjectFlags::NONE))
            .unwrap();
        let before = editor.board.arc(top, h).unwrap().clone();
        let target = EntityRef::Arc { layer: top, arc: h };

        editor.move_entity(target, Vector2::new(77, 13)).unwrap();
        let moved = editor.board.arc(top, h).unwrap();
        assert_eq!(moved.bbox, moved.compute_bounding_box());
        editor.move_entity(target, Vector2::new(-77, -13)).unwrap();
        assert_eq!(editor.board.arc(top, h).unwrap(), &before);
    }

    #[test]
    fn test_hidden_layer_is_not_drawn() {
        let (mut editor, top) = editor();
        editor.board.layer_mut(top).unwrap().on = false;
        let h = editor
            .board
            .create_line(top, Point2::new(0, 0), Point2::new(10, 0), 2, 0, ObjectFlags::NONE)
            .unwrap();
        editor
            .move_entity(EntityRef::Line { layer: top, line: h }, Vector2::new(5, 5))
            .unwrap();
        assert!(editor.renderer.events.is_empty());
        assert_eq!(editor.board.line(top, h).unwrap().point2, Point2::new(15, 5));
    }

    #[test]
    fn test_move_element_translates_children() {
        let (mut editor, _) = editor();
        let mut element = Element::new(Point2::new(0, 0), ObjectFlags::NONE);
        element.pins.push(Pin::new(Point2::new(10, 0), 20, 5, 0, 8, "1", ObjectFlags::new(ObjectFlags::PIN)));
        element.pads.push(Pad::new(Point2::new(0, 10), Point2::new(0, 20), 6, 2, "2"));
        element
            .lines
            .push(Line::new(Point2::new(-5, -5), Point2::new(30, -5), 4, 0, ObjectFlags::NONE));
        element
            .names
            .push(Text::new(Point2::new(0, -40), 0, 100, "U1", ObjectFlags::NONE));
        let h = editor.board.add_element(element);
        let before = editor.board.element(h).unwrap().clone();

        editor.move_entity(EntityRef::Element(h), Vector2::new(100, 50)).unwrap();
        let moved = editor.board.element(h).unwrap();
        assert_eq!(moved.pins[0].position, Point2::new(110, 50));
        assert_eq!(moved.pads[0].point2, Point2::new(100, 70));
        assert_eq!(moved.names[0].position, Point2::new(100, 10));
        assert_eq!(moved.mark, Point2::new(100, 50));
        assert_eq!(moved.bbox, moved.compute_bounding_box());
        // 元件整体擦除后重绘名称、丝印和引脚
        assert_eq!(editor.renderer.count(RenderOp::Erase), 1);
        assert_eq!(editor.renderer.count(RenderOp::Draw), 3);
        assert_eq!(editor.renderer.flushes(), 1);

        editor.move_entity(EntityRef::Element(h), Vector2::new(-100, -50)).unwrap();
        assert_eq!(editor.board.element(h).unwrap(), &before);
    }

    #[test]
    fn test_back_side_element_is_not_drawn() {
        let (mut editor, _) = editor();
        editor.board.visibility.pins_on = false;
        let h = editor
            .board
            .add_element(Element::new(Point2::new(0, 0), ObjectFlags::new(ObjectFlags::ON_SOLDER)));
        editor.move_entity(EntityRef::Element(h), Vector2::new(1, 1)).unwrap();
        assert!(editor.renderer.events.is_empty());
        assert_eq!(editor.board.element(h).unwrap().mark, Point2::new(1, 1));
    }

    #[test]
    fn test_move_element_name_only() {
        let (mut editor, _) = editor();
        let mut element = Element::new(Point2::new(0, 0), ObjectFlags::NONE);
        element
            .names
            .push(Text::new(Point2::new(0, 0), 0, 100, "R1", ObjectFlags::NONE));
        element.pins.push(Pin::new(Point2::new(0, 0), 20, 5, 0, 8, "1", ObjectFlags::NONE));
        let h = editor.board.add_element(element);

        editor.move_entity(EntityRef::ElementName(h), Vector2::new(0, 500)).unwrap();
        let element = editor.board.element(h).unwrap();
        assert_eq!(element.names[0].position, Point2::new(0, 500));
        assert_eq!(element.pins[0].position, Point2::new(0, 0));
    }

    #[test]
    fn test_move_rat_point_respects_rat_visibility() {
        let (mut editor, _) = editor();
        editor.board.visibility.rats_on = false;
        let h = editor.board.add_rat(Rat::new(Point2::new(0, 0), Point2::new(10, 10), 0, 0, 1));
        let result = editor
            .move_entity(
                EntityRef::RatPoint {
                    rat: h,
                    end: Endpoint::Point2,
                },
                Vector2::new(5, 0),
            )
            .unwrap();
        assert!(result.is_some());
        assert_eq!(editor.board.rat(h).unwrap().point2, Point2::new(15, 10));
        assert!(editor.renderer.events.is_empty());
    }

    #[test]
    fn test_polygon_point_compaction_redraws_once() {
        let (mut editor, top) = editor();
        let h = editor
            .board
            .add_polygon(
                top,
                Polygon::new(
                    vec![
                        Point2::new(0, 0),
                        Point2::new(50, 10),
                        Point2::new(100, 0),
                        Point2::new(100, 100),
                        Point2::new(0, 100),
                    ],
                    ObjectFlags::NONE,
                ),
            )
            .unwrap();

        // 把第二个顶点拉回到底边上，成为共线点
        editor
            .move_entity(
                EntityRef::PolygonPoint {
                    layer: top,
                    polygon: h,
                    point: 1,
                },
                Vector2::new(0, -10),
            )
            .unwrap();

        let polygon = editor.board.polygon(top, h).unwrap();
        assert_eq!(polygon.points.len(), 4);
        assert_eq!(polygon.bbox, polygon.compute_bounding_box());
        assert_eq!(editor.renderer.count_kind(RenderOp::Draw, EntityKind::Polygon), 1);
        assert_eq!(editor.renderer.flushes(), 1);
    }

    #[test]
    fn test_polygon_point_out_of_range() {
        let (mut editor, top) = editor();
        let h = editor
            .board
            .add_polygon(
                top,
                Polygon::new(
                    vec![Point2::new(0, 0), Point2::new(10, 0), Point2::new(0, 10)],
                    ObjectFlags::NONE,
                ),
            )
            .unwrap();
        let result = editor.move_polygon_point(top, h, 7, &MoveContext {
            offset: Vector2::new(1, 1),
        });
        assert!(matches!(result, Err(EditError::IndexOutOfRange { index: 7, .. })));
    }
}
