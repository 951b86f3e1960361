//! 电路板实体存储
//!
//! 电路板拥有有序的铜层、元件、过孔、飞线以及全局设置和显示开关。
//! 层上实体保存在各层按类型划分的分代存储中，其余实体保存在板级存储中。

use crate::arena::{Arena, Handle};
use crate::dispatch::{EntityKind, EntityRef, ObjectRef};
use crate::entity::ObjectId;
use crate::error::EditError;
use crate::flags::{ObjectFlags, MAX_LAYERS};
use crate::geometry::{Arc, Element, Line, Pin, Polygon, Rat, Text, Via};
use crate::layer::{GroupId, Layer, LayerGroups, LayerId};
use crate::math::{distance_squared, Coord, Point2};
use crate::settings::{Settings, Visibility};
use crate::undo::Snapshot;

/// 电路板
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub layers: Vec<Layer>,
    pub groups: LayerGroups,
    pub vias: Arena<Via>,
    pub elements: Arena<Element>,
    pub rats: Arena<Rat>,
    pub settings: Settings,
    pub visibility: Visibility,
}

impl Board {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// 追加一个铜层并指定层组
    pub fn add_layer(&mut self, name: impl Into<String>, group: GroupId) -> Result<LayerId, EditError> {
        if self.layers.len() >= MAX_LAYERS {
            return Err(EditError::TooManyLayers(MAX_LAYERS));
        }
        let id = LayerId(self.layers.len() as u16);
        self.layers.push(Layer::new(name));
        self.groups.push(group);
        Ok(id)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> {
        (0..self.layers.len() as u16).map(LayerId)
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer, EditError> {
        self.layers.get(id.index()).ok_or(EditError::UnknownLayer(id))
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, EditError> {
        self.layers.get_mut(id.index()).ok_or(EditError::UnknownLayer(id))
    }

    /// 图层是否显示
    pub fn is_layer_on(&self, id: LayerId) -> Result<bool, EditError> {
        Ok(self.layer(id)?.on)
    }

    // === 类型化访问 ===

    pub fn line(&self, layer: LayerId, h: Handle<Line>) -> Result<&Line, EditError> {
        self.layer(layer)?.lines.get(h).ok_or(EditError::StaleHandle(EntityKind::Line))
    }

    pub fn line_mut(&mut self, layer: LayerId, h: Handle<Line>) -> Result<&mut Line, EditError> {
        self.layer_mut(layer)?
            .lines
            .get_mut(h)
            .ok_or(EditError::StaleHandle(EntityKind::Line))
    }

    pub fn arc(&self, layer: LayerId, h: Handle<Arc>) -> Result<&Arc, EditError> {
        self.layer(layer)?.arcs.get(h).ok_or(EditError::StaleHandle(EntityKind::Arc))
    }

    pub fn arc_mut(&mut self, layer: LayerId, h: Handle<Arc>) -> Result<&mut Arc, EditError> {
        self.layer_mut(layer)?
            .arcs
            .get_mut(h)
            .ok_or(EditError::StaleHandle(EntityKind::Arc))
    }

    pub fn text(&self, layer: LayerId, h: Handle<Text>) -> Result<&Text, EditError> {
        self.layer(layer)?.texts.get(h).ok_or(EditError::StaleHandle(EntityKind::Text))
    }

    pub fn text_mut(&mut self, layer: LayerId, h: Handle<Text>) -> Result<&mut Text, EditError> {
        self.layer_mut(layer)?
            .texts
            .get_mut(h)
            .ok_or(EditError::StaleHandle(EntityKind::Text))
    }

    pub fn polygon(&self, layer: LayerId, h: Handle<Polygon>) -> Result<&Polygon, EditError> {
        self.layer(layer)?
            .polygons
            .get(h)
            .ok_or(EditError::StaleHandle(EntityKind::Polygon))
    }

    pub fn polygon_mut(&mut self, layer: LayerId, h: Handle<Polygon>) -> Result<&mut Polygon, EditError> {
        self.layer_mut(layer)?
            .polygons
            .get_mut(h)
            .ok_or(EditError::StaleHandle(EntityKind::Polygon))
    }

    pub fn via(&self, h: Handle<Via>) -> Result<&Via, EditError> {
        self.vias.get(h).ok_or(EditError::StaleHandle(EntityKind::Via))
    }

    pub fn via_mut(&mut self, h: Handle<Via>) -> Result<&mut Via, EditError> {
        self.vias.get_mut(h).ok_or(EditError::StaleHandle(EntityKind::Via))
    }

    pub fn element(&self, h: Handle<Element>) -> Result<&Element, EditError> {
        self.elements.get(h).ok_or(EditError::StaleHandle(EntityKind::Element))
    }

    pub fn element_mut(&mut self, h: Handle<Element>) -> Result<&mut Element, EditError> {
        self.elements.get_mut(h).ok_or(EditError::StaleHandle(EntityKind::Element))
    }

    pub fn rat(&self, h: Handle<Rat>) -> Result<&Rat, EditError> {
        self.rats.get(h).ok_or(EditError::StaleHandle(EntityKind::Rat))
    }

    pub fn rat_mut(&mut self, h: Handle<Rat>) -> Result<&mut Rat, EditError> {
        self.rats.get_mut(h).ok_or(EditError::StaleHandle(EntityKind::Rat))
    }

    // === 创建 ===

    pub fn add_line(&mut self, layer: LayerId, line: Line) -> Result<Handle<Line>, EditError> {
        Ok(self.layer_mut(layer)?.lines.insert(line))
    }

    /// 在图层上新建走线
    pub fn create_line(
        &mut self,
        layer: LayerId,
        point1: Point2,
        point2: Point2,
        thickness: Coord,
        clearance: Coord,
        flags: ObjectFlags,
    ) -> Result<Handle<Line>, EditError> {
        self.add_line(layer, Line::new(point1, point2, thickness, clearance, flags))
    }

    pub fn add_arc(&mut self, layer: LayerId, arc: Arc) -> Result<Handle<Arc>, EditError> {
        Ok(self.layer_mut(layer)?.arcs.insert(arc))
    }

    /// 添加文字；焊接面标志按所在层重新确定
    pub fn add_text(&mut self, layer: LayerId, mut text: Text) -> Result<Handle<Text>, EditError> {
        text.flags.set(ObjectFlags::ON_SOLDER, self.groups.is_solder_side(layer));
        text.update_bounding_box();
        Ok(self.layer_mut(layer)?.texts.insert(text))
    }

    pub fn add_polygon(&mut self, layer: LayerId, polygon: Polygon) -> Result<Handle<Polygon>, EditError> {
        Ok(self.layer_mut(layer)?.polygons.insert(polygon))
    }

    pub fn add_element(&mut self, mut element: Element) -> Handle<Element> {
        element.update_bounding_box();
        self.elements.insert(element)
    }

    pub fn add_rat(&mut self, rat: Rat) -> Handle<Rat> {
        self.rats.insert(rat)
    }

    pub fn add_via(&mut self, via: Via) -> Handle<Via> {
        self.vias.insert(via)
    }

    /// 新建过孔；与已有过孔或元件引脚重叠时创建失败
    #[allow(clippy::too_many_arguments)]
    pub fn create_via(
        &mut self,
        position: Point2,
        thickness: Coord,
        clearance: Coord,
        mask: Coord,
        drilling_hole: Coord,
        name: &str,
        flags: ObjectFlags,
    ) -> Option<Handle<Via>> {
        let overlaps = self.pins_and_vias().any(|pin| {
            let reach = (pin.thickness / 2 + thickness / 2) as i128;
            distance_squared(&pin.position, &position) <= reach * reach
        });
        if overlaps {
            tracing::debug!(x = position.x, y = position.y, "via creation refused: overlaps existing pin or via");
            return None;
        }
        Some(self.vias.insert(Pin::new(
            position,
            thickness,
            clearance,
            mask,
            drilling_hole,
            name,
            flags,
        )))
    }

    // === 换层底层操作 ===
    //
    // 先确认目标层存在，再从源层取出、放入目标层；源句柄随即失效。

    pub(crate) fn relocate_line(&mut self, src: LayerId, h: Handle<Line>, dest: LayerId) -> Result<Handle<Line>, EditError> {
        self.layer(dest)?;
        let line = self
            .layer_mut(src)?
            .lines
            .remove(h)
            .ok_or(EditError::StaleHandle(EntityKind::Line))?;
        Ok(self.layer_mut(dest)?.lines.insert(line))
    }

    pub(crate) fn relocate_arc(&mut self, src: LayerId, h: Handle<Arc>, dest: LayerId) -> Result<Handle<Arc>, EditError> {
        self.layer(dest)?;
        let arc = self
            .layer_mut(src)?
            .arcs
            .remove(h)
            .ok_or(EditError::StaleHandle(EntityKind::Arc))?;
        Ok(self.layer_mut(dest)?.arcs.insert(arc))
    }

    /// 文字换层后重新确定镜像标志，并重算包围盒（镜像后外形不同）
    pub(crate) fn relocate_text(&mut self, src: LayerId, h: Handle<Text>, dest: LayerId) -> Result<Handle<Text>, EditError> {
        self.layer(dest)?;
        let mut text = self
            .layer_mut(src)?
            .texts
            .remove(h)
            .ok_or(EditError::StaleHandle(EntityKind::Text))?;
        text.flags.set(ObjectFlags::ON_SOLDER, self.groups.is_solder_side(dest));
        text.update_bounding_box();
        Ok(self.layer_mut(dest)?.texts.insert(text))
    }

    pub(crate) fn relocate_polygon(
        &mut self,
        src: LayerId,
        h: Handle<Polygon>,
        dest: LayerId,
    ) -> Result<Handle<Polygon>, EditError> {
        self.layer(dest)?;
        let polygon = self
            .layer_mut(src)?
            .polygons
            .remove(h)
            .ok_or(EditError::StaleHandle(EntityKind::Polygon))?;
        Ok(self.layer_mut(dest)?.polygons.insert(polygon))
    }

    // === 引用校验与解析 ===

    /// 引用是否仍然指向存活实体
    pub fn contains(&self, target: &EntityRef) -> bool {
        match *target {
            EntityRef::Line { layer, line } | EntityRef::LinePoint { layer, line, .. } => self.line(layer, line).is_ok(),
            EntityRef::Text { layer, text } => self.text(layer, text).is_ok(),
            EntityRef::Polygon { layer, polygon } => self.polygon(layer, polygon).is_ok(),
            EntityRef::PolygonPoint { layer, polygon, point } => {
                self.polygon(layer, polygon).map(|p| point < p.points.len()).unwrap_or(false)
            }
            EntityRef::Arc { layer, arc } => self.arc(layer, arc).is_ok(),
            EntityRef::Via(via) => self.vias.contains(via),
            EntityRef::Element(element) | EntityRef::ElementName(element) => self.elements.contains(element),
            EntityRef::Pin { element, pin } => self.element(element).map(|e| pin < e.pins.len()).unwrap_or(false),
            EntityRef::Pad { element, pad } => self.element(element).map(|e| pad < e.pads.len()).unwrap_or(false),
            EntityRef::Rat(rat) | EntityRef::RatPoint { rat, .. } => self.rats.contains(rat),
        }
    }

    /// 引用无效时返回 [`EditError::StaleHandle`]
    pub fn validate(&self, target: &EntityRef) -> Result<(), EditError> {
        if self.contains(target) {
            Ok(())
        } else {
            Err(EditError::StaleHandle(target.kind()))
        }
    }

    pub fn find_line(&self, id: ObjectId) -> Option<(LayerId, Handle<Line>)> {
        self.layer_ids()
            .find_map(|l| self.layers[l.index()].lines.find(|x| x.id == id).map(|h| (l, h)))
    }

    pub fn find_arc(&self, id: ObjectId) -> Option<(LayerId, Handle<Arc>)> {
        self.layer_ids()
            .find_map(|l| self.layers[l.index()].arcs.find(|x| x.id == id).map(|h| (l, h)))
    }

    pub fn find_text(&self, id: ObjectId) -> Option<(LayerId, Handle<Text>)> {
        self.layer_ids()
            .find_map(|l| self.layers[l.index()].texts.find(|x| x.id == id).map(|h| (l, h)))
    }

    pub fn find_polygon(&self, id: ObjectId) -> Option<(LayerId, Handle<Polygon>)> {
        self.layer_ids()
            .find_map(|l| self.layers[l.index()].polygons.find(|x| x.id == id).map(|h| (l, h)))
    }

    pub fn find_via(&self, id: ObjectId) -> Option<Handle<Via>> {
        self.vias.find(|v| v.id == id)
    }

    pub fn find_element(&self, id: ObjectId) -> Option<Handle<Element>> {
        self.elements.find(|e| e.id == id)
    }

    pub fn find_pin(&self, id: ObjectId) -> Option<(Handle<Element>, usize)> {
        self.elements
            .iter()
            .find_map(|(h, e)| e.pins.iter().position(|p| p.id == id).map(|i| (h, i)))
    }

    pub fn find_pad(&self, id: ObjectId) -> Option<(Handle<Element>, usize)> {
        self.elements
            .iter()
            .find_map(|(h, e)| e.pads.iter().position(|p| p.id == id).map(|i| (h, i)))
    }

    pub fn find_rat(&self, id: ObjectId) -> Option<Handle<Rat>> {
        self.rats.find(|r| r.id == id)
    }

    /// 把稳定ID引用解析为当前存储句柄
    pub fn resolve(&self, target: &ObjectRef) -> Result<EntityRef, EditError> {
        let id = target.id();
        let found = match *target {
            ObjectRef::Line(id) => self.find_line(id).map(|(layer, line)| EntityRef::Line { layer, line }),
            ObjectRef::LinePoint(id, end) => self
                .find_line(id)
                .map(|(layer, line)| EntityRef::LinePoint { layer, line, end }),
            ObjectRef::Arc(id) => self.find_arc(id).map(|(layer, arc)| EntityRef::Arc { layer, arc }),
            ObjectRef::Text(id) => self.find_text(id).map(|(layer, text)| EntityRef::Text { layer, text }),
            ObjectRef::Polygon(id) => self
                .find_polygon(id)
                .map(|(layer, polygon)| EntityRef::Polygon { layer, polygon }),
            ObjectRef::PolygonPoint(id, point) => self
                .find_polygon(id)
                .map(|(layer, polygon)| EntityRef::PolygonPoint { layer, polygon, point }),
            ObjectRef::Via(id) => self.find_via(id).map(EntityRef::Via),
            ObjectRef::Element(id) => self.find_element(id).map(EntityRef::Element),
            ObjectRef::ElementName(id) => self.find_element(id).map(EntityRef::ElementName),
            ObjectRef::Pin(id) => self.find_pin(id).map(|(element, pin)| EntityRef::Pin { element, pin }),
            ObjectRef::Pad(id) => self.find_pad(id).map(|(element, pad)| EntityRef::Pad { element, pad }),
            ObjectRef::Rat(id) => self.find_rat(id).map(EntityRef::Rat),
            ObjectRef::RatPoint(id, end) => self.find_rat(id).map(|rat| EntityRef::RatPoint { rat, end }),
        };
        found.ok_or(EditError::ObjectNotFound(id))
    }

    /// 把存储句柄转换为稳定ID引用
    pub fn object_ref(&self, target: &EntityRef) -> Result<ObjectRef, EditError> {
        Ok(match *target {
            EntityRef::Line { layer, line } => ObjectRef::Line(self.line(layer, line)?.id),
            EntityRef::LinePoint { layer, line, end } => ObjectRef::LinePoint(self.line(layer, line)?.id, end),
            EntityRef::Arc { layer, arc } => ObjectRef::Arc(self.arc(layer, arc)?.id),
            EntityRef::Text { layer, text } => ObjectRef::Text(self.text(layer, text)?.id),
            EntityRef::Polygon { layer, polygon } => ObjectRef::Polygon(self.polygon(layer, polygon)?.id),
            EntityRef::PolygonPoint { layer, polygon, point } => {
                ObjectRef::PolygonPoint(self.polygon(layer, polygon)?.id, point)
            }
            EntityRef::Via(via) => ObjectRef::Via(self.via(via)?.id),
            EntityRef::Element(element) => ObjectRef::Element(self.element(element)?.id),
            EntityRef::ElementName(element) => ObjectRef::ElementName(self.element(element)?.id),
            EntityRef::Pin { element, pin } => {
                let element = self.element(element)?;
                let pin = element.pins.get(pin).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pin,
                    owner: element.id,
                    index: pin,
                })?;
                ObjectRef::Pin(pin.id)
            }
            EntityRef::Pad { element, pad } => {
                let element = self.element(element)?;
                let pad = element.pads.get(pad).ok_or(EditError::IndexOutOfRange {
                    kind: EntityKind::Pad,
                    owner: element.id,
                    index: pad,
                })?;
                ObjectRef::Pad(pad.id)
            }
            EntityRef::Rat(rat) => ObjectRef::Rat(self.rat(rat)?.id),
            EntityRef::RatPoint { rat, end } => ObjectRef::RatPoint(self.rat(rat)?.id, end),
        })
    }

    // === 删除与恢复（撤销用） ===

    /// 从存储中取出实体
    pub fn remove(&mut self, target: &EntityRef) -> Result<Snapshot, EditError> {
        let stale = EditError::StaleHandle(target.kind());
        Ok(match *target {
            EntityRef::Line { layer, line } => Snapshot::Line {
                layer,
                line: self.layer_mut(layer)?.lines.remove(line).ok_or(stale)?,
            },
            EntityRef::Arc { layer, arc } => Snapshot::Arc {
                layer,
                arc: self.layer_mut(layer)?.arcs.remove(arc).ok_or(stale)?,
            },
            EntityRef::Text { layer, text } => Snapshot::Text {
                layer,
                text: self.layer_mut(layer)?.texts.remove(text).ok_or(stale)?,
            },
            EntityRef::Polygon { layer, polygon } => Snapshot::Polygon {
                layer,
                polygon: self.layer_mut(layer)?.polygons.remove(polygon).ok_or(stale)?,
            },
            EntityRef::Via(via) => Snapshot::Via(self.vias.remove(via).ok_or(stale)?),
            EntityRef::Element(element) => Snapshot::Element(self.elements.remove(element).ok_or(stale)?),
            EntityRef::Rat(rat) => Snapshot::Rat(self.rats.remove(rat).ok_or(stale)?),
            _ => return Err(EditError::NotRemovable(target.kind())),
        })
    }

    /// 把取出的实体放回存储，返回新句柄
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<EntityRef, EditError> {
        Ok(match snapshot {
            Snapshot::Line { layer, line } => EntityRef::Line {
                layer,
                line: self.add_line(layer, line)?,
            },
            Snapshot::Arc { layer, arc } => EntityRef::Arc {
                layer,
                arc: self.add_arc(layer, arc)?,
            },
            Snapshot::Text { layer, text } => EntityRef::Text {
                layer,
                text: self.layer_mut(layer)?.texts.insert(text),
            },
            Snapshot::Polygon { layer, polygon } => EntityRef::Polygon {
                layer,
                polygon: self.add_polygon(layer, polygon)?,
            },
            Snapshot::Via(via) => EntityRef::Via(self.vias.insert(via)),
            Snapshot::Element(element) => EntityRef::Element(self.elements.insert(element)),
            Snapshot::Rat(rat) => EntityRef::Rat(self.rats.insert(rat)),
        })
    }

    // === 选择 ===

    /// 当前选中的实体：按层给出走线、圆弧、文字、覆铜，然后是过孔、元件、飞线
    pub fn selected(&self) -> Vec<EntityRef> {
        let is_selected = |flags: &ObjectFlags| flags.contains(ObjectFlags::SELECTED);
        let mut result = Vec::new();
        for layer_id in self.layer_ids() {
            let layer = &self.layers[layer_id.index()];
            result.extend(
                layer
                    .lines
                    .iter()
                    .filter(|(_, x)| is_selected(&x.flags))
                    .map(|(line, _)| EntityRef::Line { layer: layer_id, line }),
            );
            result.extend(
                layer
                    .arcs
                    .iter()
                    .filter(|(_, x)| is_selected(&x.flags))
                    .map(|(arc, _)| EntityRef::Arc { layer: layer_id, arc }),
            );
            result.extend(
                layer
                    .texts
                    .iter()
                    .filter(|(_, x)| is_selected(&x.flags))
                    .map(|(text, _)| EntityRef::Text { layer: layer_id, text }),
            );
            result.extend(
                layer
                    .polygons
                    .iter()
                    .filter(|(_, x)| is_selected(&x.flags))
                    .map(|(polygon, _)| EntityRef::Polygon { layer: layer_id, polygon }),
            );
        }
        result.extend(self.vias.iter().filter(|(_, v)| is_selected(&v.flags)).map(|(h, _)| EntityRef::Via(h)));
        result.extend(
            self.elements
                .iter()
                .filter(|(_, e)| is_selected(&e.flags))
                .map(|(h, _)| EntityRef::Element(h)),
        );
        result.extend(self.rats.iter().filter(|(_, r)| is_selected(&r.flags)).map(|(h, _)| EntityRef::Rat(h)));
        result
    }

    /// 板上所有元件引脚和过孔
    pub fn pins_and_vias(&self) -> impl Iterator<Item = &Pin> {
        self.elements
            .values()
            .flat_map(|e| e.pins.iter())
            .chain(self.vias.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer_board() -> (Board, LayerId, LayerId) {
        let mut board = Board::new(Settings::default());
        let top = board.add_layer("component", GroupId(0)).unwrap();
        let bottom = board.add_layer("solder", GroupId(1)).unwrap();
        board.groups.component = Some(GroupId(0));
        board.groups.solder = Some(GroupId(1));
        (board, top, bottom)
    }

    #[test]
    fn test_create_via_refuses_pin_overlap() {
        let mut board = Board::new(Settings::default());
        let mut element = Element::new(Point2::new(0, 0), ObjectFlags::NONE);
        element
            .pins
            .push(Pin::new(Point2::new(0, 0), 6000, 1000, 0, 2800, "1", ObjectFlags::new(ObjectFlags::PIN)));
        board.add_element(element);
        let flags = ObjectFlags::new(ObjectFlags::VIA);

        assert!(board.create_via(Point2::new(2000, 0), 6000, 1000, 0, 2800, "", flags).is_none());
        assert!(board.vias.is_empty());
        assert!(board.create_via(Point2::new(20000, 0), 6000, 1000, 0, 2800, "", flags).is_some());
        assert!(board.create_via(Point2::new(21000, 0), 6000, 1000, 0, 2800, "", flags).is_none());
        assert_eq!(board.vias.len(), 1);
    }

    #[test]
    fn test_layer_limit() {
        let mut board = Board::new(Settings::default());
        for i in 0..MAX_LAYERS {
            board.add_layer(format!("L{}", i), GroupId(i as u16)).unwrap();
        }
        assert!(matches!(
            board.add_layer("extra", GroupId(0)),
            Err(EditError::TooManyLayers(_))
        ));
    }

    #[test]
    fn test_relocate_invalidates_source_handle() {
        let (mut board, top, bottom) = two_layer_board();
        let a = board
            .create_line(top, Point2::new(0, 0), Point2::new(10, 0), 10, 0, ObjectFlags::NONE)
            .unwrap();
        let moved = board.relocate_line(top, a, bottom).unwrap();

        assert!(board.line(top, a).is_err());
        assert!(board.line(bottom, moved).is_ok());
        assert!(board.layer(top).unwrap().lines.is_empty());
    }

    #[test]
    fn test_relocate_to_unknown_layer_keeps_source() {
        let (mut board, top, _) = two_layer_board();
        let a = board
            .create_line(top, Point2::new(0, 0), Point2::new(10, 0), 10, 0, ObjectFlags::NONE)
            .unwrap();
        assert!(matches!(
            board.relocate_line(top, a, LayerId(9)),
            Err(EditError::UnknownLayer(_))
        ));
        assert!(board.line(top, a).is_ok());
    }

    #[test]
    fn test_text_on_solder_layer_is_mirrored() {
        let (mut board, top, bottom) = two_layer_board();
        let t = board
            .add_text(bottom, Text::new(Point2::new(0, 0), 0, 100, "X", ObjectFlags::NONE))
            .unwrap();
        assert!(board.text(bottom, t).unwrap().on_solder());

        let moved = board.relocate_text(bottom, t, top).unwrap();
        let text = board.text(top, moved).unwrap();
        assert!(!text.on_solder());
        assert_eq!(text.bbox, text.compute_bounding_box());
    }

    #[test]
    fn test_create_via_refuses_overlap() {
        let (mut board, _, _) = two_layer_board();
        let flags = ObjectFlags::new(ObjectFlags::VIA);
        assert!(board.create_via(Point2::new(0, 0), 100, 10, 0, 40, "", flags).is_some());
        assert!(board.create_via(Point2::new(50, 0), 100, 10, 0, 40, "", flags).is_none());
        assert!(board.create_via(Point2::new(500, 0), 100, 10, 0, 40, "", flags).is_some());
    }

    #[test]
    fn test_resolve_roundtrip_and_removal() {
        let (mut board, top, _) = two_layer_board();
        let h = board
            .create_line(top, Point2::new(0, 0), Point2::new(10, 0), 10, 0, ObjectFlags::NONE)
            .unwrap();
        let target = EntityRef::Line { layer: top, line: h };
        let object = board.object_ref(&target).unwrap();
        assert_eq!(board.resolve(&object).unwrap(), target);

        let snapshot = board.remove(&target).unwrap();
        assert!(matches!(board.resolve(&object), Err(EditError::ObjectNotFound(_))));

        let restored = board.restore(snapshot).unwrap();
        assert_eq!(board.resolve(&object).unwrap(), restored);
    }

    #[test]
    fn test_selected_lists_layer_objects_first() {
        let (mut board, top, _) = two_layer_board();
        let selected = ObjectFlags::new(ObjectFlags::SELECTED);
        let via = board
            .create_via(Point2::new(0, 0), 100, 10, 0, 40, "", selected.with(ObjectFlags::VIA))
            .unwrap();
        let line = board
            .create_line(top, Point2::new(0, 0), Point2::new(10, 0), 10, 0, selected)
            .unwrap();
        board
            .create_line(top, Point2::new(0, 0), Point2::new(0, 10), 10, 0, ObjectFlags::NONE)
            .unwrap();

        assert_eq!(
            board.selected(),
            vec![EntityRef::Line { layer: top, line }, EntityRef::Via(via)]
        );
    }
}
