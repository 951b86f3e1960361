//! 坐标查找
//!
//! 按类型掩码在给定坐标处查找实体。板上对象数量有限，逐个扫描即可。

use crate::board::Board;
use crate::dispatch::{EntityKind, EntityRef, KindMask};
use crate::entity::Endpoint;
use crate::math::{distance_squared, segment_distance_squared, Point2};
use crate::polygon::point_in_polygon;

/// 查找坐标处的第一个实体
///
/// 查找顺序：过孔、引脚、焊盘、走线端点、走线、圆弧、文字、覆铜顶点、覆铜、元件名称、元件、飞线端点、飞线。
pub fn find_entity_at(board: &Board, mask: KindMask, point: &Point2) -> Option<EntityRef> {
    if mask.contains(EntityKind::Via) {
        if let Some((h, _)) = board.vias.iter().find(|(_, via)| via.covers(point)) {
            return Some(EntityRef::Via(h));
        }
    }
    if mask.contains(EntityKind::Pin) {
        for (h, element) in board.elements.iter() {
            if let Some(pin) = element.pins.iter().position(|pin| pin.covers(point)) {
                return Some(EntityRef::Pin { element: h, pin });
            }
        }
    }
    if mask.contains(EntityKind::Pad) {
        for (h, element) in board.elements.iter() {
            let hit = element.pads.iter().position(|pad| {
                let r = pad.thickness as f64 / 2.0;
                segment_distance_squared(point, &pad.point1, &pad.point2) <= r * r
            });
            if let Some(pad) = hit {
                return Some(EntityRef::Pad { element: h, pad });
            }
        }
    }

    for layer_id in board.layer_ids() {
        let layer = &board.layers[layer_id.index()];
        if mask.contains(EntityKind::LinePoint) {
            for (line, l) in layer.lines.iter() {
                for end in [Endpoint::Point1, Endpoint::Point2] {
                    if l.point(end) == *point {
                        return Some(EntityRef::LinePoint {
                            layer: layer_id,
                            line,
                            end,
                        });
                    }
                }
            }
        }
        if mask.contains(EntityKind::Line) {
            let hit = layer.lines.iter().find(|(_, l)| {
                let r = l.thickness as f64 / 2.0;
                segment_distance_squared(point, &l.point1, &l.point2) <= r * r
            });
            if let Some((line, _)) = hit {
                return Some(EntityRef::Line { layer: layer_id, line });
            }
        }
        if mask.contains(EntityKind::Arc) {
            if let Some((arc, _)) = layer.arcs.iter().find(|(_, a)| a.bbox.contains(point)) {
                return Some(EntityRef::Arc { layer: layer_id, arc });
            }
        }
        if mask.contains(EntityKind::Text) {
            if let Some((text, _)) = layer.texts.iter().find(|(_, t)| t.bbox.contains(point)) {
                return Some(EntityRef::Text { layer: layer_id, text });
            }
        }
        if mask.contains(EntityKind::PolygonPoint) {
            for (polygon, p) in layer.polygons.iter() {
                if let Some(index) = p.points.iter().position(|v| v == point) {
                    return Some(EntityRef::PolygonPoint {
                        layer: layer_id,
                        polygon,
                        point: index,
                    });
                }
            }
        }
        if mask.contains(EntityKind::Polygon) {
            if let Some((polygon, _)) = layer.polygons.iter().find(|(_, p)| point_in_polygon(point, p)) {
                return Some(EntityRef::Polygon { layer: layer_id, polygon });
            }
        }
    }

    if mask.contains(EntityKind::ElementName) {
        let hit = board
            .elements
            .iter()
            .find(|(_, e)| e.names.iter().any(|t| t.bbox.contains(point)));
        if let Some((h, _)) = hit {
            return Some(EntityRef::ElementName(h));
        }
    }
    if mask.contains(EntityKind::Element) {
        if let Some((h, _)) = board.elements.iter().find(|(_, e)| e.bbox.contains(point)) {
            return Some(EntityRef::Element(h));
        }
    }
    if mask.contains(EntityKind::RatPoint) {
        for (rat, r) in board.rats.iter() {
            for end in [Endpoint::Point1, Endpoint::Point2] {
                if r.point(end) == *point {
                    return Some(EntityRef::RatPoint { rat, end });
                }
            }
        }
    }
    if mask.contains(EntityKind::Rat) {
        let hit = board.rats.iter().find(|(_, r)| {
            let reach = r.thickness as f64 / 2.0;
            segment_distance_squared(point, &r.point1, &r.point2) <= reach * reach
        });
        if let Some((h, _)) = hit {
            return Some(EntityRef::Rat(h));
        }
    }
    None
}

/// 坐标处是否已有引脚或过孔
pub fn pin_or_via_at(board: &Board, point: &Point2) -> bool {
    find_entity_at(board, KindMask::PIN_TYPES, point).is_some()
}

/// 中心与坐标完全重合的引脚或过孔数量
pub fn anchors_at(board: &Board, point: &Point2) -> usize {
    board
        .pins_and_vias()
        .filter(|pin| distance_squared(&pin.position, point) == 0)
        .count()
}
