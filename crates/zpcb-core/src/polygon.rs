//! 覆铜维护
//!
//! - 点是否落在覆铜内
//! - 多余顶点压缩（重复点、共线点）
//! - 引脚/过孔的覆铜包含标志重算
//! - 覆铜换层时的热焊盘标志迁移

use crate::arena::Handle;
use crate::board::Board;
use crate::dispatch::ObjectRef;
use crate::editor::Editor;
use crate::error::EditError;
use crate::flags::LayerMask;
use crate::geometry::{Element, Pin, Polygon, Via};
use crate::layer::LayerId;
use crate::math::Point2;
use crate::render::{Drawable, Renderer};
use crate::undo::{FlagState, UndoRecord};

/// 覆铜至少保留的顶点数
pub const MIN_POLYGON_POINTS: usize = 3;

/// 射线法判断点是否在多边形内
pub fn point_in_polygon(point: &Point2, polygon: &Polygon) -> bool {
    let points = &polygon.points;
    if points.len() < MIN_POLYGON_POINTS || !polygon.bbox.contains(point) {
        return false;
    }
    let (px, py) = (point.x as f64, point.y as f64);
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = (points[i].x as f64, points[i].y as f64);
        let (xj, yj) = (points[j].x as f64, points[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(a: &Point2, b: &Point2, c: &Point2) -> i128 {
    let ab = (b.x as i128 - a.x as i128, b.y as i128 - a.y as i128);
    let ac = (c.x as i128 - a.x as i128, c.y as i128 - a.y as i128);
    ab.0 * ac.1 - ab.1 * ac.0
}

/// 去掉与前一点重合的点以及落在相邻两点连线上的点（环首尾相接）
///
/// 结果至少保留 [`MIN_POLYGON_POINTS`] 个点；不足时原样返回。
pub fn reduce_points(points: &[Point2]) -> Vec<Point2> {
    let mut ring = points.to_vec();
    loop {
        if ring.len() <= MIN_POLYGON_POINTS {
            return ring;
        }
        let n = ring.len();
        let redundant = (0..n).find(|&i| {
            let prev = &ring[(i + n - 1) % n];
            let next = &ring[(i + 1) % n];
            ring[i] == *prev || cross(prev, &ring[i], next) == 0
        });
        match redundant {
            Some(i) => {
                ring.remove(i);
            }
            None => return ring,
        }
    }
}

/// 计算某点在各层覆铜中的包含掩码
pub fn pip_mask_at(board: &Board, point: &Point2) -> LayerMask {
    let mut mask = LayerMask::NONE;
    for layer_id in board.layer_ids() {
        let layer = &board.layers[layer_id.index()];
        if layer.polygons.values().any(|p| point_in_polygon(point, p)) {
            mask.set(layer_id.index(), true);
        }
    }
    mask
}

/// 覆铜包含标志的重算范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipScope {
    /// 单个过孔，所有层
    Via(Handle<Via>),
    /// 元件的全部引脚，所有层
    Element(Handle<Element>),
    /// 全部引脚和过孔，只重算一层
    Layer(LayerId),
}

#[derive(Debug, Clone, Copy)]
enum PinSlot {
    Via(Handle<Via>),
    Pin(Handle<Element>, usize),
}

fn pin_state(pin: &Pin) -> FlagState {
    FlagState {
        flags: pin.flags,
        thermal: pin.thermal,
        pip: pin.pip,
    }
}

impl Board {
    fn pin_slot_mut(&mut self, slot: PinSlot) -> Result<&mut Pin, EditError> {
        match slot {
            PinSlot::Via(h) => self.via_mut(h),
            PinSlot::Pin(element, index) => {
                let element = self.element_mut(element)?;
                let owner = element.id;
                element.pins.get_mut(index).ok_or(EditError::IndexOutOfRange {
                    kind: crate::dispatch::EntityKind::Pin,
                    owner,
                    index,
                })
            }
        }
    }

    fn pin_slots(&self) -> Vec<(PinSlot, ObjectRef, &Pin)> {
        let mut slots = Vec::new();
        for (h, element) in self.elements.iter() {
            for (i, pin) in element.pins.iter().enumerate() {
                slots.push((PinSlot::Pin(h, i), ObjectRef::Pin(pin.id), pin));
            }
        }
        for (h, via) in self.vias.iter() {
            slots.push((PinSlot::Via(h), ObjectRef::Via(via.id), via));
        }
        slots
    }
}

impl<R: Renderer> Editor<R> {
    /// 重算覆铜包含标志；不在覆铜内的层同时清除热焊盘标志
    ///
    /// `log` 为真时每个发生变化的对象先记录修改前的标志。
    pub(crate) fn update_pip_flags(&mut self, scope: PipScope, log: bool) -> Result<(), EditError> {
        let changes: Vec<(PinSlot, ObjectRef, FlagState, FlagState)> = {
            let board = &self.board;
            let targets: Vec<(PinSlot, ObjectRef, &Pin)> = match scope {
                PipScope::Via(h) => {
                    let via = board.via(h)?;
                    vec![(PinSlot::Via(h), ObjectRef::Via(via.id), via)]
                }
                PipScope::Element(h) => board
                    .element(h)?
                    .pins
                    .iter()
                    .enumerate()
                    .map(|(i, pin)| (PinSlot::Pin(h, i), ObjectRef::Pin(pin.id), pin))
                    .collect(),
                PipScope::Layer(layer) => {
                    board.layer(layer)?;
                    board.pin_slots()
                }
            };
            targets
                .into_iter()
                .filter_map(|(slot, object, pin)| {
                    let old = pin_state(pin);
                    let inside = pip_mask_at(board, &pin.position);
                    let mut new = old;
                    match scope {
                        PipScope::Layer(layer) => {
                            let l = layer.index();
                            new.pip.set(l, inside.contains(l));
                            if !inside.contains(l) {
                                new.thermal.set(l, false);
                            }
                        }
                        _ => {
                            new.pip = inside;
                            new.thermal = LayerMask::new(old.thermal.bits() & inside.bits());
                        }
                    }
                    (new != old).then_some((slot, object, old, new))
                })
                .collect()
        };

        for (slot, object, old, new) in changes {
            if log {
                self.undo.append(UndoRecord::ChangeFlags {
                    target: object,
                    state: old,
                });
            }
            let pin = self.board.pin_slot_mut(slot)?;
            pin.thermal = new.thermal;
            pin.pip = new.pip;
        }
        Ok(())
    }

    /// 把覆铜内引脚/过孔在源层的热焊盘标志迁移到目标层
    pub(crate) fn transfer_thermals(
        &mut self,
        polygon: &Polygon,
        src: LayerId,
        dest: LayerId,
    ) -> Result<usize, EditError> {
        let moved: Vec<(PinSlot, ObjectRef, FlagState)> = self
            .board
            .pin_slots()
            .into_iter()
            .filter(|(_, _, pin)| pin.thermal.contains(src.index()) && point_in_polygon(&pin.position, polygon))
            .map(|(slot, object, pin)| (slot, object, pin_state(pin)))
            .collect();

        for (slot, object, state) in &moved {
            self.undo.append(UndoRecord::ChangeFlags {
                target: *object,
                state: *state,
            });
            let pin = self.board.pin_slot_mut(*slot)?;
            pin.thermal.set(src.index(), false);
            pin.thermal.set(dest.index(), true);
        }
        if !moved.is_empty() {
            tracing::debug!(count = moved.len(), %src, %dest, "thermal flags transferred");
        }
        Ok(moved.len())
    }

    /// 压缩覆铜多余顶点；发生压缩时由本函数负责包围盒和重绘
    pub fn compact_points(&mut self, layer: LayerId, h: Handle<Polygon>) -> Result<bool, EditError> {
        let polygon = self.board.polygon(layer, h)?;
        let reduced = reduce_points(&polygon.points);
        if reduced.len() == polygon.points.len() {
            return Ok(false);
        }
        self.undo.append(UndoRecord::ChangePoints {
            polygon: polygon.id,
            points: polygon.points.clone(),
        });
        tracing::debug!(
            removed = polygon.points.len() - reduced.len(),
            "excess polygon points removed"
        );

        let on = self.board.is_layer_on(layer)?;
        let polygon = self.board.polygon_mut(layer, h)?;
        polygon.points = reduced;
        polygon.update_bounding_box();
        if on {
            self.renderer.draw(&Drawable::Polygon(layer, polygon));
            self.renderer.flush();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ObjectFlags;

    fn square(size: i64) -> Polygon {
        Polygon::new(
            vec![
                Point2::new(0, 0),
                Point2::new(size, 0),
                Point2::new(size, size),
                Point2::new(0, size),
            ],
            ObjectFlags::NONE,
        )
    }

    #[test]
    fn test_point_in_polygon() {
        let polygon = square(100);
        assert!(point_in_polygon(&Point2::new(50, 50), &polygon));
        assert!(!point_in_polygon(&Point2::new(150, 50), &polygon));
        assert!(!point_in_polygon(&Point2::new(-1, 50), &polygon));
    }

    #[test]
    fn test_reduce_collinear_and_duplicate() {
        let points = vec![
            Point2::new(0, 0),
            Point2::new(50, 0),
            Point2::new(100, 0),
            Point2::new(100, 100),
            Point2::new(100, 100),
            Point2::new(0, 100),
        ];
        let reduced = reduce_points(&points);
        assert_eq!(
            reduced,
            vec![
                Point2::new(0, 0),
                Point2::new(100, 0),
                Point2::new(100, 100),
                Point2::new(0, 100),
            ]
        );
    }

    #[test]
    fn test_reduce_keeps_minimum() {
        // 退化为一条线的三角形不再压缩
        let points = vec![Point2::new(0, 0), Point2::new(5, 0), Point2::new(10, 0)];
        assert_eq!(reduce_points(&points).len(), 3);
    }

    #[test]
    fn test_reduce_leaves_clean_ring() {
        let polygon = square(10);
        assert_eq!(reduce_points(&polygon.points), polygon.points);
    }
}
