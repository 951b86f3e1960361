//! 橡皮筋
//!
//! 拖拽开始时收集与被拖对象共享坐标的走线端点，移动时这些端点与主对象以相同偏移同步移动。
//! 收集到的走线打上 `RUBBER_END` 标记，移动时清除。

use crate::arena::Handle;
use crate::board::Board;
use crate::dispatch::EntityRef;
use crate::entity::Endpoint;
use crate::error::EditError;
use crate::flags::ObjectFlags;
use crate::geometry::Line;
use crate::layer::LayerId;
use crate::math::Point2;

/// 一个需要跟随移动的走线端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubberbandLink {
    pub layer: LayerId,
    pub line: Handle<Line>,
    pub end: Endpoint,
}

/// 一次拖拽的橡皮筋集合，按加入顺序处理
#[derive(Debug, Clone, Default)]
pub struct RubberbandSet {
    links: Vec<RubberbandLink>,
}

impl RubberbandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, link: RubberbandLink) {
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[RubberbandLink] {
        &self.links
    }

    pub(crate) fn take(&mut self) -> Vec<RubberbandLink> {
        std::mem::take(&mut self.links)
    }

    /// 收集给定图层上以 `point` 为端点的走线（排除一条）
    pub fn collect_at(
        &mut self,
        board: &mut Board,
        layers: &[LayerId],
        point: &Point2,
        exclude: Option<(LayerId, Handle<Line>)>,
    ) -> Result<usize, EditError> {
        let before = self.links.len();
        for &layer_id in layers {
            let layer = board.layer_mut(layer_id)?;
            for (h, line) in layer.lines.iter_mut() {
                if exclude == Some((layer_id, h)) {
                    continue;
                }
                for end in [Endpoint::Point1, Endpoint::Point2] {
                    if line.point(end) == *point {
                        line.flags.insert(ObjectFlags::RUBBER_END);
                        let link = RubberbandLink { layer: layer_id, line: h, end };
                        if !self.links.contains(&link) {
                            self.links.push(link);
                        }
                    }
                }
            }
        }
        Ok(self.links.len() - before)
    }

    /// 为拖拽目标收集橡皮筋
    ///
    /// 走线和走线端点只在同层组内查找；过孔和元件引脚贯穿所有层。
    pub fn collect_for(board: &mut Board, target: &EntityRef) -> Result<Self, EditError> {
        let mut set = Self::new();
        match *target {
            EntityRef::Line { layer, line } => {
                let l = board.line(layer, line)?;
                let points = [l.point1, l.point2];
                let layers = group_layers(board, layer);
                for point in points {
                    set.collect_at(board, &layers, &point, Some((layer, line)))?;
                }
            }
            EntityRef::LinePoint { layer, line, end } => {
                let point = board.line(layer, line)?.point(end);
                let layers = group_layers(board, layer);
                set.collect_at(board, &layers, &point, Some((layer, line)))?;
            }
            EntityRef::Via(via) => {
                let point = board.via(via)?.position;
                let layers: Vec<LayerId> = board.layer_ids().collect();
                set.collect_at(board, &layers, &point, None)?;
            }
            EntityRef::Element(element) => {
                let points: Vec<Point2> = board.element(element)?.pins.iter().map(|p| p.position).collect();
                let layers: Vec<LayerId> = board.layer_ids().collect();
                for point in points {
                    set.collect_at(board, &layers, &point, None)?;
                }
            }
            _ => {}
        }
        Ok(set)
    }
}

fn group_layers(board: &Board, layer: LayerId) -> Vec<LayerId> {
    board
        .layer_ids()
        .filter(|&other| board.groups.same_group(layer, other))
        .collect()
}
