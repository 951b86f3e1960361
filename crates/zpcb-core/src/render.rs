//! 绘制接口
//!
//! 编辑操作只通过 [`Renderer`] 发出擦除、绘制和刷新请求，不关心具体的显示后端。
//! 请求是否发出取决于显示开关；后端收到请求后自行决定如何重绘。

use crate::dispatch::EntityKind;
use crate::entity::ObjectId;
use crate::geometry::{Arc, Element, Line, Pin, Polygon, Rat, Text};
use crate::layer::LayerId;

/// 一次绘制请求涉及的对象
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    Line(LayerId, &'a Line),
    Arc(LayerId, &'a Arc),
    Text(LayerId, &'a Text),
    Polygon(LayerId, &'a Polygon),
    Via(&'a Pin),
    /// 整个元件（丝印、引脚、焊盘、名称）
    Element(&'a Element),
    /// 只绘制元件名称标签
    ElementName(&'a Element),
    /// 只绘制元件丝印
    ElementPackage(&'a Element),
    /// 只绘制元件引脚和焊盘
    ElementPins(&'a Element),
    Rat(&'a Rat),
}

impl Drawable<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Drawable::Line(..) => EntityKind::Line,
            Drawable::Arc(..) => EntityKind::Arc,
            Drawable::Text(..) => EntityKind::Text,
            Drawable::Polygon(..) => EntityKind::Polygon,
            Drawable::Via(_) => EntityKind::Via,
            Drawable::Element(_) | Drawable::ElementPackage(_) => EntityKind::Element,
            Drawable::ElementName(_) => EntityKind::ElementName,
            Drawable::ElementPins(_) => EntityKind::Pin,
            Drawable::Rat(_) => EntityKind::Rat,
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Drawable::Line(_, x) => x.id,
            Drawable::Arc(_, x) => x.id,
            Drawable::Text(_, x) => x.id,
            Drawable::Polygon(_, x) => x.id,
            Drawable::Via(x) => x.id,
            Drawable::Element(x)
            | Drawable::ElementName(x)
            | Drawable::ElementPackage(x)
            | Drawable::ElementPins(x) => x.id,
            Drawable::Rat(x) => x.id,
        }
    }
}

/// 显示后端
pub trait Renderer {
    fn erase(&mut self, item: &Drawable<'_>);
    fn draw(&mut self, item: &Drawable<'_>);
    /// 提交累积的重绘请求
    fn flush(&mut self);
}

/// 丢弃所有请求
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn erase(&mut self, _item: &Drawable<'_>) {}
    fn draw(&mut self, _item: &Drawable<'_>) {}
    fn flush(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOp {
    Erase,
    Draw,
    Flush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEvent {
    pub op: RenderOp,
    /// 刷新事件没有对象
    pub kind: Option<EntityKind>,
    pub id: Option<ObjectId>,
}

/// 记录所有请求，便于检查绘制顺序
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn count(&self, op: RenderOp) -> usize {
        self.events.iter().filter(|e| e.op == op).count()
    }

    pub fn count_kind(&self, op: RenderOp, kind: EntityKind) -> usize {
        self.events
            .iter()
            .filter(|e| e.op == op && e.kind == Some(kind))
            .count()
    }

    pub fn flushes(&self) -> usize {
        self.count(RenderOp::Flush)
    }

    fn record(&mut self, op: RenderOp, item: &Drawable<'_>) {
        self.events.push(RenderEvent {
            op,
            kind: Some(item.kind()),
            id: Some(item.id()),
        });
    }
}

impl Renderer for RecordingRenderer {
    fn erase(&mut self, item: &Drawable<'_>) {
        self.record(RenderOp::Erase, item);
    }

    fn draw(&mut self, item: &Drawable<'_>) {
        self.record(RenderOp::Draw, item);
    }

    fn flush(&mut self) {
        self.events.push(RenderEvent {
            op: RenderOp::Flush,
            kind: None,
            id: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ObjectFlags;
    use crate::math::Point2;

    #[test]
    fn test_recording_renderer_counts() {
        let line = Line::new(Point2::new(0, 0), Point2::new(1, 1), 1, 0, ObjectFlags::NONE);
        let mut renderer = RecordingRenderer::new();
        renderer.erase(&Drawable::Line(LayerId(0), &line));
        renderer.draw(&Drawable::Line(LayerId(1), &line));
        renderer.flush();

        assert_eq!(renderer.count(RenderOp::Erase), 1);
        assert_eq!(renderer.count_kind(RenderOp::Draw, EntityKind::Line), 1);
        assert_eq!(renderer.flushes(), 1);
        assert_eq!(renderer.events[1].id, Some(line.id));
    }
}
