//! 实体类型分派
//!
//! 所有可操作的实体统一表示为 [`EntityRef`]，每个变体携带自身的句柄类型。
//! 原地移动和换层各自通过一次穷尽匹配把变体分派给对应的处理函数；
//! 没有处理函数的类型返回 `Ok(None)`，表示"该操作不适用"，调用方静默跳过。

use crate::arena::Handle;
use crate::editor::Editor;
use crate::entity::{Endpoint, ObjectId};
use crate::error::EditError;
use crate::geometry::{Arc, Element, Line, Polygon, Rat, Text, Via};
use crate::layer::LayerId;
use crate::math::Vector2;
use crate::render::Renderer;
use serde::{Deserialize, Serialize};

/// 实体类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Line,
    Text,
    Polygon,
    Via,
    Element,
    ElementName,
    Pin,
    Pad,
    LinePoint,
    PolygonPoint,
    Arc,
    Rat,
    RatPoint,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Line => "Line",
            EntityKind::Text => "Text",
            EntityKind::Polygon => "Polygon",
            EntityKind::Via => "Via",
            EntityKind::Element => "Element",
            EntityKind::ElementName => "ElementName",
            EntityKind::Pin => "Pin",
            EntityKind::Pad => "Pad",
            EntityKind::LinePoint => "LinePoint",
            EntityKind::PolygonPoint => "PolygonPoint",
            EntityKind::Arc => "Arc",
            EntityKind::Rat => "Rat",
            EntityKind::RatPoint => "RatPoint",
        }
    }

    /// 该类型在 [`KindMask`] 中对应的位
    pub fn bit(&self) -> u16 {
        match self {
            EntityKind::Line => KindMask::LINE,
            EntityKind::Text => KindMask::TEXT,
            EntityKind::Polygon => KindMask::POLYGON,
            EntityKind::Via => KindMask::VIA,
            EntityKind::Element => KindMask::ELEMENT,
            EntityKind::ElementName => KindMask::ELEMENT_NAME,
            EntityKind::Pin => KindMask::PIN,
            EntityKind::Pad => KindMask::PAD,
            EntityKind::LinePoint => KindMask::LINE_POINT,
            EntityKind::PolygonPoint => KindMask::POLYGON_POINT,
            EntityKind::Arc => KindMask::ARC,
            EntityKind::Rat => KindMask::RAT,
            EntityKind::RatPoint => KindMask::RAT_POINT,
        }
    }
}

/// 实体类型掩码（位域，用于搜索时限定类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMask {
    bits: u16,
}

impl KindMask {
    pub const LINE: u16 = 1 << 0;
    pub const TEXT: u16 = 1 << 1;
    pub const POLYGON: u16 = 1 << 2;
    pub const VIA: u16 = 1 << 3;
    pub const ELEMENT: u16 = 1 << 4;
    pub const ELEMENT_NAME: u16 = 1 << 5;
    pub const PIN: u16 = 1 << 6;
    pub const PAD: u16 = 1 << 7;
    pub const LINE_POINT: u16 = 1 << 8;
    pub const POLYGON_POINT: u16 = 1 << 9;
    pub const ARC: u16 = 1 << 10;
    pub const RAT: u16 = 1 << 11;
    pub const RAT_POINT: u16 = 1 << 12;

    pub const NONE: KindMask = KindMask { bits: 0 };
    pub const ALL: KindMask = KindMask { bits: 0x1FFF };
    /// 引脚与过孔
    pub const PIN_TYPES: KindMask = KindMask {
        bits: Self::VIA | Self::PIN,
    };

    pub fn new(bits: u16) -> Self {
        Self { bits }
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.bits & kind.bit() != 0
    }
}

/// 对实体的类型化引用（存储句柄）
///
/// 换层会改变句柄；换层之后只有返回的新引用有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Line { layer: LayerId, line: Handle<Line> },
    Text { layer: LayerId, text: Handle<Text> },
    Polygon { layer: LayerId, polygon: Handle<Polygon> },
    Via(Handle<Via>),
    Element(Handle<Element>),
    ElementName(Handle<Element>),
    Pin { element: Handle<Element>, pin: usize },
    Pad { element: Handle<Element>, pad: usize },
    LinePoint { layer: LayerId, line: Handle<Line>, end: Endpoint },
    PolygonPoint { layer: LayerId, polygon: Handle<Polygon>, point: usize },
    Arc { layer: LayerId, arc: Handle<Arc> },
    Rat(Handle<Rat>),
    RatPoint { rat: Handle<Rat>, end: Endpoint },
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Line { .. } => EntityKind::Line,
            EntityRef::Text { .. } => EntityKind::Text,
            EntityRef::Polygon { .. } => EntityKind::Polygon,
            EntityRef::Via(_) => EntityKind::Via,
            EntityRef::Element(_) => EntityKind::Element,
            EntityRef::ElementName(_) => EntityKind::ElementName,
            EntityRef::Pin { .. } => EntityKind::Pin,
            EntityRef::Pad { .. } => EntityKind::Pad,
            EntityRef::LinePoint { .. } => EntityKind::LinePoint,
            EntityRef::PolygonPoint { .. } => EntityKind::PolygonPoint,
            EntityRef::Arc { .. } => EntityKind::Arc,
            EntityRef::Rat(_) => EntityKind::Rat,
            EntityRef::RatPoint { .. } => EntityKind::RatPoint,
        }
    }

    /// 所在图层（层上实体才有）
    pub fn layer(&self) -> Option<LayerId> {
        match *self {
            EntityRef::Line { layer, .. }
            | EntityRef::Text { layer, .. }
            | EntityRef::Polygon { layer, .. }
            | EntityRef::LinePoint { layer, .. }
            | EntityRef::PolygonPoint { layer, .. }
            | EntityRef::Arc { layer, .. } => Some(layer),
            _ => None,
        }
    }
}

/// 通过稳定ID引用实体，供撤销记录在重放时重新定位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectRef {
    Line(ObjectId),
    Text(ObjectId),
    Polygon(ObjectId),
    Via(ObjectId),
    Element(ObjectId),
    ElementName(ObjectId),
    Pin(ObjectId),
    Pad(ObjectId),
    LinePoint(ObjectId, Endpoint),
    PolygonPoint(ObjectId, usize),
    Arc(ObjectId),
    Rat(ObjectId),
    RatPoint(ObjectId, Endpoint),
}

impl ObjectRef {
    pub fn id(&self) -> ObjectId {
        match *self {
            ObjectRef::Line(id)
            | ObjectRef::Text(id)
            | ObjectRef::Polygon(id)
            | ObjectRef::Via(id)
            | ObjectRef::Element(id)
            | ObjectRef::ElementName(id)
            | ObjectRef::Pin(id)
            | ObjectRef::Pad(id)
            | ObjectRef::LinePoint(id, _)
            | ObjectRef::PolygonPoint(id, _)
            | ObjectRef::Arc(id)
            | ObjectRef::Rat(id)
            | ObjectRef::RatPoint(id, _) => id,
        }
    }
}

/// 原地移动的单次调用上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveContext {
    pub offset: Vector2,
}

/// 换层的单次调用上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMoveContext {
    /// 目标层；`None` 表示换层已在上游取消
    pub destination: Option<LayerId>,
    /// 批量换层中后面还有对象（跳过同层重绘，过孔留到批次结束）
    pub more_to_come: bool,
}

/// 原地移动表中注册的调用，携带处理函数所需的句柄
#[derive(Debug, Clone, Copy)]
enum MoveCall {
    Line(LayerId, Handle<Line>),
    Text(LayerId, Handle<Text>),
    Polygon(LayerId, Handle<Polygon>),
    Via(Handle<Via>),
    Element(Handle<Element>),
    ElementName(Handle<Element>),
    LinePoint(LayerId, Handle<Line>, Endpoint),
    PolygonPoint(LayerId, Handle<Polygon>, usize),
    Arc(LayerId, Handle<Arc>),
    RatPoint(Handle<Rat>, Endpoint),
}

impl MoveCall {
    /// 查表；未注册的类型返回 `None`
    fn lookup(target: EntityRef) -> Option<Self> {
        Some(match target {
            EntityRef::Line { layer, line } => MoveCall::Line(layer, line),
            EntityRef::Text { layer, text } => MoveCall::Text(layer, text),
            EntityRef::Polygon { layer, polygon } => MoveCall::Polygon(layer, polygon),
            EntityRef::Via(via) => MoveCall::Via(via),
            EntityRef::Element(element) => MoveCall::Element(element),
            EntityRef::ElementName(element) => MoveCall::ElementName(element),
            EntityRef::LinePoint { layer, line, end } => MoveCall::LinePoint(layer, line, end),
            EntityRef::PolygonPoint { layer, polygon, point } => MoveCall::PolygonPoint(layer, polygon, point),
            EntityRef::Arc { layer, arc } => MoveCall::Arc(layer, arc),
            EntityRef::RatPoint { rat, end } => MoveCall::RatPoint(rat, end),
            EntityRef::Pin { .. } | EntityRef::Pad { .. } | EntityRef::Rat(_) => return None,
        })
    }
}

/// 换层表中注册的调用
#[derive(Debug, Clone, Copy)]
enum LayerCall {
    Line(LayerId, Handle<Line>),
    Text(LayerId, Handle<Text>),
    Polygon(LayerId, Handle<Polygon>),
    Arc(LayerId, Handle<Arc>),
    Rat(Handle<Rat>),
}

impl LayerCall {
    fn lookup(target: EntityRef) -> Option<Self> {
        Some(match target {
            EntityRef::Line { layer, line } => LayerCall::Line(layer, line),
            EntityRef::Text { layer, text } => LayerCall::Text(layer, text),
            EntityRef::Polygon { layer, polygon } => LayerCall::Polygon(layer, polygon),
            EntityRef::Arc { layer, arc } => LayerCall::Arc(layer, arc),
            EntityRef::Rat(rat) => LayerCall::Rat(rat),
            EntityRef::Via(_)
            | EntityRef::Element(_)
            | EntityRef::ElementName(_)
            | EntityRef::Pin { .. }
            | EntityRef::Pad { .. }
            | EntityRef::LinePoint { .. }
            | EntityRef::PolygonPoint { .. }
            | EntityRef::RatPoint { .. } => return None,
        })
    }
}

impl<R: Renderer> Editor<R> {
    /// 原地移动分派
    pub(crate) fn dispatch_move(&mut self, target: EntityRef, ctx: &MoveContext) -> Result<Option<EntityRef>, EditError> {
        let Some(call) = MoveCall::lookup(target) else {
            return Ok(None);
        };
        tracing::debug!(kind = target.kind().name(), dx = ctx.offset.x, dy = ctx.offset.y, "move");
        let result = match call {
            MoveCall::Line(layer, line) => self.move_line(layer, line, ctx)?,
            MoveCall::Text(layer, text) => self.move_text(layer, text, ctx)?,
            MoveCall::Polygon(layer, polygon) => self.move_polygon(layer, polygon, ctx)?,
            MoveCall::Via(via) => self.move_via(via, ctx)?,
            MoveCall::Element(element) => self.move_element(element, ctx)?,
            MoveCall::ElementName(element) => self.move_element_name(element, ctx)?,
            MoveCall::LinePoint(layer, line, end) => self.move_line_point(layer, line, end, ctx)?,
            MoveCall::PolygonPoint(layer, polygon, point) => self.move_polygon_point(layer, polygon, point, ctx)?,
            MoveCall::Arc(layer, arc) => self.move_arc(layer, arc, ctx)?,
            MoveCall::RatPoint(rat, end) => self.move_rat_point(rat, end, ctx)?,
        };
        Ok(Some(result))
    }

    /// 换层分派
    pub(crate) fn dispatch_move_to_layer(
        &mut self,
        target: EntityRef,
        ctx: &LayerMoveContext,
    ) -> Result<Option<EntityRef>, EditError> {
        let Some(call) = LayerCall::lookup(target) else {
            return Ok(None);
        };
        tracing::debug!(
            kind = target.kind().name(),
            destination = ?ctx.destination,
            more_to_come = ctx.more_to_come,
            "move to layer"
        );
        let result = match call {
            LayerCall::Line(layer, line) => self.move_line_to_layer(layer, line, ctx)?,
            LayerCall::Text(layer, text) => self.move_text_to_layer(layer, text, ctx)?,
            LayerCall::Polygon(layer, polygon) => self.move_polygon_to_layer(layer, polygon, ctx)?,
            LayerCall::Arc(layer, arc) => self.move_arc_to_layer(layer, arc, ctx)?,
            LayerCall::Rat(rat) => match self.move_rat_to_layer(rat, ctx)? {
                Some(line) => line,
                None => return Ok(None),
            },
        };
        Ok(Some(result))
    }

    /// 该实体是否在原地移动表中注册
    pub(crate) fn is_movable(target: &EntityRef) -> bool {
        MoveCall::lookup(*target).is_some()
    }

    /// 该实体是否在换层表中注册
    pub(crate) fn is_layer_movable(target: &EntityRef) -> bool {
        LayerCall::lookup(*target).is_some()
    }
}
