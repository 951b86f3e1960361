//! 图层与层组
//!
//! 每个铜层按类型分别保存走线、圆弧、文字和覆铜；层组把物理上叠放、
//! 电气上合并的层归为一组。本模块只查询层组，不修改层组归属。

use crate::arena::{Arena, Handle};
use crate::geometry::{Arc, Line, Polygon, Text};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 图层索引（同时是热焊盘掩码中的位号）
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u16);

impl LayerId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// 层组编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u16);

/// 铜层
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    /// 是否显示
    pub on: bool,
    pub lines: Arena<Line>,
    pub arcs: Arena<Arc>,
    pub texts: Arena<Text>,
    pub polygons: Arena<Polygon>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on: true,
            lines: Arena::new(),
            arcs: Arena::new(),
            texts: Arena::new(),
            polygons: Arena::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.arcs.is_empty() && self.texts.is_empty() && self.polygons.is_empty()
    }

    /// 本层是否有走线以该坐标为端点（可排除一条）
    pub fn has_line_endpoint_at(&self, point: &crate::math::Point2, exclude: Option<Handle<Line>>) -> bool {
        self.lines
            .iter()
            .any(|(h, line)| Some(h) != exclude && line.has_endpoint(point))
    }
}

/// 层组表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerGroups {
    /// 按图层索引给出所属层组
    groups: Vec<GroupId>,
    /// 元件面层组
    pub component: Option<GroupId>,
    /// 焊接面层组
    pub solder: Option<GroupId>,
}

impl LayerGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, group: GroupId) {
        self.groups.push(group);
    }

    pub fn group_of(&self, layer: LayerId) -> Option<GroupId> {
        self.groups.get(layer.index()).copied()
    }

    pub fn same_group(&self, a: LayerId, b: LayerId) -> bool {
        self.group_of(a) == self.group_of(b)
    }

    /// 图层是否属于焊接面层组
    pub fn is_solder_side(&self, layer: LayerId) -> bool {
        self.solder.is_some() && self.group_of(layer) == self.solder
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ObjectFlags;
    use crate::math::Point2;

    #[test]
    fn test_layer_groups() {
        let mut groups = LayerGroups::new();
        groups.push(GroupId(0));
        groups.push(GroupId(1));
        groups.push(GroupId(1));
        groups.solder = Some(GroupId(1));

        assert!(groups.same_group(LayerId(1), LayerId(2)));
        assert!(!groups.same_group(LayerId(0), LayerId(1)));
        assert!(groups.is_solder_side(LayerId(2)));
        assert!(!groups.is_solder_side(LayerId(0)));
        assert_eq!(groups.group_of(LayerId(7)), None);
    }

    #[test]
    fn test_line_endpoint_lookup() {
        let mut layer = Layer::new("top");
        let a = layer
            .lines
            .insert(Line::new(Point2::new(0, 0), Point2::new(10, 0), 5, 0, ObjectFlags::NONE));
        assert!(layer.has_line_endpoint_at(&Point2::new(10, 0), None));
        assert!(!layer.has_line_endpoint_at(&Point2::new(10, 0), Some(a)));
    }
}
