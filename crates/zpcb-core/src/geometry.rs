//! 电路板几何图元
//!
//! 支持的图元：
//! - 走线 (Line)
//! - 圆弧 (Arc)
//! - 文字 (Text)
//! - 覆铜多边形 (Polygon)
//! - 过孔/引脚 (Pin)
//! - 焊盘 (Pad)
//! - 元件 (Element)
//! - 飞线 (Rat)
//!
//! 每个图元都维护一个包围盒，形状改变后必须重新计算，不做增量修补。

use crate::entity::{Endpoint, ObjectId};
use crate::flags::{LayerMask, ObjectFlags};
use crate::math::{distance_squared, BoundingBox2, Coord, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 字形宽度（缩放100%时）
pub const GLYPH_WIDTH: Coord = 4000;
/// 字形高度（缩放100%时）
pub const GLYPH_HEIGHT: Coord = 6000;

/// 线宽的一半（向上取整），包围盒按此外扩
fn half_width(thickness: Coord) -> Coord {
    (thickness + 1) / 2
}

/// 走线
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: ObjectId,
    pub point1: Point2,
    pub point2: Point2,
    pub thickness: Coord,
    pub clearance: Coord,
    pub flags: ObjectFlags,
    pub bbox: BoundingBox2,
}

impl Line {
    pub fn new(point1: Point2, point2: Point2, thickness: Coord, clearance: Coord, flags: ObjectFlags) -> Self {
        let mut line = Self {
            id: ObjectId::new(),
            point1,
            point2,
            thickness,
            clearance,
            flags,
            bbox: BoundingBox2::empty(),
        };
        line.update_bounding_box();
        line
    }

    pub fn point(&self, end: Endpoint) -> Point2 {
        match end {
            Endpoint::Point1 => self.point1,
            Endpoint::Point2 => self.point2,
        }
    }

    pub fn has_endpoint(&self, point: &Point2) -> bool {
        self.point1 == *point || self.point2 == *point
    }

    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.point1, self.point2]).inflate(half_width(self.thickness))
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    /// 整体平移，包围盒直接平移
    pub fn translate(&mut self, offset: &Vector2) {
        self.point1 += *offset;
        self.point2 += *offset;
        self.bbox.translate(offset);
    }

    /// 只移动一个端点，包围盒重新计算
    pub fn move_endpoint(&mut self, end: Endpoint, offset: &Vector2) {
        match end {
            Endpoint::Point1 => self.point1 += *offset,
            Endpoint::Point2 => self.point2 += *offset,
        }
        self.update_bounding_box();
    }
}

/// 圆弧
///
/// 角度为整数度，`delta` 可以为负（顺时针扫过）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    pub id: ObjectId,
    pub center: Point2,
    /// X方向半径
    pub width: Coord,
    /// Y方向半径
    pub height: Coord,
    pub start_angle: i32,
    pub delta: i32,
    pub thickness: Coord,
    pub clearance: Coord,
    pub flags: ObjectFlags,
    pub bbox: BoundingBox2,
}

impl Arc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center: Point2,
        width: Coord,
        height: Coord,
        start_angle: i32,
        delta: i32,
        thickness: Coord,
        clearance: Coord,
        flags: ObjectFlags,
    ) -> Self {
        let mut arc = Self {
            id: ObjectId::new(),
            center,
            width,
            height,
            start_angle,
            delta,
            thickness,
            clearance,
            flags,
            bbox: BoundingBox2::empty(),
        };
        arc.update_bounding_box();
        arc
    }

    /// 指定角度处相对圆心的偏移；与圆心无关，保证平移后重算结果一致
    fn offset_at(&self, angle: i32) -> Vector2 {
        let rad = (angle as f64).to_radians();
        Vector2::new(
            (self.width as f64 * rad.cos()).round() as Coord,
            (self.height as f64 * rad.sin()).round() as Coord,
        )
    }

    pub fn point_at(&self, angle: i32) -> Point2 {
        self.center + self.offset_at(angle)
    }

    /// 归一化为正向扫角：(起始角, 扫角)
    fn normalized_sweep(&self) -> (i32, i32) {
        let (start, sweep) = if self.delta < 0 {
            (self.start_angle + self.delta, -self.delta)
        } else {
            (self.start_angle, self.delta)
        };
        (start, sweep.min(360))
    }

    pub fn start_point(&self) -> Point2 {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point2 {
        self.point_at(self.start_angle + self.delta)
    }

    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        let (start, sweep) = self.normalized_sweep();
        let mut bbox = BoundingBox2::from_points([self.start_point(), self.end_point()]);

        // 检查扫角范围内的象限点
        let mut angle = start.div_euclid(90) * 90;
        if angle < start {
            angle += 90;
        }
        while angle <= start + sweep {
            bbox.expand_to_include(&self.point_at(angle));
            angle += 90;
        }

        bbox.inflate(half_width(self.thickness))
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    /// 平移圆心并完整重算包围盒
    pub fn translate(&mut self, offset: &Vector2) {
        self.center += *offset;
        self.update_bounding_box();
    }
}

/// 文字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub id: ObjectId,
    /// 基准点
    pub position: Point2,
    /// 方向，以90度为单位逆时针旋转（0..4）
    pub direction: u8,
    /// 缩放百分比
    pub scale: u32,
    pub content: String,
    pub flags: ObjectFlags,
    pub bbox: BoundingBox2,
}

impl Text {
    pub fn new(position: Point2, direction: u8, scale: u32, content: impl Into<String>, flags: ObjectFlags) -> Self {
        let mut text = Self {
            id: ObjectId::new(),
            position,
            direction: direction % 4,
            scale,
            content: content.into(),
            flags,
            bbox: BoundingBox2::empty(),
        };
        text.update_bounding_box();
        text
    }

    pub fn on_solder(&self) -> bool {
        self.flags.contains(ObjectFlags::ON_SOLDER)
    }

    /// 包围盒：按字符数估算宽度，再旋转、（焊接面时）镜像
    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        let chars = self.content.chars().count().max(1) as Coord;
        let scale = self.scale as Coord;
        let width = chars * GLYPH_WIDTH * scale / 100;
        let height = GLYPH_HEIGHT * scale / 100;
        let mirrored = self.on_solder();

        let corners = [(0, 0), (width, 0), (width, height), (0, height)];
        BoundingBox2::from_points(corners.iter().map(|&(x, y)| {
            let (mut x, mut y) = (x, y);
            for _ in 0..self.direction {
                (x, y) = (-y, x);
            }
            if mirrored {
                y = -y;
            }
            Point2::new(self.position.x + x, self.position.y + y)
        }))
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    pub fn translate(&mut self, offset: &Vector2) {
        self.position += *offset;
        self.bbox.translate(offset);
    }
}

/// 覆铜多边形
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: ObjectId,
    pub points: Vec<Point2>,
    pub flags: ObjectFlags,
    pub bbox: BoundingBox2,
}

impl Polygon {
    pub fn new(points: Vec<Point2>, flags: ObjectFlags) -> Self {
        let mut polygon = Self {
            id: ObjectId::new(),
            points,
            flags,
            bbox: BoundingBox2::empty(),
        };
        polygon.update_bounding_box();
        polygon
    }

    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.points.iter().copied())
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    /// 平移所有顶点并完整重算包围盒
    pub fn translate(&mut self, offset: &Vector2) {
        for point in &mut self.points {
            *point += *offset;
        }
        self.update_bounding_box();
    }

    /// 移动单个顶点；包围盒由调用方在点压缩之后决定是否重算
    pub fn move_point(&mut self, index: usize, offset: &Vector2) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                *point += *offset;
                true
            }
            None => false,
        }
    }
}

/// 过孔或元件引脚
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub id: ObjectId,
    pub position: Point2,
    /// 外径
    pub thickness: Coord,
    pub clearance: Coord,
    /// 阻焊开窗直径
    pub mask: Coord,
    pub drilling_hole: Coord,
    pub name: String,
    pub flags: ObjectFlags,
    /// 每层热焊盘标志
    pub thermal: LayerMask,
    /// 每层覆铜包含标志
    pub pip: LayerMask,
    pub bbox: BoundingBox2,
}

/// 过孔与引脚共用同一结构
pub type Via = Pin;

impl Pin {
    pub fn new(
        position: Point2,
        thickness: Coord,
        clearance: Coord,
        mask: Coord,
        drilling_hole: Coord,
        name: impl Into<String>,
        flags: ObjectFlags,
    ) -> Self {
        let mut pin = Self {
            id: ObjectId::new(),
            position,
            thickness,
            clearance,
            mask,
            drilling_hole,
            name: name.into(),
            flags,
            thermal: LayerMask::NONE,
            pip: LayerMask::NONE,
            bbox: BoundingBox2::empty(),
        };
        pin.update_bounding_box();
        pin
    }

    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(self.position, self.position).inflate(half_width(self.thickness))
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    pub fn translate(&mut self, offset: &Vector2) {
        self.position += *offset;
        self.bbox.translate(offset);
    }

    /// 点是否落在焊盘圆盘内
    pub fn covers(&self, point: &Point2) -> bool {
        let r = (self.thickness / 2) as i128;
        distance_squared(&self.position, point) <= r * r
    }
}

/// 表贴焊盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pad {
    pub id: ObjectId,
    pub point1: Point2,
    pub point2: Point2,
    pub thickness: Coord,
    pub clearance: Coord,
    pub mask: Coord,
    pub name: String,
    pub flags: ObjectFlags,
    pub bbox: BoundingBox2,
}

impl Pad {
    pub fn new(point1: Point2, point2: Point2, thickness: Coord, clearance: Coord, name: impl Into<String>) -> Self {
        let mut pad = Self {
            id: ObjectId::new(),
            point1,
            point2,
            thickness,
            clearance,
            mask: thickness,
            name: name.into(),
            flags: ObjectFlags::NONE,
            bbox: BoundingBox2::empty(),
        };
        pad.update_bounding_box();
        pad
    }

    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.point1, self.point2]).inflate(half_width(self.thickness))
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    pub fn translate(&mut self, offset: &Vector2) {
        self.point1 += *offset;
        self.point2 += *offset;
        self.bbox.translate(offset);
    }
}

/// 元件：拥有丝印线、圆弧、引脚、焊盘和名称标签的组合体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ObjectId,
    pub flags: ObjectFlags,
    /// 位号标记点
    pub mark: Point2,
    /// 名称标签（描述、位号、值）
    pub names: Vec<Text>,
    pub pins: Vec<Pin>,
    pub pads: Vec<Pad>,
    pub lines: Vec<Line>,
    pub arcs: Vec<Arc>,
    pub bbox: BoundingBox2,
}

impl Element {
    pub fn new(mark: Point2, flags: ObjectFlags) -> Self {
        Self {
            id: ObjectId::new(),
            flags,
            mark,
            names: Vec::new(),
            pins: Vec::new(),
            pads: Vec::new(),
            lines: Vec::new(),
            arcs: Vec::new(),
            bbox: BoundingBox2::empty(),
        }
    }

    pub fn on_solder(&self) -> bool {
        self.flags.contains(ObjectFlags::ON_SOLDER)
    }

    /// 组合包围盒：所有丝印、引脚、焊盘、圆弧的并集（不含名称标签）
    pub fn compute_bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::empty();
        for line in &self.lines {
            bbox = bbox.union(&line.bbox);
        }
        for pin in &self.pins {
            bbox = bbox.union(&pin.bbox);
        }
        for pad in &self.pads {
            bbox = bbox.union(&pad.bbox);
        }
        for arc in &self.arcs {
            bbox = bbox.union(&arc.bbox);
        }
        bbox
    }

    pub fn update_bounding_box(&mut self) {
        self.bbox = self.compute_bounding_box();
    }

    /// 平移所有子实体和标记点，然后重算组合包围盒
    pub fn translate(&mut self, offset: &Vector2) {
        for line in &mut self.lines {
            line.translate(offset);
        }
        for pin in &mut self.pins {
            pin.translate(offset);
        }
        for pad in &mut self.pads {
            pad.translate(offset);
        }
        for arc in &mut self.arcs {
            arc.translate(offset);
        }
        self.translate_names(offset);
        self.mark += *offset;
        self.update_bounding_box();
    }

    /// 只平移名称标签
    pub fn translate_names(&mut self, offset: &Vector2) {
        for text in &mut self.names {
            text.translate(offset);
        }
    }
}

/// 飞线：未布通的连接，不属于任何层
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rat {
    pub id: ObjectId,
    pub point1: Point2,
    pub point2: Point2,
    pub group1: u16,
    pub group2: u16,
    pub thickness: Coord,
    pub flags: ObjectFlags,
}

impl Rat {
    pub fn new(point1: Point2, point2: Point2, group1: u16, group2: u16, thickness: Coord) -> Self {
        Self {
            id: ObjectId::new(),
            point1,
            point2,
            group1,
            group2,
            thickness,
            flags: ObjectFlags::new(ObjectFlags::RAT),
        }
    }

    pub fn point(&self, end: Endpoint) -> Point2 {
        match end {
            Endpoint::Point1 => self.point1,
            Endpoint::Point2 => self.point2,
        }
    }

    pub fn move_endpoint(&mut self, end: Endpoint, offset: &Vector2) {
        match end {
            Endpoint::Point1 => self.point1 += *offset,
            Endpoint::Point2 => self.point2 += *offset,
        }
    }
}
