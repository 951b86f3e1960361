//! 数学基础类型
//!
//! 电路板坐标使用整数内部单位（1/100 mil），平移与其逆平移可以逐位还原。

use serde::{Deserialize, Serialize};

/// 坐标分量
pub type Coord = i64;

/// 2D点
pub type Point2 = nalgebra::Point2<Coord>;

/// 2D向量（位移量）
pub type Vector2 = nalgebra::Vector2<Coord>;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 空包围盒（不包含任何点）
    pub fn empty() -> Self {
        Self {
            min: Point2::new(Coord::MAX, Coord::MAX),
            max: Point2::new(Coord::MIN, Coord::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// 从点集计算最紧包围盒
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    /// 扩展以包含指定点
    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 合并另一个包围盒
    pub fn union(&self, other: &BoundingBox2) -> BoundingBox2 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BoundingBox2::new(
            Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// 四周各外扩 `amount`
    pub fn inflate(&self, amount: Coord) -> BoundingBox2 {
        if self.is_empty() {
            return *self;
        }
        BoundingBox2::new(
            Point2::new(self.min.x - amount, self.min.y - amount),
            Point2::new(self.max.x + amount, self.max.y + amount),
        )
    }

    /// 平移
    pub fn translate(&mut self, offset: &Vector2) {
        if self.is_empty() {
            return;
        }
        self.min += *offset;
        self.max += *offset;
    }

    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

impl Default for BoundingBox2 {
    fn default() -> Self {
        Self::empty()
    }
}

/// 两点距离的平方（i128 防止溢出）
pub fn distance_squared(a: &Point2, b: &Point2) -> i128 {
    let dx = (a.x - b.x) as i128;
    let dy = (a.y - b.y) as i128;
    dx * dx + dy * dy
}

/// 点到线段距离的平方（浮点）
pub fn segment_distance_squared(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let (px, py) = (point.x as f64, point.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (vx, vy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len2 = vx * vx + vy * vy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * vx + (py - ay) * vy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * vx, ay + t * vy);
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_points() {
        let bbox = BoundingBox2::from_points([Point2::new(5, -3), Point2::new(-2, 8), Point2::new(1, 1)]);
        assert_eq!(bbox.min, Point2::new(-2, -3));
        assert_eq!(bbox.max, Point2::new(5, 8));
    }

    #[test]
    fn test_empty_bbox_stays_empty() {
        let mut bbox = BoundingBox2::empty();
        bbox.translate(&Vector2::new(10, 10));
        assert!(bbox.is_empty());
        let other = BoundingBox2::new(Point2::new(0, 0), Point2::new(1, 1));
        assert_eq!(bbox.union(&other), other);
    }

    #[test]
    fn test_segment_distance() {
        let d = segment_distance_squared(&Point2::new(5, 3), &Point2::new(0, 0), &Point2::new(10, 0));
        assert!((d - 9.0).abs() < 1e-9);
    }
}
