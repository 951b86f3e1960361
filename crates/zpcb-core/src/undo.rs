//! 撤销日志
//!
//! 每次修改之前先追加一条逆操作记录。记录按事务序号分组：一个手势产生的所有记录
//! 共享同一个序号，手势结束时调用 [`UndoLog::bump_transaction`] 把它们封装为一个事务，
//! 撤销和重做都以事务为单位整体执行。
//!
//! 重放期间日志被锁定，处理函数内部的追加请求会被忽略；每条记录执行后产生的逆记录
//! 由重放流程自行收集。

use crate::dispatch::ObjectRef;
use crate::entity::ObjectId;
use crate::flags::{LayerMask, ObjectFlags};
use crate::geometry::{Arc, Element, Line, Polygon, Rat, Text, Via};
use crate::layer::LayerId;
use crate::math::{Point2, Vector2};
use std::collections::VecDeque;

/// 被删除实体的完整副本，恢复时原样放回
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Line { layer: LayerId, line: Line },
    Arc { layer: LayerId, arc: Arc },
    Text { layer: LayerId, text: Text },
    Polygon { layer: LayerId, polygon: Polygon },
    Via(Via),
    Element(Element),
    Rat(Rat),
}

impl Snapshot {
    pub fn id(&self) -> ObjectId {
        match self {
            Snapshot::Line { line, .. } => line.id,
            Snapshot::Arc { arc, .. } => arc.id,
            Snapshot::Text { text, .. } => text.id,
            Snapshot::Polygon { polygon, .. } => polygon.id,
            Snapshot::Via(via) => via.id,
            Snapshot::Element(element) => element.id,
            Snapshot::Rat(rat) => rat.id,
        }
    }

    /// 恢复后引用该实体所用的稳定ID引用
    pub fn object_ref(&self) -> ObjectRef {
        match self {
            Snapshot::Line { line, .. } => ObjectRef::Line(line.id),
            Snapshot::Arc { arc, .. } => ObjectRef::Arc(arc.id),
            Snapshot::Text { text, .. } => ObjectRef::Text(text.id),
            Snapshot::Polygon { polygon, .. } => ObjectRef::Polygon(polygon.id),
            Snapshot::Via(via) => ObjectRef::Via(via.id),
            Snapshot::Element(element) => ObjectRef::Element(element.id),
            Snapshot::Rat(rat) => ObjectRef::Rat(rat.id),
        }
    }
}

/// 标志位状态；热焊盘和覆铜包含掩码只对引脚和过孔有意义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagState {
    pub flags: ObjectFlags,
    pub thermal: LayerMask,
    pub pip: LayerMask,
}

/// 一条逆操作记录
#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    /// 已按 `offset` 平移
    Move { target: ObjectRef, offset: Vector2 },
    /// 已从 `previous` 层换到别处
    MoveToLayer { target: ObjectRef, previous: LayerId },
    /// 已新建
    Create { target: ObjectRef },
    /// 已删除，保存完整副本
    Remove { snapshot: Snapshot },
    /// 修改前的标志位
    ChangeFlags { target: ObjectRef, state: FlagState },
    /// 压缩前的顶点
    ChangePoints { polygon: ObjectId, points: Vec<Point2> },
}

impl UndoRecord {
    pub fn name(&self) -> &'static str {
        match self {
            UndoRecord::Move { .. } => "Move",
            UndoRecord::MoveToLayer { .. } => "MoveToLayer",
            UndoRecord::Create { .. } => "Create",
            UndoRecord::Remove { .. } => "Remove",
            UndoRecord::ChangeFlags { .. } => "ChangeFlags",
            UndoRecord::ChangePoints { .. } => "ChangePoints",
        }
    }
}

/// 同一事务序号下的记录，按追加顺序保存
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub serial: u64,
    pub records: Vec<UndoRecord>,
}

/// 撤销/重做日志
#[derive(Debug, Clone)]
pub struct UndoLog {
    undo: VecDeque<Transaction>,
    redo: Vec<Transaction>,
    /// 当前序号下尚未封装的记录
    pending: Vec<UndoRecord>,
    serial: u64,
    locked: bool,
    max_depth: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(500)
    }
}

impl UndoLog {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            pending: Vec::new(),
            serial: 1,
            locked: false,
            max_depth: max_depth.max(1),
        }
    }

    /// 追加记录；重放期间忽略。新修改会清空重做列表
    pub fn append(&mut self, record: UndoRecord) {
        if self.locked {
            return;
        }
        self.redo.clear();
        self.pending.push(record);
    }

    /// 结束当前事务；没有新记录时不做任何事
    pub fn bump_transaction(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let records = std::mem::take(&mut self.pending);
        tracing::info!("Commit transaction #{} ({} records)", self.serial, records.len());
        self.undo.push_back(Transaction {
            serial: self.serial,
            records,
        });
        self.serial += 1;
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }

    /// 当前（尚未结束的）事务序号
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn pending(&self) -> &[UndoRecord] {
        &self.pending
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || !self.pending.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// 最近一个已结束的事务
    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.undo.back()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending.clear();
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Transaction> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Transaction> {
        self.redo.pop()
    }

    pub(crate) fn push_redo(&mut self, transaction: Transaction) {
        self.redo.push(transaction);
    }

    /// 重做产生的事务回到撤销栈，不清空重做列表
    pub(crate) fn push_undo(&mut self, transaction: Transaction) {
        self.undo.push_back(transaction);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }
}
