//! 编辑操作错误定义

use crate::dispatch::EntityKind;
use crate::entity::ObjectId;
use crate::layer::LayerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Stale or invalid {0:?} handle")]
    StaleHandle(EntityKind),

    #[error("Unknown layer: {0}")]
    UnknownLayer(LayerId),

    #[error("Too many layers: at most {0} supported")]
    TooManyLayers(usize),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Index {index} out of range for {kind:?} {owner}")]
    IndexOutOfRange {
        kind: EntityKind,
        owner: ObjectId,
        index: usize,
    },

    #[error("{0:?} cannot be removed or re-created")]
    NotRemovable(EntityKind),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
