//! 编辑器设置与显示开关

use crate::error::EditError;
use crate::math::Coord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 全局设置（新建对象的默认尺寸、自动过孔等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 新走线线宽
    pub line_thickness: Coord,
    /// 安全间距
    pub keepaway: Coord,
    /// 新过孔外径
    pub via_thickness: Coord,
    /// 新过孔钻孔直径
    pub via_drilling_hole: Coord,
    /// 走线换层时是否自动插入过孔
    pub auto_via: bool,
    /// 新对象是否与覆铜保留间隙
    pub clear_new: bool,
    /// 保留的撤销事务数量
    pub undo_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_thickness: 1000,
            keepaway: 1000,
            via_thickness: 6000,
            via_drilling_hole: 2800,
            auto_via: true,
            clear_new: true,
            undo_depth: 500,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, EditError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从JSON文件加载，缺失字段取默认值
    pub fn load(path: &Path) -> Result<Self, EditError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, EditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 各类对象的显示开关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    pub elements_on: bool,
    pub pins_on: bool,
    pub vias_on: bool,
    pub rats_on: bool,
    /// 显示背面（不可见面）的对象
    pub invisible_objects_on: bool,
    /// 当前从焊接面观看
    pub show_solder_side: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            elements_on: true,
            pins_on: true,
            vias_on: true,
            rats_on: true,
            invisible_objects_on: false,
            show_solder_side: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json_str(r#"{ "auto_via": false, "keepaway": 250 }"#).unwrap();
        assert!(!settings.auto_via);
        assert_eq!(settings.keepaway, 250);
        assert_eq!(settings.via_thickness, Settings::default().via_thickness);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "line_thickness": 800, "undo_depth": 3 }}"#).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.line_thickness, 800);
        assert_eq!(settings.undo_depth, 3);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let result = Settings::from_json_str("{ not json");
        assert!(matches!(result, Err(EditError::Settings(_))));
    }

    #[test]
    fn test_roundtrip_json() {
        let settings = Settings {
            clear_new: false,
            ..Settings::default()
        };
        let json = settings.to_json_string().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }
}
