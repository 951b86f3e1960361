//! ZPCB 演示程序入口
//!
//! 在一块四层示例板上无界面地执行一组编辑手势（拖拽、换层、飞线布线、批量换层、撤销、重做），
//! 通过日志输出每一步的结果。
//!
//! 用法：`zpcb [settings.json]`

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zpcb_core::prelude::*;

/// 把绘制请求写入日志的显示后端
#[derive(Default)]
struct LogRenderer {
    requests: usize,
}

impl Renderer for LogRenderer {
    fn erase(&mut self, item: &Drawable<'_>) {
        self.requests += 1;
        debug!("erase {} {}", item.kind().name(), item.id());
    }

    fn draw(&mut self, item: &Drawable<'_>) {
        self.requests += 1;
        debug!("draw {} {}", item.kind().name(), item.id());
    }

    fn flush(&mut self) {
        debug!("flush");
    }
}

/// 示例板上的图层
struct DemoLayers {
    component: LayerId,
    solder: LayerId,
    inner: LayerId,
}

fn load_settings() -> Result<Settings> {
    match std::env::args().nth(1) {
        Some(path) => Settings::load(std::path::Path::new(&path))
            .with_context(|| format!("failed to load settings from {}", path)),
        None => Ok(Settings::default()),
    }
}

/// 建立示例板：元件面、焊接面和两个同组内层
fn build_demo_board(settings: Settings) -> Result<(Board, DemoLayers)> {
    let mut board = Board::new(settings);
    let component = board.add_layer("component", GroupId(0))?;
    let solder = board.add_layer("solder", GroupId(1))?;
    let inner = board.add_layer("inner1", GroupId(2))?;
    board.add_layer("inner2", GroupId(2))?;
    board.groups.component = Some(GroupId(0));
    board.groups.solder = Some(GroupId(1));

    let width = board.settings.line_thickness;
    let clearance = board.settings.keepaway;
    // 一条折线：三段走线首尾相接
    board.create_line(component, Point2::new(0, 0), Point2::new(20000, 0), width, clearance, ObjectFlags::NONE)?;
    board.create_line(
        component,
        Point2::new(20000, 0),
        Point2::new(20000, 20000),
        width,
        clearance,
        ObjectFlags::NONE,
    )?;
    board.create_line(
        component,
        Point2::new(20000, 20000),
        Point2::new(40000, 20000),
        width,
        clearance,
        ObjectFlags::new(ObjectFlags::SELECTED),
    )?;

    board.add_polygon(
        solder,
        Polygon::new(
            vec![
                Point2::new(-50000, -50000),
                Point2::new(50000, -50000),
                Point2::new(50000, 50000),
                Point2::new(-50000, 50000),
            ],
            ObjectFlags::NONE,
        ),
    )?;
    board.add_text(
        component,
        Text::new(Point2::new(0, 30000), 0, 100, "ZPCB", ObjectFlags::new(ObjectFlags::SELECTED)),
    )?;

    let mut element = Element::new(Point2::new(-20000, 0), ObjectFlags::NONE);
    element.pins.push(Pin::new(
        Point2::new(-20000, 0),
        6000,
        1000,
        6600,
        2800,
        "1",
        ObjectFlags::new(ObjectFlags::PIN),
    ));
    element.pins.push(Pin::new(
        Point2::new(-10000, 0),
        6000,
        1000,
        6600,
        2800,
        "2",
        ObjectFlags::new(ObjectFlags::PIN),
    ));
    element
        .names
        .push(Text::new(Point2::new(-20000, -8000), 0, 100, "R1", ObjectFlags::NONE));
    board.add_element(element);

    board.add_rat(Rat::new(Point2::new(-10000, 0), Point2::new(0, 0), 0, 0, 100));

    Ok((board, DemoLayers { component, solder, inner }))
}

fn main() -> Result<()> {
    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .finish(),
    )?;

    info!("Starting ZPCB...");

    let settings = load_settings()?;
    let (board, layers) = build_demo_board(settings)?;
    let mut editor = Editor::new(board, LogRenderer::default());

    // 拖拽折线的拐点，相连的走线跟随移动
    let corner = Point2::new(20000, 0);
    let target = find_entity_at(&editor.board, KindMask::new(KindMask::LINE_POINT), &corner)
        .context("no line point at the drag corner")?;
    let mut rubberband = RubberbandSet::collect_for(&mut editor.board, &target)?;
    info!("Dragging {:?} with {} rubberband lines", target.kind(), rubberband.len());
    editor.move_entity_with_rubberband(target, Vector2::new(5000, 5000), &mut rubberband)?;

    // 把中间一段换到焊接面，两端仍连着元件面的走线，应各插入一个过孔
    let middle = find_entity_at(&editor.board, KindMask::new(KindMask::LINE), &Point2::new(22500, 12500))
        .context("no line in the middle of the trace")?;
    let moved = editor.move_entity_to_layer(middle, Some(layers.solder), false)?;
    info!("Middle segment is now {:?}; {} vias on board", moved, editor.board.vias.len());

    // 飞线布成内层走线
    let first_rat = editor.board.rats.iter().next().map(|(h, _)| h);
    if let Some(rat) = first_rat {
        let line = editor.move_entity_to_layer(EntityRef::Rat(rat), Some(layers.inner), false)?;
        info!("Rat routed as {:?}", line);
    }

    // 选中对象整体换到内层
    let changed = editor.move_selection_to_layer(layers.inner)?;
    info!("Selection moved to {}: changed = {}", layers.inner, changed);

    while editor.undo() {}
    info!(
        "Undo all: {} vias, {} lines on component layer",
        editor.board.vias.len(),
        editor.board.layer(layers.component)?.lines.len()
    );

    while editor.redo() {}
    info!(
        "Redo all: {} vias, {} lines on component layer",
        editor.board.vias.len(),
        editor.board.layer(layers.component)?.lines.len()
    );

    info!("Done, {} draw requests issued", editor.renderer.requests);
    Ok(())
}
