//! Vector shapes: path commands, stroke/fill styles and a placement transform.

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point, Rect, Transform};
use crate::ids::{ShapeId, SymbolId};
use crate::EditorError;

/// Kind of a single drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Move,
    Line,
    Cubic,
    Quad,
    Close,
}

impl CommandKind {
    /// Number of points a command of this kind must carry.
    #[inline]
    pub fn point_count(&self) -> usize {
        match self {
            Self::Move | Self::Line => 1,
            Self::Cubic => 3,
            Self::Quad => 2,
            Self::Close => 0,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Line => "line",
            Self::Cubic => "cubic",
            Self::Quad => "quad",
            Self::Close => "close",
        }
    }
}

/// One drawing command. Control points come first, the end point last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl PathCommand {
    /// Build a command, checking the point count against the kind.
    pub fn new(kind: CommandKind, points: Vec<Point>) -> Result<Self, EditorError> {
        let command = Self { kind, points };
        command.validate()?;
        Ok(command)
    }

    pub fn move_to(p: Point) -> Self {
        Self {
            kind: CommandKind::Move,
            points: vec![p],
        }
    }

    pub fn line_to(p: Point) -> Self {
        Self {
            kind: CommandKind::Line,
            points: vec![p],
        }
    }

    pub fn cubic_to(c1: Point, c2: Point, p: Point) -> Self {
        Self {
            kind: CommandKind::Cubic,
            points: vec![c1, c2, p],
        }
    }

    pub fn quad_to(c: Point, p: Point) -> Self {
        Self {
            kind: CommandKind::Quad,
            points: vec![c, p],
        }
    }

    pub fn close() -> Self {
        Self {
            kind: CommandKind::Close,
            points: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        let expected = self.kind.point_count();
        if self.points.len() != expected {
            return Err(EditorError::InvalidPathCommand {
                command: self.kind.name().to_string(),
                expected,
                actual: self.points.len(),
            });
        }
        Ok(())
    }
}

/// A sub-path of a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub commands: Vec<PathCommand>,
    #[serde(default)]
    pub closed: bool,
}

impl Path {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        let closed = matches!(
            commands.last(),
            Some(PathCommand {
                kind: CommandKind::Close,
                ..
            })
        );
        Self { commands, closed }
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.commands.iter().flat_map(|c| c.points.iter().copied())
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        self.commands.iter().try_for_each(PathCommand::validate)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub cap: LineCap,
    #[serde(default)]
    pub join: LineJoin,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in [0, 1].
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(default)]
    pub kind: GradientKind,
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
}

/// Interior paint of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FillStyle {
    Solid { color: Color },
    Gradient { gradient: Gradient },
    /// Repeating image fill; `source` is resolved by the renderer.
    Pattern { source: String },
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        Self::Solid { color }
    }
}

/// A vector drawable owned by exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
    pub paths: Vec<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillStyle>,
    #[serde(default)]
    pub transform: Transform,
}

impl Shape {
    pub fn new(name: impl Into<String>, paths: Vec<Path>) -> Self {
        Self {
            id: ShapeId::new(),
            name: name.into(),
            paths,
            stroke: None,
            fill: None,
            transform: Transform::identity(),
        }
    }

    /// Axis-aligned rectangle with its top-left corner at the local origin,
    /// positioned on stage through the transform.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        let path = Path::new(vec![
            PathCommand::move_to(Point::new(0.0, 0.0)),
            PathCommand::line_to(Point::new(width, 0.0)),
            PathCommand::line_to(Point::new(width, height)),
            PathCommand::line_to(Point::new(0.0, height)),
            PathCommand::close(),
        ]);
        let mut shape = Self::new("Rectangle", vec![path]);
        shape.transform = Transform::from_position(x, y);
        shape
    }

    /// Ellipse centered at the local origin, approximated with four cubic arcs.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        // Control-point distance for a quarter circle.
        const KAPPA: f64 = 0.552_284_749_831;
        let (ox, oy) = (rx * KAPPA, ry * KAPPA);
        let path = Path::new(vec![
            PathCommand::move_to(Point::new(rx, 0.0)),
            PathCommand::cubic_to(
                Point::new(rx, oy),
                Point::new(ox, ry),
                Point::new(0.0, ry),
            ),
            PathCommand::cubic_to(
                Point::new(-ox, ry),
                Point::new(-rx, oy),
                Point::new(-rx, 0.0),
            ),
            PathCommand::cubic_to(
                Point::new(-rx, -oy),
                Point::new(-ox, -ry),
                Point::new(0.0, -ry),
            ),
            PathCommand::cubic_to(
                Point::new(ox, -ry),
                Point::new(rx, -oy),
                Point::new(rx, 0.0),
            ),
            PathCommand::close(),
        ]);
        let mut shape = Self::new("Ellipse", vec![path]);
        shape.transform = Transform::from_position(cx, cy);
        shape
    }

    /// Open polyline through the given local points.
    pub fn polyline(points: &[Point]) -> Self {
        let commands = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    PathCommand::move_to(*p)
                } else {
                    PathCommand::line_to(*p)
                }
            })
            .collect();
        Self::new("Line", vec![Path::new(commands)])
    }

    pub fn with_fill(mut self, fill: FillStyle) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Structural copy under a fresh id, for content that must appear in another frame.
    pub fn duplicate(&self) -> Shape {
        Shape {
            id: ShapeId::new(),
            ..self.clone()
        }
    }

    /// Bounds of the path points in local coordinates. Curves are bounded by their hulls.
    pub fn local_bounds(&self) -> Option<Rect> {
        Rect::from_points(self.paths.iter().flat_map(Path::points))
    }

    /// Bounds on stage after the shape transform, widened by half the stroke width.
    pub fn world_bounds(&self) -> Option<Rect> {
        let local = self.local_bounds()?;
        let mut world = self.transform.to_matrix().apply_rect(&local);
        if let Some(stroke) = &self.stroke {
            let half = stroke.width / 2.0;
            world = Rect::new(
                world.x - half,
                world.y - half,
                world.width + stroke.width,
                world.height + stroke.width,
            );
        }
        Some(world)
    }

    /// Coarse hit test against the world bounds. Fully transparent shapes never hit.
    pub fn hit_test(&self, p: Point) -> bool {
        self.transform.alpha > 0.0 && self.world_bounds().is_some_and(|b| b.contains(p))
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        self.paths.iter().try_for_each(Path::validate)
    }
}

/// How a symbol instance advances through the symbol's own timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopMode {
    #[default]
    Loop,
    PlayOnce,
    SingleFrame,
}

/// A placed reference to a library symbol. Holds the id only, never the symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInstance {
    pub id: crate::ids::InstanceId,
    pub symbol_id: SymbolId,
    #[serde(default)]
    pub transform: Transform,
    /// 1-based frame of the symbol timeline shown when the instance first appears.
    #[serde(default = "default_first_frame")]
    pub first_frame: u32,
    #[serde(default, rename = "loop")]
    pub loop_mode: LoopMode,
}

fn default_first_frame() -> u32 {
    1
}

impl SymbolInstance {
    pub fn new(symbol_id: SymbolId, transform: Transform) -> Self {
        Self {
            id: crate::ids::InstanceId::new(),
            symbol_id,
            transform,
            first_frame: 1,
            loop_mode: LoopMode::Loop,
        }
    }

    /// Symbol-local frame shown after `elapsed` parent frames (0 on the instance's first frame).
    pub fn frame_at(&self, elapsed: u32, frame_count: u32) -> u32 {
        let count = frame_count.max(1);
        let first = self.first_frame.clamp(1, count);
        match self.loop_mode {
            LoopMode::SingleFrame => first,
            LoopMode::PlayOnce => first.saturating_add(elapsed).min(count),
            LoopMode::Loop => {
                let offset = (u64::from(first - 1) + u64::from(elapsed % count)) % u64::from(count);
                u32::try_from(offset).unwrap_or(0) + 1
            }
        }
    }

    /// Copy with a fresh instance id.
    pub fn duplicate(&self) -> SymbolInstance {
        SymbolInstance {
            id: crate::ids::InstanceId::new(),
            ..self.clone()
        }
    }
}
