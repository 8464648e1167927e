use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPONENT_SIZE: f64 = 70.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point reached by travelling `distance` from `self` along `angle` (radians).
    pub fn offset_by(self, angle: f64, distance: f64) -> Point {
        Point {
            x: self.x + distance * angle.cos(),
            y: self.y + distance * angle.sin(),
        }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }
}

/// Axis-aligned bounds in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn from_corners(a: Point, b: Point) -> Self {
        Bounds {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let mut bounds = Bounds::empty();
        for point in points {
            bounds.include(*point, 0.0);
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grows the bounds to cover a square of half-extent `pad` around `point`.
    pub fn include(&mut self, point: Point, pad: f64) {
        self.min_x = self.min_x.min(point.x - pad);
        self.min_y = self.min_y.min(point.y - pad);
        self.max_x = self.max_x.max(point.x + pad);
        self.max_y = self.max_y.max(point.y + pad);
    }

    pub fn inflate(self, amount: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentGeometry {
    pub position: Point,
    /// Diameter of the vertex's circular bound.
    pub size: f64,
}

impl Default for ComponentGeometry {
    fn default() -> Self {
        Self {
            position: Point::default(),
            size: DEFAULT_COMPONENT_SIZE,
        }
    }
}

impl ComponentGeometry {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Square covering the vertex circle.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        bounds.include(self.position, self.radius());
        bounds
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    #[default]
    Straight,
    Elbowed,
}

/// Where an arc's label sits relative to its routed polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcLabelPlacement {
    pub base_segment_index: usize,
    /// Fraction of the base segment's length, in `[0, 1]`.
    pub foot_frac_distance: f64,
    /// Signed offset perpendicular to the base segment.
    pub perp_distance: f64,
}

impl Default for ArcLabelPlacement {
    fn default() -> Self {
        Self {
            base_segment_index: 0,
            foot_frac_distance: 0.5,
            perp_distance: 0.0,
        }
    }
}

impl ArcLabelPlacement {
    pub fn clamped(self) -> Self {
        Self {
            foot_frac_distance: self.foot_frac_distance.clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcGeometry {
    pub path_type: PathType,
    pub is_auto_draw: bool,
    /// Interior routing points, in order from the source vertex.
    pub waypoints: Vec<Point>,
    pub arc_label: ArcLabelPlacement,
}

impl ArcGeometry {
    pub fn elbowed(waypoints: Vec<Point>) -> Self {
        Self {
            path_type: PathType::Elbowed,
            waypoints,
            ..Self::default()
        }
    }
}
