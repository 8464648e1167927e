//! Arc routing and label placement.
//!
//! Turns the point sequence `[start center, ..waypoints, end center]` plus the
//! radii of both vertices into everything needed to draw an arc: the trimmed
//! polyline, the stroke polyline, the arrowhead at the target and the label
//! anchor. Everything here is a pure function of its inputs and is recomputed
//! from scratch whenever an incident vertex or the arc itself changes.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::RouteError;
use crate::geometry::{ArcLabelPlacement, Bounds, ComponentGeometry, Point};
use crate::style::{ConnectorStyle, ConnectorType};

/// Gap left between the end of the stroke and the target boundary so the
/// arrowhead covers the stroke tip.
pub const STROKE_END_CLEARANCE: f64 = 10.0;
/// How far the arrowhead sinks into the target outline.
pub const CONNECTOR_OVERLAP: f64 = 1.0;
pub const LABEL_CUTOUT_PADDING_X: f64 = 10.0;
pub const LABEL_CUTOUT_PADDING_Y: f64 = 6.0;
pub const LABEL_CUTOUT_CORNER_RADIUS: f64 = 20.0;

/// A vertex as seen by the router: its center and circular bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub center: Point,
    pub radius: f64,
}

impl Endpoint {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl From<&ComponentGeometry> for Endpoint {
    fn from(geometry: &ComponentGeometry) -> Self {
        Endpoint {
            center: geometry.position,
            radius: geometry.radius(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub start: Endpoint,
    pub end: Endpoint,
    pub waypoints: &'a [Point],
    pub label: ArcLabelPlacement,
    pub connector: ConnectorStyle,
}

/// Isoceles triangle drawn at the target end of an arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub kind: ConnectorType,
    /// Center of the triangle's bounding square.
    pub center: Point,
    /// Direction of travel into the target vertex, in radians.
    pub angle: f64,
    pub thickness: f64,
}

impl ArrowHead {
    /// Apex first, then the two base corners.
    pub fn points(&self) -> [Point; 3] {
        let half = self.thickness / 2.0;
        let (sin, cos) = self.angle.sin_cos();
        let apex = Point::new(self.center.x + half * cos, self.center.y + half * sin);
        let base_mid = Point::new(self.center.x - half * cos, self.center.y - half * sin);
        let left = Point::new(base_mid.x + half * sin, base_mid.y - half * cos);
        let right = Point::new(base_mid.x - half * sin, base_mid.y + half * cos);
        [apex, left, right]
    }

    /// SVG transform placing the local triangle `t/2,0 0,t t,t` at this head.
    pub fn svg_transform(&self) -> String {
        let half = self.thickness / 2.0;
        format!(
            "translate({:.2}, {:.2}) rotate({:.2} {:.2} {:.2})",
            self.center.x - half,
            self.center.y - half,
            self.angle.to_degrees() + 90.0,
            half,
            half
        )
    }
}

/// Rounded rectangle subtracted from the arc stroke underneath its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCutout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcRoute {
    /// Point sequence with both centers replaced by their points of contact.
    pub trimmed: Vec<Point>,
    /// Polyline actually stroked; ends short of the target when a connector is drawn.
    pub stroke: Vec<Point>,
    pub connector: Option<ArrowHead>,
    /// `None` when the base segment has no direction to offset from.
    pub label_anchor: Option<Point>,
}

impl ArcRoute {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.stroke)
    }

    pub fn svg_path_data(&self) -> String {
        let mut data = String::new();
        for (idx, point) in self.stroke.iter().enumerate() {
            let command = if idx == 0 { "M" } else { " L" };
            data.push_str(&format!("{command} {:.2} {:.2}", point.x, point.y));
        }
        data
    }
}

/// Angle of the ray from `initial` toward `terminal`. Returns `None` when the
/// two points coincide or either is not finite.
pub fn normal_angle(initial: Point, terminal: Point) -> Option<f64> {
    let dx = terminal.x - initial.x;
    let dy = terminal.y - initial.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    let angle = dy.atan2(dx);
    angle.is_finite().then_some(angle)
}

/// Point where the ray from `center` toward `toward` leaves a circle of `radius`.
pub fn point_of_contact(center: Point, radius: f64, toward: Point) -> Result<Point, RouteError> {
    let angle = normal_angle(center, toward).ok_or(RouteError::CoincidentEndpoints)?;
    let contact = center.offset_by(angle, radius);
    if contact.is_finite() {
        Ok(contact)
    } else {
        Err(RouteError::CoincidentEndpoints)
    }
}

/// Replaces the first and last points with their points of contact.
pub fn trim_points(
    points: &[Point],
    start_radius: f64,
    end_radius: f64,
) -> Result<Vec<Point>, RouteError> {
    if points.len() < 2 {
        return Err(RouteError::TooFewPoints(points.len()));
    }

    let last = points.len() - 1;
    let mut trimmed = points.to_vec();
    trimmed[0] = point_of_contact(points[0], start_radius, points[1])?;
    trimmed[last] = point_of_contact(points[last], end_radius, points[last - 1])?;
    Ok(trimmed)
}

/// Angle of the label offset relative to the segment `start -> end`.
///
/// The offset sits on the side reached by turning the direction of travel a
/// quarter turn clockwise on screen (y grows downward). Vertical and
/// horizontal segments are resolved explicitly instead of through the slope.
pub fn perpendicular_angle(start: Point, end: Point) -> Option<f64> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    if dx == 0.0 {
        return Some(if dy > 0.0 { PI } else { 0.0 });
    }
    if dy == 0.0 {
        return Some(if dx > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 });
    }

    let slope = dy / dx;
    let base = (-1.0 / slope).atan();
    let angle = if dy > 0.0 { base + PI } else { base };
    angle.is_finite().then_some(angle)
}

/// Label anchor on already-trimmed points. Out-of-range segment indices fall
/// back to the last segment.
pub fn label_anchor(trimmed: &[Point], placement: ArcLabelPlacement) -> Option<Point> {
    if trimmed.len() < 2 {
        return None;
    }

    let segment_count = trimmed.len() - 1;
    let mut index = placement.base_segment_index;
    if index >= segment_count {
        log::warn!(
            "label base segment {index} is out of range for {segment_count} segment(s); using the last one"
        );
        index = segment_count - 1;
    }

    let start = trimmed[index];
    let end = trimmed[index + 1];
    let foot = start.lerp(end, placement.foot_frac_distance);

    if placement.perp_distance == 0.0 {
        return foot.is_finite().then_some(foot);
    }

    let angle = perpendicular_angle(start, end)?;
    let anchor = foot.offset_by(angle, placement.perp_distance);
    anchor.is_finite().then_some(anchor)
}

pub fn connector_head(
    end: Endpoint,
    previous: Point,
    connector: ConnectorStyle,
) -> Result<Option<ArrowHead>, RouteError> {
    if !connector.kind.is_visible() {
        return Ok(None);
    }

    let reach = end.radius + connector.thickness / 2.0 - CONNECTOR_OVERLAP;
    let center = point_of_contact(end.center, reach, previous)?;
    let angle = normal_angle(previous, end.center).ok_or(RouteError::CoincidentEndpoints)?;

    Ok(Some(ArrowHead {
        kind: connector.kind,
        center,
        angle,
        thickness: connector.thickness,
    }))
}

pub fn route_arc(request: &RouteRequest<'_>) -> Result<ArcRoute, RouteError> {
    let mut points = Vec::with_capacity(request.waypoints.len() + 2);
    points.push(request.start.center);
    points.extend_from_slice(request.waypoints);
    points.push(request.end.center);

    let trimmed = trim_points(&points, request.start.radius, request.end.radius)?;

    let last = points.len() - 1;
    let previous = points[last - 1];
    let mut stroke = trimmed.clone();
    if request.connector.kind.is_visible() {
        stroke[last] = point_of_contact(
            request.end.center,
            request.end.radius + STROKE_END_CLEARANCE,
            previous,
        )?;
    }

    let connector = connector_head(request.end, previous, request.connector)?;
    let label_anchor = label_anchor(&trimmed, request.label);

    Ok(ArcRoute {
        trimmed,
        stroke,
        connector,
        label_anchor,
    })
}

/// Cutout centered on `anchor` for a label measured at `width` x `height`.
pub fn label_cutout(anchor: Point, width: f64, height: f64) -> Option<LabelCutout> {
    let cut_width = width + LABEL_CUTOUT_PADDING_X;
    let cut_height = height + LABEL_CUTOUT_PADDING_Y;
    let x = anchor.x - cut_width / 2.0;
    let y = anchor.y - cut_height / 2.0;

    if !(x.is_finite() && y.is_finite()) {
        return None;
    }

    Some(LabelCutout {
        x,
        y,
        width: cut_width,
        height: cut_height,
        corner_radius: LABEL_CUTOUT_CORNER_RADIUS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn straight(start: Endpoint, end: Endpoint, connector: ConnectorStyle) -> RouteRequest<'static> {
        RouteRequest {
            start,
            end,
            waypoints: &[],
            label: ArcLabelPlacement::default(),
            connector,
        }
    }

    #[test]
    fn normal_angle_covers_all_quadrants() {
        let origin = Point::new(0.0, 0.0);
        let cases = [
            (Point::new(1.0, 0.0), 0.0),
            (Point::new(0.0, 1.0), FRAC_PI_2),
            (Point::new(-1.0, 0.0), PI),
            (Point::new(1.0, 1.0), PI / 4.0),
            (Point::new(-1.0, 1.0), 3.0 * PI / 4.0),
        ];

        for (target, expected) in cases {
            let angle = normal_angle(origin, target).unwrap();
            let (sin, cos) = angle.sin_cos();
            assert!((cos - expected.cos()).abs() < EPS, "cos for {target:?}");
            assert!((sin - expected.sin()).abs() < EPS, "sin for {target:?}");
        }

        assert!(normal_angle(origin, origin).is_none());

        // A vertical ray whose dx is negative zero still points down the page.
        let angle = normal_angle(origin, Point::new(-0.0, 200.0)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < EPS);
        assert!(normal_angle(Point::new(-0.0, 5.0), Point::new(0.0, 5.0)).is_none());
    }

    #[test]
    fn negative_zero_coordinates_keep_contacts_facing_each_other() {
        let start = Endpoint::new(Point::new(0.0, 0.0), 35.0);
        let end = Endpoint::new(Point::new(-0.0, 200.0), 35.0);
        let route = route_arc(&straight(start, end, ConnectorStyle::default())).unwrap();

        assert!((route.trimmed[0].y - 35.0).abs() < EPS);
        assert!((route.trimmed[1].y - 165.0).abs() < EPS);
        assert!(route.trimmed[0].x.abs() < EPS);
        let anchor = route.label_anchor.unwrap();
        assert!((anchor.y - 100.0).abs() < EPS);
    }

    #[test]
    fn straight_arc_contacts_lie_on_both_circles() {
        let start = Endpoint::new(Point::new(100.0, 100.0), 35.0);
        let end = Endpoint::new(Point::new(300.0, 200.0), 20.0);
        let route = route_arc(&straight(start, end, ConnectorStyle::default())).unwrap();

        let first = route.trimmed[0];
        let last = route.trimmed[1];
        assert!((first.distance_to(start.center) - 35.0).abs() < EPS);
        assert!((last.distance_to(end.center) - 20.0).abs() < EPS);

        let total = start.center.distance_to(end.center);
        for point in [first, last] {
            let along = start.center.distance_to(point) + point.distance_to(end.center);
            assert!((along - total).abs() < 1e-6, "{point:?} is off the center line");
        }
    }

    #[test]
    fn stroke_stops_short_only_when_connector_is_drawn() {
        let start = Endpoint::new(Point::new(0.0, 0.0), 35.0);
        let end = Endpoint::new(Point::new(200.0, 0.0), 35.0);

        let arrow = route_arc(&straight(start, end, ConnectorStyle::default())).unwrap();
        assert!(close(arrow.stroke[1], Point::new(155.0, 0.0)));
        assert!(close(arrow.trimmed[1], Point::new(165.0, 0.0)));

        let plain = ConnectorStyle {
            kind: ConnectorType::None,
            ..ConnectorStyle::default()
        };
        let bare = route_arc(&straight(start, end, plain)).unwrap();
        assert!(close(bare.stroke[1], Point::new(165.0, 0.0)));
        assert!(bare.connector.is_none());
    }

    #[test]
    fn arrowhead_points_into_the_target() {
        let start = Endpoint::new(Point::new(0.0, 0.0), 35.0);
        let end = Endpoint::new(Point::new(200.0, 0.0), 35.0);
        let route = route_arc(&straight(start, end, ConnectorStyle::default())).unwrap();
        let head = route.connector.unwrap();

        // 35 + 15/2 - 1 back from the target center.
        assert!(close(head.center, Point::new(158.5, 0.0)));
        assert!(head.angle.abs() < EPS);

        let [apex, left, right] = head.points();
        assert!(close(apex, Point::new(166.0, 0.0)));
        assert!(close(left, Point::new(151.0, -7.5)));
        assert!(close(right, Point::new(151.0, 7.5)));
        assert_eq!(
            head.svg_transform(),
            "translate(151.00, -7.50) rotate(90.00 7.50 7.50)"
        );
    }

    #[test]
    fn label_defaults_to_midpoint_of_first_trimmed_segment() {
        let start = Endpoint::new(Point::new(100.0, 100.0), 35.0);
        let end = Endpoint::new(Point::new(300.0, 200.0), 35.0);
        let route = route_arc(&straight(start, end, ConnectorStyle::default())).unwrap();

        let expected = route.trimmed[0].lerp(route.trimmed[1], 0.5);
        assert!(close(route.label_anchor.unwrap(), expected));
    }

    #[test]
    fn elbowed_route_trims_toward_adjacent_waypoints() {
        let waypoints = [Point::new(250.0, 350.0)];
        let request = RouteRequest {
            start: Endpoint::new(Point::new(150.0, 350.0), 35.0),
            end: Endpoint::new(Point::new(300.0, 200.0), 35.0),
            waypoints: &waypoints,
            label: ArcLabelPlacement {
                base_segment_index: 1,
                foot_frac_distance: 0.0,
                perp_distance: 0.0,
            },
            connector: ConnectorStyle::default(),
        };

        let route = route_arc(&request).unwrap();
        assert_eq!(route.trimmed.len(), 3);
        assert!(close(route.trimmed[0], Point::new(185.0, 350.0)));
        assert!(close(route.trimmed[1], Point::new(250.0, 350.0)));
        assert!(close(route.label_anchor.unwrap(), Point::new(250.0, 350.0)));
        assert_eq!(route.stroke[1], waypoints[0]);

        let bounds = route.bounds().unwrap();
        assert_eq!(bounds.min_x, 185.0);
        assert_eq!(bounds.max_y, 350.0);
        assert!(route.svg_path_data().starts_with("M 185.00 350.00 L 250.00 350.00"));
    }

    #[test]
    fn perpendicular_offset_follows_clockwise_convention() {
        let placement = ArcLabelPlacement {
            base_segment_index: 0,
            foot_frac_distance: 0.5,
            perp_distance: 10.0,
        };

        let rightward = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(close(label_anchor(&rightward, placement).unwrap(), Point::new(50.0, 10.0)));

        let leftward = [Point::new(100.0, 0.0), Point::new(0.0, 0.0)];
        assert!(close(label_anchor(&leftward, placement).unwrap(), Point::new(50.0, -10.0)));

        let downward = [Point::new(0.0, 0.0), Point::new(0.0, 100.0)];
        assert!(close(label_anchor(&downward, placement).unwrap(), Point::new(-10.0, 50.0)));

        let upward = [Point::new(0.0, 100.0), Point::new(0.0, 0.0)];
        assert!(close(label_anchor(&upward, placement).unwrap(), Point::new(10.0, 50.0)));

        let diagonal = [Point::new(0.0, 0.0), Point::new(100.0, 100.0)];
        let anchor = label_anchor(&diagonal, placement).unwrap();
        let offset = 10.0 / 2.0_f64.sqrt();
        assert!(close(anchor, Point::new(50.0 - offset, 50.0 + offset)));
    }

    #[test]
    fn degenerate_base_segment_yields_no_offset_anchor() {
        let placement = ArcLabelPlacement {
            perp_distance: 12.0,
            ..ArcLabelPlacement::default()
        };
        let collapsed = [Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
        assert!(label_anchor(&collapsed, placement).is_none());
    }

    #[test]
    fn out_of_range_segment_index_uses_last_segment() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let placement = ArcLabelPlacement {
            base_segment_index: 7,
            foot_frac_distance: 1.0,
            perp_distance: 0.0,
        };
        assert!(close(label_anchor(&points, placement).unwrap(), Point::new(10.0, 10.0)));
    }

    #[test]
    fn self_loop_without_waypoints_is_rejected() {
        let vertex = Endpoint::new(Point::new(40.0, 40.0), 35.0);
        let err = route_arc(&straight(vertex, vertex, ConnectorStyle::default())).unwrap_err();
        assert_eq!(err, RouteError::CoincidentEndpoints);
    }

    #[test]
    fn self_loop_with_waypoints_routes_normally() {
        let vertex = Endpoint::new(Point::new(0.0, 0.0), 35.0);
        let waypoints = [Point::new(100.0, 0.0), Point::new(100.0, 100.0), Point::new(0.0, 100.0)];
        let request = RouteRequest {
            start: vertex,
            end: vertex,
            waypoints: &waypoints,
            label: ArcLabelPlacement::default(),
            connector: ConnectorStyle::default(),
        };

        let route = route_arc(&request).unwrap();
        assert!(close(route.trimmed[0], Point::new(35.0, 0.0)));
        assert!(close(route.trimmed[4], Point::new(0.0, 35.0)));
    }

    #[test]
    fn cutout_pads_measured_label() {
        let cutout = label_cutout(Point::new(50.0, 20.0), 30.0, 14.0).unwrap();
        assert_eq!(cutout.width, 40.0);
        assert_eq!(cutout.height, 20.0);
        assert_eq!(cutout.x, 30.0);
        assert_eq!(cutout.y, 10.0);
        assert_eq!(cutout.corner_radius, 20.0);

        assert!(label_cutout(Point::new(f64::NAN, 0.0), 30.0, 14.0).is_none());
    }
}
