//! Connection lifecycle: attaching, detaching, and re-deriving layout.
//!
//! A connection owns its spline and remembers which connectors its ends are
//! attached to. Connectors themselves live on the canvas and are reached
//! through [`ConnectorLookup`]. Movement notifications are routed through an
//! explicit [`Subscriptions`] registry whose entries exist exactly while an
//! end is attached.

use crate::config::EngineConfig;
use crate::constraint::{ControlPointPolicy, EndConstraint};
use crate::id::{ConnectionId, ConnectorId, FigureId};
use crate::kind::ConnectionKind;
use crate::label::Label;
use crate::model::*;
use crate::spline::Spline;
use kurbo::{CubicBez, Point, Rect, Vec2};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Collaborator interface ──────────────────────────────────────────────

/// What the engine needs from the canvas about connectors.
pub trait ConnectorLookup {
    /// Anchor for a connection's start attached to `connector`.
    /// `connection` is passed so the shape can avoid anchoring on itself.
    fn find_start(&self, connector: ConnectorId, connection: &Connection) -> Option<Point>;

    /// Anchor for a connection's end attached to `connector`.
    fn find_end(&self, connector: ConnectorId, connection: &Connection) -> Option<Point>;

    fn orientation(&self, connector: ConnectorId) -> Option<Orientation>;

    /// The figure owning `connector`.
    fn figure(&self, connector: ConnectorId) -> Option<FigureInfo>;

    fn owner(&self, connector: ConnectorId) -> Option<FigureId> {
        self.figure(connector).map(|f| f.id)
    }

    /// Other connectors on the same figure, used when a kind picks a better
    /// exit or entry side.
    fn siblings(&self, _connector: ConnectorId) -> SmallVec<[ConnectorId; 4]> {
        SmallVec::new()
    }
}

// ─── Movement subscriptions ──────────────────────────────────────────────

/// Which connections want to hear about which connector moving.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    by_connector: HashMap<ConnectorId, SmallVec<[ConnectionId; 4]>>,
}

impl Subscriptions {
    pub fn subscribe(&mut self, connector: ConnectorId, connection: ConnectionId) {
        let subs = self.by_connector.entry(connector).or_default();
        if !subs.contains(&connection) {
            subs.push(connection);
        }
    }

    pub fn unsubscribe(&mut self, connector: ConnectorId, connection: ConnectionId) {
        if let Some(subs) = self.by_connector.get_mut(&connector) {
            subs.retain(|c| *c != connection);
            if subs.is_empty() {
                self.by_connector.remove(&connector);
            }
        }
    }

    pub fn subscribers(&self, connector: ConnectorId) -> &[ConnectionId] {
        self.by_connector
            .get(&connector)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_subscribed(&self, connector: ConnectorId, connection: ConnectionId) -> bool {
        self.subscribers(connector).contains(&connection)
    }

    /// Total number of (connector, connection) pairs.
    pub fn len(&self) -> usize {
        self.by_connector.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_connector.is_empty()
    }
}

// ─── Connection ──────────────────────────────────────────────────────────

/// A poly-spline link between two connectors.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub kind: ConnectionKind,
    pub label: Label,
    spline: Spline,
    start: Option<ConnectionEnd>,
    end: Option<ConnectionEnd>,
    start_factor: f64,
    end_factor: f64,
    visible: bool,
    carried_type: Option<DataType>,
    config: EngineConfig,
}

impl Connection {
    /// A new, unconnected connection with no segments.
    pub fn new(id: ConnectionId, kind: ConnectionKind, config: &EngineConfig) -> Self {
        Self {
            id,
            kind,
            label: Label::at(config.label_position),
            spline: Spline::with_hit_tolerance(config.hit_tolerance),
            start: None,
            end: None,
            start_factor: config.default_factor,
            end_factor: config.default_factor,
            visible: true,
            carried_type: None,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─── Geometry access ─────────────────────────────────────────────────

    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    pub fn segment_count(&self) -> usize {
        self.spline.segment_count()
    }

    pub fn point_at(&self, i: usize) -> Point {
        self.spline.point_at(i)
    }

    pub fn ctrl_point_at(&self, i: usize, side: Side) -> Point {
        self.spline.ctrl_point_at(i, side)
    }

    pub fn point_on_curve(&self, position: f64) -> Point {
        self.spline.point_on_curve(position)
    }

    pub fn find_segment(&self, x: f64, y: f64) -> Option<usize> {
        self.spline.find_segment(x, y)
    }

    /// Endpoint constraints derived from the attached ends and factors.
    pub fn policy(&self) -> ControlPointPolicy {
        let constraint = |end: Option<ConnectionEnd>, factor: f64| {
            end.and_then(|e| e.orientation)
                .map(|orientation| EndConstraint {
                    orientation,
                    factor,
                })
        };
        ControlPointPolicy {
            start: constraint(self.start, self.start_factor),
            end: constraint(self.end, self.end_factor),
        }
    }

    // ─── Geometry mutation ───────────────────────────────────────────────

    /// Append a waypoint while the link is being dragged out.
    pub fn push_point(&mut self, p: Point) {
        self.spline.push_point(p);
    }

    /// Move waypoint `index`, then re-run layout so attached ends stay put
    /// and endpoint constraints follow the new neighbour distance.
    pub fn set_point_at(&mut self, index: usize, target: Point, lookup: &dyn ConnectorLookup) -> bool {
        if !self.spline.set_point_at(index, target) {
            return false;
        }
        self.layout_connection(lookup);
        true
    }

    pub fn set_ctrl_point_at(&mut self, index: usize, side: Side, target: Point) -> bool {
        let policy = self.policy();
        self.spline.set_ctrl_point_at(index, side, target, &policy)
    }

    /// Insert a waypoint on the segment under (x, y), then re-run layout
    /// since the end waypoints may have a new neighbour.
    pub fn split_segment(&mut self, x: f64, y: f64, lookup: &dyn ConnectorLookup) -> Option<usize> {
        let index = self.spline.split_segment(x, y)?;
        self.layout_connection(lookup);
        Some(index)
    }

    /// Remove the interior waypoint near (x, y), if any.
    pub fn join_segments(&mut self, x: f64, y: f64, lookup: &dyn ConnectorLookup) -> bool {
        if !self.spline.join_segments(x, y, self.config.join_radius) {
            return false;
        }
        self.layout_connection(lookup);
        true
    }

    pub fn remove_point(&mut self, i: usize, lookup: &dyn ConnectorLookup) -> bool {
        if !self.spline.remove_point(i) {
            return false;
        }
        self.layout_connection(lookup);
        true
    }

    /// Replace the geometry wholesale (used by decoding and undo).
    pub fn set_segments(&mut self, segments: &[CubicBez]) {
        self.spline.replace_segments(segments);
    }

    pub fn rebuild_hit_cache(&mut self) {
        self.spline.rebuild_cache();
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.spline.translate(delta);
    }

    // ─── Factors ─────────────────────────────────────────────────────────

    pub fn start_factor(&self) -> f64 {
        self.start_factor
    }

    pub fn end_factor(&self) -> f64 {
        self.end_factor
    }

    pub fn factor(&self, end: End) -> f64 {
        match end {
            End::Start => self.start_factor,
            End::End => self.end_factor,
        }
    }

    /// Store both factors without re-running layout.
    pub fn set_factors(&mut self, start: f64, end: f64) {
        self.start_factor = start;
        self.end_factor = end;
    }

    pub fn set_start_factor(&mut self, factor: f64, lookup: &dyn ConnectorLookup) {
        self.set_factor(End::Start, factor, lookup);
    }

    pub fn set_end_factor(&mut self, factor: f64, lookup: &dyn ConnectorLookup) {
        self.set_factor(End::End, factor, lookup);
    }

    pub fn set_factor(&mut self, end: End, factor: f64, lookup: &dyn ConnectorLookup) {
        match end {
            End::Start => self.start_factor = factor,
            End::End => self.end_factor = factor,
        }
        self.layout_connection(lookup);
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    pub fn start(&self) -> Option<ConnectionEnd> {
        self.start
    }

    pub fn end(&self) -> Option<ConnectionEnd> {
        self.end
    }

    pub fn connection_end(&self, end: End) -> Option<ConnectionEnd> {
        match end {
            End::Start => self.start,
            End::End => self.end,
        }
    }

    pub fn connector(&self, end: End) -> Option<ConnectorId> {
        self.connection_end(end).map(|e| e.connector)
    }

    pub fn state(&self) -> LinkState {
        LinkState::from_ends(self.start.is_some(), self.end.is_some())
    }

    fn slot(&mut self, end: End) -> &mut Option<ConnectionEnd> {
        match end {
            End::Start => &mut self.start,
            End::End => &mut self.end,
        }
    }

    pub fn connect_start(
        &mut self,
        connector: ConnectorId,
        lookup: &dyn ConnectorLookup,
        subs: &mut Subscriptions,
    ) {
        self.attach(End::Start, connector, lookup, subs);
        let figure = lookup.figure(connector);
        let kind = self.kind;
        kind.handle_connect(self, End::Start, figure.as_ref());
    }

    /// Attach the end, reverse the link if its kind asks for it, then lay out.
    pub fn connect_end(
        &mut self,
        connector: ConnectorId,
        lookup: &dyn ConnectorLookup,
        subs: &mut Subscriptions,
    ) {
        self.attach(End::End, connector, lookup, subs);

        let start_figure = self.start.and_then(|e| lookup.figure(e.connector));
        let end_figure = lookup.figure(connector);
        let mut connected = End::End;
        if self
            .kind
            .should_reverse(start_figure.as_ref(), end_figure.as_ref())
        {
            log::debug!("{} reversed on connect", self.id);
            self.reverse();
            connected = End::Start;
        }

        self.layout_connection(lookup);
        let kind = self.kind;
        kind.handle_connect(self, connected, end_figure.as_ref());
    }

    pub fn connect(
        &mut self,
        end: End,
        connector: ConnectorId,
        lookup: &dyn ConnectorLookup,
        subs: &mut Subscriptions,
    ) {
        match end {
            End::Start => self.connect_start(connector, lookup, subs),
            End::End => self.connect_end(connector, lookup, subs),
        }
    }

    fn attach(
        &mut self,
        end: End,
        connector: ConnectorId,
        lookup: &dyn ConnectorLookup,
        subs: &mut Subscriptions,
    ) {
        if self.connector(end).is_some_and(|c| c != connector) {
            self.disconnect(end, subs);
        }
        log::debug!("{} {:?} -> {}", self.id, end, connector);
        *self.slot(end) = Some(ConnectionEnd {
            connector,
            orientation: lookup.orientation(connector),
        });
        subs.subscribe(connector, self.id);
    }

    pub fn disconnect_start(&mut self, subs: &mut Subscriptions) {
        self.disconnect(End::Start, subs);
    }

    pub fn disconnect_end(&mut self, subs: &mut Subscriptions) {
        self.disconnect(End::End, subs);
    }

    pub fn disconnect(&mut self, end: End, subs: &mut Subscriptions) {
        let Some(current) = self.connection_end(end) else {
            return;
        };
        let kind = self.kind;
        kind.handle_disconnect(self, end);
        subs.unsubscribe(current.connector, self.id);
        *self.slot(end) = None;
        log::debug!("{} {:?} detached from {}", self.id, end, current.connector);
    }

    /// Detach both ends; call before dropping the connection.
    pub fn release(&mut self, subs: &mut Subscriptions) {
        self.disconnect(End::Start, subs);
        self.disconnect(End::End, subs);
    }

    /// Swap the roles of the two ends, keeping the drawn curve unchanged.
    fn reverse(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
        std::mem::swap(&mut self.start_factor, &mut self.end_factor);
        self.spline.reverse();
    }

    /// Snap attached ends to their connectors' current anchors, refresh
    /// their orientations, and re-apply the endpoint constraints.
    pub fn layout_connection(&mut self, lookup: &dyn ConnectorLookup) {
        if let Some(start) = self.start {
            if let Some(anchor) = lookup.find_start(start.connector, self) {
                self.spline.set_point_at(0, anchor);
            }
            self.start = Some(ConnectionEnd {
                orientation: lookup.orientation(start.connector),
                ..start
            });
        }
        if let Some(end) = self.end {
            if let Some(anchor) = lookup.find_end(end.connector, self) {
                let last = self.spline.last_index();
                self.spline.set_point_at(last, anchor);
            }
            self.end = Some(ConnectionEnd {
                orientation: lookup.orientation(end.connector),
                ..end
            });
        }
        self.apply_constraints();
        self.spline.invalidate_cache();
        log::trace!("{} laid out", self.id);
    }

    /// Layout plus whatever extra adjustment the connection kind performs.
    ///
    /// Flow links move each attached end to the oriented connector of the
    /// same figure that faces the opposite end best.
    pub fn layout_and_adjust_connection(
        &mut self,
        lookup: &dyn ConnectorLookup,
        subs: &mut Subscriptions,
    ) {
        self.layout_connection(lookup);
        if self.kind == ConnectionKind::Flow && !self.spline.is_empty() {
            for end in [End::Start, End::End] {
                if let Some(better) = self.better_connector(end, lookup)
                    && Some(better) != self.connector(end)
                {
                    log::debug!("{} {:?} adjusted to {}", self.id, end, better);
                    self.attach(end, better, lookup, subs);
                }
            }
        }
        self.layout_connection(lookup);
    }

    fn better_connector(&self, end: End, lookup: &dyn ConnectorLookup) -> Option<ConnectorId> {
        let current = self.connection_end(end)?;
        current.orientation?;
        let (here, there) = match end {
            End::Start => (0, 1),
            End::End => {
                let last = self.spline.last_index();
                (last, last - 1)
            }
        };
        let toward = self.spline.point_at(there) - self.spline.point_at(here);
        if toward.hypot() <= f64::EPSILON {
            return None;
        }
        let toward = toward.normalize();
        std::iter::once(current.connector)
            .chain(lookup.siblings(current.connector))
            .filter_map(|c| lookup.orientation(c).map(|o| (c, o.direction().dot(toward))))
            .fold(None, |best: Option<(ConnectorId, f64)>, (c, score)| match best {
                Some((_, s)) if s >= score => best,
                _ => Some((c, score)),
            })
            .map(|(c, _)| c)
    }

    /// Put the constrained endpoint control points where the policy says.
    pub fn apply_constraints(&mut self) {
        let policy = self.policy();
        let last = self.spline.last_index();
        if last == 0 {
            return;
        }
        if policy.start.is_some() {
            let current = self.spline.ctrl_point_at(0, Side::Right);
            self.spline
                .set_ctrl_point_at(0, Side::Right, current, &policy);
        }
        if policy.end.is_some() {
            let current = self.spline.ctrl_point_at(last, Side::Left);
            self.spline
                .set_ctrl_point_at(last, Side::Left, current, &policy);
        }
    }

    // ─── Kind state ──────────────────────────────────────────────────────

    /// Data type carried by a data link, once a socket has been attached.
    pub fn carried_type(&self) -> Option<DataType> {
        self.carried_type
    }

    pub(crate) fn set_carried_type(&mut self, data_type: Option<DataType>) {
        self.carried_type = data_type;
    }

    // ─── Label ───────────────────────────────────────────────────────────

    pub fn label_anchor(&self) -> Point {
        self.label.anchor(&self.spline)
    }

    pub fn label_position(&self) -> Point {
        self.label.position(&self.spline)
    }

    pub fn set_label_offset(&mut self, offset: Vec2) {
        self.label.offset = offset;
    }

    // ─── Canvas-facing queries ───────────────────────────────────────────

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether (x, y) hits the curve or the label.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        if !self.visible {
            return false;
        }
        self.spline.find_segment(x, y).is_some()
            || self
                .label
                .bounds(&self.spline)
                .is_some_and(|b| b.contains(Point::new(x, y)))
    }

    /// Curve bounds grown by the display margin, unioned with the label box.
    pub fn display_box(&self) -> Rect {
        let margin = self.config.display_margin;
        let curve = self.spline.bounds().inflate(margin, margin);
        match self.label.bounds(&self.spline) {
            Some(label) => curve.union(label),
            None => curve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Connectors pinned at fixed points.
    struct Pins(HashMap<ConnectorId, (Point, Option<Orientation>, FigureInfo)>);

    impl Pins {
        fn new() -> Self {
            Pins(HashMap::new())
        }

        fn pin(&mut self, name: &str, at: Point, orientation: Option<Orientation>) -> ConnectorId {
            let id = ConnectorId::intern(name);
            let figure = FigureInfo {
                id: FigureId::intern(name),
                kind: FigureKind::Node,
            };
            self.0.insert(id, (at, orientation, figure));
            id
        }
    }

    impl ConnectorLookup for Pins {
        fn find_start(&self, connector: ConnectorId, _: &Connection) -> Option<Point> {
            self.0.get(&connector).map(|p| p.0)
        }
        fn find_end(&self, connector: ConnectorId, _: &Connection) -> Option<Point> {
            self.0.get(&connector).map(|p| p.0)
        }
        fn orientation(&self, connector: ConnectorId) -> Option<Orientation> {
            self.0.get(&connector).and_then(|p| p.1)
        }
        fn figure(&self, connector: ConnectorId) -> Option<FigureInfo> {
            self.0.get(&connector).map(|p| p.2)
        }
    }

    fn link() -> Connection {
        let mut c = Connection::new(
            ConnectionId::with_prefix("test_link"),
            ConnectionKind::Flow,
            &EngineConfig::default(),
        );
        c.push_point(Point::new(5.0, 5.0));
        c.push_point(Point::new(95.0, 5.0));
        c
    }

    #[test]
    fn starts_unconnected_and_empty() {
        let c = Connection::new(
            ConnectionId::intern("fresh"),
            ConnectionKind::Flow,
            &EngineConfig::default(),
        );
        assert_eq!(c.state(), LinkState::Unconnected);
        assert_eq!(c.segment_count(), 0);
        assert_eq!(c.start_factor(), 0.3);
        assert_eq!(c.end_factor(), 0.3);
    }

    #[test]
    fn oriented_ends_constrain_control_points() {
        let mut pins = Pins::new();
        let a = pins.pin("right_side", Point::new(0.0, 0.0), Some(Orientation::Right));
        let b = pins.pin("left_side", Point::new(100.0, 0.0), Some(Orientation::Left));
        let mut subs = Subscriptions::default();
        let mut c = link();

        c.connect_start(a, &pins, &mut subs);
        assert_eq!(c.state(), LinkState::StartOnly);
        c.connect_end(b, &pins, &mut subs);
        assert_eq!(c.state(), LinkState::Connected);

        assert_eq!(c.point_at(0), Point::new(0.0, 0.0));
        assert_eq!(c.point_at(1), Point::new(100.0, 0.0));
        assert_eq!(c.ctrl_point_at(0, Side::Right), Point::new(30.0, 0.0));
        assert_eq!(c.ctrl_point_at(1, Side::Left), Point::new(70.0, 0.0));
        assert!(subs.is_subscribed(a, c.id));
        assert!(subs.is_subscribed(b, c.id));
    }

    #[test]
    fn split_and_join_rederive_end_constraints() {
        let mut pins = Pins::new();
        let a = pins.pin("split_a", Point::new(0.0, 0.0), Some(Orientation::Right));
        let b = pins.pin("split_b", Point::new(100.0, 0.0), Some(Orientation::Left));
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);

        assert_eq!(c.split_segment(20.0, 5.0, &pins), Some(1));
        let near = Point::new(0.0, 0.0).distance(Point::new(20.0, 5.0)) * 0.3;
        let far = Point::new(100.0, 0.0).distance(Point::new(20.0, 5.0)) * 0.3;
        let start = c.ctrl_point_at(0, Side::Right);
        let end = c.ctrl_point_at(2, Side::Left);
        assert!((start - Point::new(near, 0.0)).hypot() < 1e-9, "{start:?}");
        assert!((end - Point::new(100.0 - far, 0.0)).hypot() < 1e-9, "{end:?}");

        assert!(c.join_segments(21.0, 4.0, &pins));
        assert_eq!(c.segment_count(), 1);
        assert_eq!(c.ctrl_point_at(0, Side::Right), Point::new(30.0, 0.0));
        assert_eq!(c.ctrl_point_at(1, Side::Left), Point::new(70.0, 0.0));

        assert_eq!(c.split_segment(20.0, 5.0, &pins), Some(1));
        assert!(c.remove_point(1, &pins));
        assert_eq!(c.segment_count(), 1);
        assert_eq!(c.ctrl_point_at(0, Side::Right), Point::new(30.0, 0.0));
        assert_eq!(c.ctrl_point_at(1, Side::Left), Point::new(70.0, 0.0));
    }

    #[test]
    fn constrained_ctrl_point_ignores_direct_target() {
        let mut pins = Pins::new();
        let a = pins.pin("direct_a", Point::new(0.0, 0.0), Some(Orientation::Bottom));
        let b = pins.pin("direct_b", Point::new(0.0, 100.0), None);
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);

        c.set_ctrl_point_at(0, Side::Right, Point::new(80.0, 80.0));
        assert_eq!(c.ctrl_point_at(0, Side::Right), Point::new(0.0, 30.0));
        // The free end is not constrained.
        c.set_ctrl_point_at(1, Side::Left, Point::new(40.0, 60.0));
        assert_eq!(c.ctrl_point_at(1, Side::Left), Point::new(40.0, 60.0));
    }

    #[test]
    fn reconnect_rederives_anchor_and_orientation() {
        let mut pins = Pins::new();
        let a = pins.pin("re_a", Point::new(0.0, 0.0), Some(Orientation::Right));
        let b = pins.pin("re_b", Point::new(100.0, 0.0), Some(Orientation::Left));
        let c2 = pins.pin("re_c", Point::new(100.0, 200.0), Some(Orientation::Top));
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);

        c.disconnect_end(&mut subs);
        assert_eq!(c.state(), LinkState::StartOnly);
        assert!(!subs.is_subscribed(b, c.id));

        c.connect_end(c2, &pins, &mut subs);
        c.layout_connection(&pins);
        let end = c.point_at(1);
        assert_eq!(end, Point::new(100.0, 200.0));
        let distance = Point::new(0.0, 0.0).distance(end);
        let ctrl = c.ctrl_point_at(1, Side::Left);
        assert_eq!(ctrl.x, 100.0);
        assert!((ctrl.y - (200.0 - distance * 0.3)).abs() < 1e-9);
        assert_eq!(c.end().and_then(|e| e.orientation), Some(Orientation::Top));
    }

    #[test]
    fn connector_movement_is_followed_on_layout() {
        let mut pins = Pins::new();
        let a = pins.pin("move_a", Point::new(0.0, 0.0), None);
        let b = pins.pin("move_b", Point::new(100.0, 0.0), None);
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);

        pins.pin("move_b", Point::new(150.0, 40.0), None);
        c.layout_connection(&pins);
        assert_eq!(c.point_at(1), Point::new(150.0, 40.0));
    }

    #[test]
    fn waypoint_move_on_attached_end_snaps_back() {
        let mut pins = Pins::new();
        let a = pins.pin("snap_a", Point::new(0.0, 0.0), None);
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);

        assert!(c.set_point_at(0, Point::new(-50.0, -50.0), &pins));
        assert_eq!(c.point_at(0), Point::new(0.0, 0.0));
        assert!(c.set_point_at(1, Point::new(120.0, 10.0), &pins));
        assert_eq!(c.point_at(1), Point::new(120.0, 10.0));
    }

    #[test]
    fn release_unsubscribes_both_ends() {
        let mut pins = Pins::new();
        let a = pins.pin("rel_a", Point::new(0.0, 0.0), None);
        let b = pins.pin("rel_b", Point::new(10.0, 0.0), None);
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);
        assert_eq!(subs.len(), 2);
        c.release(&mut subs);
        assert!(subs.is_empty());
        assert_eq!(c.state(), LinkState::Unconnected);
    }

    #[test]
    fn factor_change_relayouts() {
        let mut pins = Pins::new();
        let a = pins.pin("fac_a", Point::new(0.0, 0.0), Some(Orientation::Right));
        let b = pins.pin("fac_b", Point::new(100.0, 0.0), Some(Orientation::Left));
        let mut subs = Subscriptions::default();
        let mut c = link();
        c.connect_start(a, &pins, &mut subs);
        c.connect_end(b, &pins, &mut subs);

        c.set_start_factor(0.5, &pins);
        assert_eq!(c.ctrl_point_at(0, Side::Right), Point::new(50.0, 0.0));
        assert_eq!(c.ctrl_point_at(1, Side::Left), Point::new(70.0, 0.0));
    }

    #[test]
    fn display_box_covers_curve_and_label() {
        let mut c = link();
        let b = c.display_box();
        assert_eq!(b, Rect::new(-5.0, -5.0, 105.0, 15.0));

        c.label.text = Some("yes".into());
        c.label.size = kurbo::Size::new(40.0, 20.0);
        c.set_label_offset(Vec2::new(0.0, 60.0));
        let b = c.display_box();
        assert_eq!(b.y1, 75.0);
        assert!(c.contains_point(50.0, 65.0));
        assert!(c.contains_point(50.0, 6.0));
        assert!(!c.contains_point(50.0, 40.0));

        c.set_visible(false);
        assert!(!c.contains_point(50.0, 6.0));
    }
}
