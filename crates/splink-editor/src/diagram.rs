//! Reference canvas: figures, connectors, and the connections between them.
//!
//! Figures live in a containment graph (a hidden root with nested children)
//! so "does this shape include that connection" can be answered by walking
//! a subtree. The diagram is the [`ConnectorLookup`] every connection lays
//! itself out against, and it applies the [`ConnectionMutation`]s the
//! handles produce.

use kurbo::{Affine, Point, Rect, Vec2};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Dfs;
use smallvec::SmallVec;
use splink_core::{
    Connection, ConnectionId, ConnectionKind, ConnectorId, ConnectorLookup, EngineConfig, End,
    FigureId, FigureInfo, FigureKind, LinkCheck, Orientation, Side, Subscriptions,
};
use std::collections::HashMap;

// ─── Figures ─────────────────────────────────────────────────────────────

/// An attachment point on a figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorSpec {
    pub id: ConnectorId,
    /// Position relative to the figure bounds, `(0, 0)` top-left to
    /// `(1, 1)` bottom-right. `None` chops the figure box along the line
    /// from its center toward the connection.
    pub rel: Option<Point>,
    pub orientation: Option<Orientation>,
}

impl ConnectorSpec {
    pub fn fixed(id: ConnectorId, rel: Point, orientation: Option<Orientation>) -> Self {
        Self {
            id,
            rel: Some(rel),
            orientation,
        }
    }

    pub fn chop(id: ConnectorId) -> Self {
        Self {
            id,
            rel: None,
            orientation: None,
        }
    }
}

/// A shape on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub id: FigureId,
    pub kind: FigureKind,
    pub bounds: Rect,
    pub connectors: SmallVec<[ConnectorSpec; 4]>,
    /// Whether connections may attach to this figure at all.
    pub can_connect: bool,
    /// Set on figures that belong to a connection (e.g. its label box).
    pub attached_to: Option<ConnectionId>,
}

impl Figure {
    pub fn new(id: &str, kind: FigureKind, bounds: Rect) -> Self {
        Self {
            id: FigureId::intern(id),
            kind,
            bounds,
            connectors: SmallVec::new(),
            can_connect: true,
            attached_to: None,
        }
    }

    pub fn with_connector(mut self, spec: ConnectorSpec) -> Self {
        self.connectors.push(spec);
        self
    }

    /// Four oriented connectors at the edge midpoints, named
    /// `<id>_top`, `<id>_right`, `<id>_bottom`, `<id>_left`.
    pub fn with_side_connectors(self) -> Self {
        let id = self.id;
        let side = |name: &str, rel: (f64, f64), o: Orientation| {
            ConnectorSpec::fixed(
                ConnectorId::intern(&format!("{}_{name}", id.as_str())),
                Point::new(rel.0, rel.1),
                Some(o),
            )
        };
        self.with_connector(side("top", (0.5, 0.0), Orientation::Top))
            .with_connector(side("right", (1.0, 0.5), Orientation::Right))
            .with_connector(side("bottom", (0.5, 1.0), Orientation::Bottom))
            .with_connector(side("left", (0.0, 0.5), Orientation::Left))
    }

    pub fn info(&self) -> FigureInfo {
        FigureInfo {
            id: self.id,
            kind: self.kind,
        }
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&ConnectorSpec> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Anchor of `spec`, using `toward` for chopped connectors.
    fn anchor(&self, spec: &ConnectorSpec, toward: Option<Point>) -> Point {
        let b = self.bounds;
        match spec.rel {
            Some(rel) => Point::new(b.x0 + rel.x * b.width(), b.y0 + rel.y * b.height()),
            None => chop_box(b, toward.unwrap_or(b.center())),
        }
    }
}

/// Where the ray from the center of `rect` toward `toward` leaves the box.
fn chop_box(rect: Rect, toward: Point) -> Point {
    let center = rect.center();
    let d = toward - center;
    if d.hypot() <= f64::EPSILON {
        return center;
    }
    let tx = if d.x != 0.0 {
        rect.width() / 2.0 / d.x.abs()
    } else {
        f64::INFINITY
    };
    let ty = if d.y != 0.0 {
        rect.height() / 2.0 / d.y.abs()
    } else {
        f64::INFINITY
    };
    center + d * tx.min(ty)
}

// ─── Mutations ───────────────────────────────────────────────────────────

/// A single edit to a connection, produced by the handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionMutation {
    SetPoint {
        id: ConnectionId,
        index: usize,
        to: Point,
    },
    /// Move waypoint 0 or N, whichever `end` refers to.
    SetEndPoint {
        id: ConnectionId,
        end: End,
        to: Point,
    },
    SetCtrlPoint {
        id: ConnectionId,
        index: usize,
        side: Side,
        to: Point,
    },
    SetFactor {
        id: ConnectionId,
        end: End,
        factor: f64,
    },
    MoveLabel {
        id: ConnectionId,
        offset: Vec2,
    },
    SplitSegment {
        id: ConnectionId,
        at: Point,
    },
    JoinSegments {
        id: ConnectionId,
        at: Point,
    },
    Connect {
        id: ConnectionId,
        end: End,
        connector: ConnectorId,
    },
    Disconnect {
        id: ConnectionId,
        end: End,
    },
    LayoutAndAdjust {
        id: ConnectionId,
    },
    MarkTargets {
        id: ConnectionId,
        end: End,
    },
    ClearMarks,
}

impl ConnectionMutation {
    /// The connection this mutation edits, if any.
    pub fn target(&self) -> Option<ConnectionId> {
        match self {
            Self::SetPoint { id, .. }
            | Self::SetEndPoint { id, .. }
            | Self::SetCtrlPoint { id, .. }
            | Self::SetFactor { id, .. }
            | Self::MoveLabel { id, .. }
            | Self::SplitSegment { id, .. }
            | Self::JoinSegments { id, .. }
            | Self::Connect { id, .. }
            | Self::Disconnect { id, .. }
            | Self::LayoutAndAdjust { id }
            | Self::MarkTargets { id, .. } => Some(*id),
            Self::ClearMarks => None,
        }
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

pub struct Diagram {
    pub config: EngineConfig,
    /// Type-check settings applied when picking reconnect targets.
    pub link_check: LinkCheck,
    figures: StableDiGraph<Figure, ()>,
    root: NodeIndex,
    id_index: HashMap<FigureId, NodeIndex>,
    connector_index: HashMap<ConnectorId, NodeIndex>,
    connections: HashMap<ConnectionId, Connection>,
    /// Paint order; last is topmost.
    order: Vec<ConnectionId>,
    subscriptions: Subscriptions,
    marked: Vec<FigureId>,
    damage: Vec<Rect>,
    view: Affine,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Diagram {
    pub fn new(config: EngineConfig) -> Self {
        let mut figures = StableDiGraph::new();
        let mut root_figure = Figure::new("root", FigureKind::Node, Rect::ZERO);
        root_figure.can_connect = false;
        let root = figures.add_node(root_figure);
        Self {
            config,
            link_check: LinkCheck::default(),
            figures,
            root,
            id_index: HashMap::new(),
            connector_index: HashMap::new(),
            connections: HashMap::new(),
            order: Vec::new(),
            subscriptions: Subscriptions::default(),
            marked: Vec::new(),
            damage: Vec::new(),
            view: Affine::IDENTITY,
        }
    }

    // ─── Figures ─────────────────────────────────────────────────────────

    /// Add `figure` under `parent` (top level when `None`).
    pub fn add_figure(&mut self, parent: Option<FigureId>, figure: Figure) -> Result<NodeIndex, String> {
        if self.id_index.contains_key(&figure.id) {
            return Err(format!("Duplicate figure {}", figure.id));
        }
        if let Some(dup) = figure
            .connectors
            .iter()
            .find(|c| self.connector_index.contains_key(&c.id))
        {
            return Err(format!("Duplicate connector {}", dup.id));
        }
        let parent_idx = match parent {
            Some(p) => *self
                .id_index
                .get(&p)
                .ok_or_else(|| format!("Unknown parent figure {p}"))?,
            None => self.root,
        };

        let id = figure.id;
        let connectors: SmallVec<[ConnectorId; 4]> = figure.connectors.iter().map(|c| c.id).collect();
        let idx = self.figures.add_node(figure);
        self.figures.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        for c in connectors {
            self.connector_index.insert(c, idx);
        }
        Ok(idx)
    }

    pub fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.id_index.get(&id).map(|&idx| &self.figures[idx])
    }

    /// Children of `idx` in insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .figures
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.figures
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Whether `other` is `container` or nested inside it.
    pub fn includes(&self, container: FigureId, other: FigureId) -> bool {
        let (Some(&c), Some(&o)) = (self.id_index.get(&container), self.id_index.get(&other)) else {
            return false;
        };
        let mut cursor = Some(o);
        while let Some(idx) = cursor {
            if idx == c {
                return true;
            }
            cursor = self.parent(idx);
        }
        false
    }

    /// Whether anything in the subtree of `figure` belongs to `connection`.
    pub fn includes_connection(&self, figure: FigureId, connection: ConnectionId) -> bool {
        let Some(&start) = self.id_index.get(&figure) else {
            return false;
        };
        let mut dfs = Dfs::new(&self.figures, start);
        while let Some(idx) = dfs.next(&self.figures) {
            if self.figures[idx].attached_to == Some(connection) {
                return true;
            }
        }
        false
    }

    /// Translate a figure and everything nested in it, then re-lay out
    /// every connection attached to the moved connectors.
    pub fn move_figure(&mut self, id: FigureId, delta: Vec2) -> bool {
        let Some(&start) = self.id_index.get(&id) else {
            return false;
        };
        let mut moved_connectors = Vec::new();
        let mut dfs = Dfs::new(&self.figures, start);
        while let Some(idx) = dfs.next(&self.figures) {
            let figure = &mut self.figures[idx];
            self.damage.push(figure.bounds);
            figure.bounds = figure.bounds + delta;
            self.damage.push(figure.bounds);
            moved_connectors.extend(figure.connectors.iter().map(|c| c.id));
        }

        let mut affected: Vec<ConnectionId> = Vec::new();
        for connector in moved_connectors {
            for &conn in self.subscriptions.subscribers(connector) {
                if !affected.contains(&conn) {
                    affected.push(conn);
                }
            }
        }
        log::debug!("moved {id}; relayout {} connections", affected.len());
        for conn in affected {
            self.with_connection(conn, |c, lookup, _| c.layout_connection(lookup));
        }
        true
    }

    /// Topmost figure under `p` accepted by `accept`, children before parents.
    fn topmost(&self, idx: NodeIndex, p: Point, accept: &dyn Fn(&Figure) -> bool) -> Option<NodeIndex> {
        for child in self.children(idx).into_iter().rev() {
            if let Some(hit) = self.topmost(child, p, accept) {
                return Some(hit);
            }
        }
        if idx == self.root {
            return None;
        }
        let figure = &self.figures[idx];
        (figure.bounds.contains(p) && accept(figure)).then_some(idx)
    }

    /// Connector of the topmost connectable figure under (x, y), the one
    /// whose anchor is nearest to the point.
    pub fn connector_at(&self, x: f64, y: f64) -> Option<ConnectorId> {
        let p = Point::new(x, y);
        let idx = self.topmost(self.root, p, &|f: &Figure| f.can_connect && !f.connectors.is_empty())?;
        nearest_connector(&self.figures[idx], p)
    }

    /// Best reconnect target under `p` for `end` of `connection`.
    ///
    /// Skips figures that include the connection itself and figures the
    /// connection kind refuses to link to the opposite end.
    pub fn candidate_at(&self, p: Point, connection: ConnectionId, end: End) -> Option<ConnectorId> {
        let conn = self.connections.get(&connection)?;
        let idx = self.topmost(self.root, p, &|f: &Figure| self.accepts(conn, end, f))?;
        nearest_connector(&self.figures[idx], p)
    }

    fn accepts(&self, connection: &Connection, end: End, figure: &Figure) -> bool {
        if !figure.can_connect
            || figure.connectors.is_empty()
            || self.includes_connection(figure.id, connection.id)
        {
            return false;
        }
        let other = connection
            .connector(end.opposite())
            .and_then(|c| self.figure_info(c));
        let candidate = figure.info();
        let (start, end_figure) = match end {
            End::Start => (Some(&candidate), other.as_ref()),
            End::End => (other.as_ref(), Some(&candidate)),
        };
        connection
            .kind
            .can_link_figures(start, end_figure, self.link_check)
    }

    fn figure_info(&self, connector: ConnectorId) -> Option<FigureInfo> {
        self.connector_index
            .get(&connector)
            .map(|&idx| self.figures[idx].info())
    }

    // ─── Target markers ──────────────────────────────────────────────────

    /// Mark every figure that `end` of `connection` could attach to.
    pub fn mark_targets(&mut self, connection: ConnectionId, end: End) {
        let Some(conn) = self.connections.get(&connection) else {
            return;
        };
        let marked: Vec<FigureId> = self
            .figures
            .node_indices()
            .filter(|&idx| idx != self.root)
            .map(|idx| &self.figures[idx])
            .filter(|f| self.accepts(conn, end, f))
            .map(|f| f.id)
            .collect();
        let bounds: Vec<Rect> = marked
            .iter()
            .filter_map(|id| self.figure(*id).map(|f| f.bounds))
            .collect();
        self.damage.extend(bounds);
        self.marked = marked;
    }

    pub fn marked(&self) -> &[FigureId] {
        &self.marked
    }

    pub fn clear_marks(&mut self) {
        let bounds: Vec<Rect> = std::mem::take(&mut self.marked)
            .into_iter()
            .filter_map(|id| self.figure(id).map(|f| f.bounds))
            .collect();
        self.damage.extend(bounds);
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// A fresh, unconnected connection using this diagram's config.
    pub fn create_connection(&mut self, kind: ConnectionKind) -> ConnectionId {
        let id = ConnectionId::with_prefix("link");
        self.add_connection(Connection::new(id, kind, &self.config));
        id
    }

    pub fn add_connection(&mut self, connection: Connection) -> ConnectionId {
        let id = connection.id;
        self.damage.push(connection.display_box());
        if !self.order.contains(&id) {
            self.order.push(id);
        }
        self.connections.insert(id, connection);
        id
    }

    /// Remove a connection, unsubscribing both of its ends.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let mut connection = self.connections.remove(&id)?;
        connection.release(&mut self.subscriptions);
        self.order.retain(|c| *c != id);
        self.damage.push(connection.display_box());
        Some(connection)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connections in paint order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.order.iter().filter_map(|id| self.connections.get(id))
    }

    /// Topmost visible connection whose curve or label contains (x, y).
    pub fn connection_at(&self, x: f64, y: f64) -> Option<ConnectionId> {
        self.order
            .iter()
            .rev()
            .find(|id| {
                self.connections
                    .get(id)
                    .is_some_and(|c| c.contains_point(x, y))
            })
            .copied()
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Attach `end` of a connection to `connector`, refusing links the
    /// connection kind does not allow.
    pub fn connect(&mut self, id: ConnectionId, end: End, connector: ConnectorId) -> Result<(), String> {
        let conn = self
            .connections
            .get(&id)
            .ok_or_else(|| format!("Unknown connection {id}"))?;
        let &idx = self
            .connector_index
            .get(&connector)
            .ok_or_else(|| format!("Unknown connector {connector}"))?;
        if !self.accepts(conn, end, &self.figures[idx]) {
            return Err(format!("{connector} cannot take the {end:?} of {id}"));
        }
        self.with_connection(id, |c, lookup, subs| c.connect(end, connector, lookup, subs));
        Ok(())
    }

    /// Re-run layout for one connection (explicit update request).
    pub fn update_connection(&mut self, id: ConnectionId) -> bool {
        self.with_connection(id, |c, lookup, _| c.layout_connection(lookup))
            .is_some()
    }

    /// Run `f` on a connection with the diagram as its lookup.
    ///
    /// The connection and the subscription registry are taken out of the
    /// diagram for the duration of the call. Damage covers the display box
    /// before and after.
    pub(crate) fn with_connection<R>(
        &mut self,
        id: ConnectionId,
        f: impl FnOnce(&mut Connection, &Diagram, &mut Subscriptions) -> R,
    ) -> Option<R> {
        let mut connection = self.connections.remove(&id)?;
        let mut subs = std::mem::take(&mut self.subscriptions);
        let before = connection.display_box();

        let result = f(&mut connection, self, &mut subs);

        self.damage.push(before);
        self.damage.push(connection.display_box());
        self.subscriptions = subs;
        self.connections.insert(id, connection);
        Some(result)
    }

    /// Apply a mutation. Returns whether anything was changed.
    pub fn apply_mutation(&mut self, mutation: ConnectionMutation) -> bool {
        log::trace!("apply {mutation:?}");
        match mutation {
            ConnectionMutation::SetPoint { id, index, to } => self
                .with_connection(id, |c, lookup, _| c.set_point_at(index, to, lookup))
                .unwrap_or(false),
            ConnectionMutation::SetEndPoint { id, end, to } => self
                .with_connection(id, |c, lookup, _| {
                    let index = match end {
                        End::Start => 0,
                        End::End => c.spline().last_index(),
                    };
                    c.set_point_at(index, to, lookup)
                })
                .unwrap_or(false),
            ConnectionMutation::SetCtrlPoint {
                id,
                index,
                side,
                to,
            } => self
                .with_connection(id, |c, _, _| c.set_ctrl_point_at(index, side, to))
                .unwrap_or(false),
            ConnectionMutation::SetFactor { id, end, factor } => self
                .with_connection(id, |c, lookup, _| c.set_factor(end, factor, lookup))
                .is_some(),
            ConnectionMutation::MoveLabel { id, offset } => self
                .with_connection(id, |c, _, _| c.set_label_offset(offset))
                .is_some(),
            ConnectionMutation::SplitSegment { id, at } => self
                .with_connection(id, |c, lookup, _| c.split_segment(at.x, at.y, lookup).is_some())
                .unwrap_or(false),
            ConnectionMutation::JoinSegments { id, at } => self
                .with_connection(id, |c, lookup, _| c.join_segments(at.x, at.y, lookup))
                .unwrap_or(false),
            ConnectionMutation::Connect { id, end, connector } => {
                if !self.connector_index.contains_key(&connector) {
                    log::warn!("connect {id}: unknown connector {connector}");
                    return false;
                }
                self.with_connection(id, |c, lookup, subs| c.connect(end, connector, lookup, subs))
                    .is_some()
            }
            ConnectionMutation::Disconnect { id, end } => self
                .with_connection(id, |c, _, subs| c.disconnect(end, subs))
                .is_some(),
            ConnectionMutation::LayoutAndAdjust { id } => self
                .with_connection(id, |c, lookup, subs| c.layout_and_adjust_connection(lookup, subs))
                .is_some(),
            ConnectionMutation::MarkTargets { id, end } => {
                self.mark_targets(id, end);
                true
            }
            ConnectionMutation::ClearMarks => {
                self.clear_marks();
                true
            }
        }
    }

    // ─── Damage & view ───────────────────────────────────────────────────

    /// Regions needing a redraw since the last call.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.damage)
    }

    pub fn view(&self) -> Affine {
        self.view
    }

    /// Set the document → view transform (pan and zoom).
    pub fn set_view(&mut self, view: Affine) {
        self.view = view;
    }

    pub fn view_to_doc(&self, p: Point) -> Point {
        self.view.inverse() * p
    }

    pub fn doc_to_view(&self, p: Point) -> Point {
        self.view * p
    }
}

fn nearest_connector(figure: &Figure, p: Point) -> Option<ConnectorId> {
    figure
        .connectors
        .iter()
        .map(|spec| (spec.id, figure.anchor(spec, Some(p)).distance(p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

impl ConnectorLookup for Diagram {
    fn find_start(&self, connector: ConnectorId, connection: &Connection) -> Option<Point> {
        let toward = (connection.segment_count() > 0).then(|| connection.point_at(1));
        self.anchor(connector, toward)
    }

    fn find_end(&self, connector: ConnectorId, connection: &Connection) -> Option<Point> {
        let last = connection.segment_count();
        let toward = (last > 0).then(|| connection.point_at(last - 1));
        self.anchor(connector, toward)
    }

    fn orientation(&self, connector: ConnectorId) -> Option<Orientation> {
        let &idx = self.connector_index.get(&connector)?;
        self.figures[idx].connector(connector)?.orientation
    }

    fn figure(&self, connector: ConnectorId) -> Option<FigureInfo> {
        self.figure_info(connector)
    }

    fn siblings(&self, connector: ConnectorId) -> SmallVec<[ConnectorId; 4]> {
        self.connector_index
            .get(&connector)
            .map(|&idx| {
                self.figures[idx]
                    .connectors
                    .iter()
                    .map(|c| c.id)
                    .filter(|&c| c != connector)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Diagram {
    fn anchor(&self, connector: ConnectorId, toward: Option<Point>) -> Option<Point> {
        let &idx = self.connector_index.get(&connector)?;
        let figure = &self.figures[idx];
        let spec = figure.connector(connector)?;
        Some(figure.anchor(spec, toward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn boxed(name: &str, x: f64, y: f64) -> Figure {
        Figure::new(name, FigureKind::Node, Rect::new(x, y, x + 40.0, y + 20.0)).with_side_connectors()
    }

    #[test]
    fn side_connectors_anchor_at_edge_midpoints() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("anchor_box", 0.0, 0.0)).unwrap();
        let right = ConnectorId::intern("anchor_box_right");
        let conn = Connection::new(ConnectionId::intern("anchor_test"), ConnectionKind::Flow, &d.config);
        assert_eq!(d.find_start(right, &conn), Some(Point::new(40.0, 10.0)));
        assert_eq!(d.orientation(right), Some(Orientation::Right));
        assert_eq!(d.siblings(right).len(), 3);
    }

    #[test]
    fn chop_box_meets_the_border() {
        let r = Rect::new(0.0, 0.0, 40.0, 20.0);
        assert_eq!(chop_box(r, Point::new(100.0, 10.0)), Point::new(40.0, 10.0));
        assert_eq!(chop_box(r, Point::new(20.0, -10.0)), Point::new(20.0, 0.0));
        assert_eq!(chop_box(r, r.center()), r.center());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("dup_box", 0.0, 0.0)).unwrap();
        assert!(d.add_figure(None, boxed("dup_box", 50.0, 0.0)).is_err());
        let missing = Some(FigureId::intern("no_such_parent"));
        assert!(d.add_figure(missing, boxed("orphan", 0.0, 0.0)).is_err());
    }

    #[test]
    fn containment_is_transitive() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("outer", 0.0, 0.0)).unwrap();
        d.add_figure(Some(FigureId::intern("outer")), boxed("middle", 5.0, 5.0))
            .unwrap();
        d.add_figure(Some(FigureId::intern("middle")), boxed("inner", 6.0, 6.0))
            .unwrap();
        assert!(d.includes(FigureId::intern("outer"), FigureId::intern("inner")));
        assert!(!d.includes(FigureId::intern("inner"), FigureId::intern("outer")));
    }

    #[test]
    fn connector_at_prefers_topmost_and_nearest() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("under", 0.0, 0.0)).unwrap();
        d.add_figure(None, boxed("over", 10.0, 0.0)).unwrap();
        assert_eq!(d.connector_at(45.0, 10.0), Some(ConnectorId::intern("over_right")));
        assert_eq!(d.connector_at(2.0, 10.0), Some(ConnectorId::intern("under_left")));
        assert_eq!(d.connector_at(200.0, 200.0), None);
    }

    #[test]
    fn moving_a_figure_relayouts_attached_connections() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("mv_src", 0.0, 0.0)).unwrap();
        d.add_figure(None, boxed("mv_dst", 100.0, 0.0)).unwrap();
        let id = d.create_connection(ConnectionKind::Flow);
        d.with_connection(id, |c, _, _| {
            c.push_point(Point::new(40.0, 10.0));
            c.push_point(Point::new(100.0, 10.0));
        });
        d.connect(id, End::Start, ConnectorId::intern("mv_src_right")).unwrap();
        d.connect(id, End::End, ConnectorId::intern("mv_dst_left")).unwrap();

        d.take_damage();
        assert!(d.move_figure(FigureId::intern("mv_dst"), Vec2::new(0.0, 50.0)));
        let c = d.connection(id).unwrap();
        assert_eq!(c.point_at(1), Point::new(100.0, 60.0));
        assert!(!d.take_damage().is_empty());
    }

    #[test]
    fn self_links_are_refused() {
        let mut d = Diagram::default();
        d.add_figure(None, boxed("self_box", 0.0, 0.0)).unwrap();
        let id = d.create_connection(ConnectionKind::Flow);
        d.with_connection(id, |c, _, _| {
            c.push_point(Point::new(40.0, 10.0));
            c.push_point(Point::new(60.0, 10.0));
        });
        d.connect(id, End::Start, ConnectorId::intern("self_box_right")).unwrap();
        assert!(d.connect(id, End::End, ConnectorId::intern("self_box_left")).is_err());
    }

    #[test]
    fn view_transform_roundtrip() {
        let mut d = Diagram::default();
        d.set_view(Affine::translate((10.0, 20.0)) * Affine::scale(2.0));
        let doc = Point::new(5.0, 5.0);
        let view = d.doc_to_view(doc);
        assert_eq!(view, Point::new(20.0, 30.0));
        assert_eq!(d.view_to_doc(view), doc);
    }
}
