//! Interaction handles for reshaping and reconnecting a connection.
//!
//! Each handle turns a pointer drag into [`ConnectionMutation`]s. Handles
//! only read the diagram; [`drive`] applies what they return through the
//! command stack so every drag lands as one undo step.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Waypoint | Control point |
//! |----------|----------|---------------|
//! | **Shift** | Axis-constrain drag | Axis-constrain drag |

use crate::commands::CommandStack;
use crate::diagram::{ConnectionMutation, Diagram};
use crate::input::InputEvent;
use kurbo::{Point, Vec2};
use splink_core::constraint::project_factor;
use splink_core::{ConnectionId, ConnectorId, End, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Waypoint,
    ControlPoint,
    ConstrainedControlPoint,
    ChangeStart,
    ChangeEnd,
    MoveLabel,
}

impl HandleKind {
    /// Undo description for a drag of this handle.
    pub fn description(self) -> &'static str {
        match self {
            HandleKind::Waypoint => "move waypoint",
            HandleKind::ControlPoint => "move control point",
            HandleKind::ConstrainedControlPoint => "change tangent factor",
            HandleKind::ChangeStart => "reconnect start",
            HandleKind::ChangeEnd => "reconnect end",
            HandleKind::MoveLabel => "move label",
        }
    }
}

/// Trait for handles that turn pointer events into mutations.
pub trait Handle {
    fn kind(&self) -> HandleKind;

    fn connection(&self) -> ConnectionId;

    /// Where the handle is drawn, in document space.
    fn locate(&self, diagram: &Diagram) -> Option<Point>;

    /// Handle a document-space event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation>;
}

// ─── Drag tracking ───────────────────────────────────────────────────────

/// Pointer-down origin plus the deadzone latch.
#[derive(Debug, Clone, Copy, Default)]
struct Drag {
    origin: Option<Point>,
    active: bool,
}

impl Drag {
    fn down(&mut self, p: Point) {
        self.origin = Some(p);
        self.active = false;
    }

    /// Offset from the origin once the pointer has left the deadzone.
    fn step(&mut self, p: Point, deadzone: f64) -> Option<Vec2> {
        let origin = self.origin?;
        let delta = p - origin;
        if !self.active && delta.hypot() < deadzone {
            return None;
        }
        self.active = true;
        Some(delta)
    }

    fn up(&mut self) {
        *self = Self::default();
    }
}

/// Zero the smaller component so the drag follows one axis.
fn axis_constrain(delta: Vec2) -> Vec2 {
    if delta.x.abs() >= delta.y.abs() {
        Vec2::new(delta.x, 0.0)
    } else {
        Vec2::new(0.0, delta.y)
    }
}

fn end_index(diagram: &Diagram, id: ConnectionId, end: End) -> Option<usize> {
    let c = diagram.connection(id)?;
    Some(match end {
        End::Start => 0,
        End::End => c.spline().last_index(),
    })
}

// ─── Waypoint ────────────────────────────────────────────────────────────

/// Moves one waypoint.
pub struct WaypointHandle {
    pub id: ConnectionId,
    pub index: usize,
    drag: Drag,
    grabbed: Point,
}

impl WaypointHandle {
    pub fn new(id: ConnectionId, index: usize) -> Self {
        Self {
            id,
            index,
            drag: Drag::default(),
            grabbed: Point::ZERO,
        }
    }
}

impl Handle for WaypointHandle {
    fn kind(&self) -> HandleKind {
        HandleKind::Waypoint
    }

    fn connection(&self) -> ConnectionId {
        self.id
    }

    fn locate(&self, diagram: &Diagram) -> Option<Point> {
        diagram.connection(self.id).map(|c| c.point_at(self.index))
    }

    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag.down(event.position());
                self.grabbed = self.locate(diagram).unwrap_or(Point::ZERO);
                vec![]
            }
            InputEvent::PointerMove { modifiers, .. } => {
                let Some(mut delta) = self.drag.step(event.position(), diagram.config.drag_deadzone) else {
                    return vec![];
                };
                if modifiers.shift {
                    delta = axis_constrain(delta);
                }
                vec![ConnectionMutation::SetPoint {
                    id: self.id,
                    index: self.index,
                    to: self.grabbed + delta,
                }]
            }
            InputEvent::PointerUp { .. } => {
                self.drag.up();
                vec![]
            }
        }
    }
}

// ─── Control point ───────────────────────────────────────────────────────

/// Moves an interior control point; its twin is mirrored by the spline.
pub struct ControlPointHandle {
    pub id: ConnectionId,
    pub index: usize,
    pub side: Side,
    drag: Drag,
    grabbed: Point,
}

impl ControlPointHandle {
    pub fn new(id: ConnectionId, index: usize, side: Side) -> Self {
        Self {
            id,
            index,
            side,
            drag: Drag::default(),
            grabbed: Point::ZERO,
        }
    }
}

impl Handle for ControlPointHandle {
    fn kind(&self) -> HandleKind {
        HandleKind::ControlPoint
    }

    fn connection(&self) -> ConnectionId {
        self.id
    }

    fn locate(&self, diagram: &Diagram) -> Option<Point> {
        diagram
            .connection(self.id)
            .map(|c| c.ctrl_point_at(self.index, self.side))
    }

    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag.down(event.position());
                self.grabbed = self.locate(diagram).unwrap_or(Point::ZERO);
                vec![]
            }
            InputEvent::PointerMove { modifiers, .. } => {
                let Some(mut delta) = self.drag.step(event.position(), diagram.config.drag_deadzone) else {
                    return vec![];
                };
                if modifiers.shift {
                    delta = axis_constrain(delta);
                }
                vec![ConnectionMutation::SetCtrlPoint {
                    id: self.id,
                    index: self.index,
                    side: self.side,
                    to: self.grabbed + delta,
                }]
            }
            InputEvent::PointerUp { .. } => {
                self.drag.up();
                vec![]
            }
        }
    }
}

// ─── Constrained control point ───────────────────────────────────────────

/// Drags the tangent length at an oriented end by changing its factor.
///
/// The reference distance (end waypoint to its neighbour) is fixed when
/// the handle is created, so the factor tracks the pointer linearly even
/// though layout keeps moving the control point.
pub struct ConstrainedControlPointHandle {
    pub id: ConnectionId,
    pub end: End,
    reference: f64,
    drag: Drag,
    grabbed: Point,
}

impl ConstrainedControlPointHandle {
    pub fn new(diagram: &Diagram, id: ConnectionId, end: End) -> Self {
        let reference = diagram
            .connection(id)
            .map(|c| {
                let last = c.spline().last_index();
                match end {
                    End::Start => c.point_at(0).distance(c.point_at(1)),
                    End::End => c.point_at(last).distance(c.point_at(last.saturating_sub(1))),
                }
            })
            .unwrap_or(0.0);
        Self {
            id,
            end,
            reference,
            drag: Drag::default(),
            grabbed: Point::ZERO,
        }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    fn side(&self) -> Side {
        match self.end {
            End::Start => Side::Right,
            End::End => Side::Left,
        }
    }
}

impl Handle for ConstrainedControlPointHandle {
    fn kind(&self) -> HandleKind {
        HandleKind::ConstrainedControlPoint
    }

    fn connection(&self) -> ConnectionId {
        self.id
    }

    fn locate(&self, diagram: &Diagram) -> Option<Point> {
        let index = end_index(diagram, self.id, self.end)?;
        diagram
            .connection(self.id)
            .map(|c| c.ctrl_point_at(index, self.side()))
    }

    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag.down(event.position());
                self.grabbed = self.locate(diagram).unwrap_or(Point::ZERO);
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                let Some(delta) = self.drag.step(event.position(), diagram.config.drag_deadzone) else {
                    return vec![];
                };
                let (Some(c), Some(index)) =
                    (diagram.connection(self.id), end_index(diagram, self.id, self.end))
                else {
                    return vec![];
                };
                let target = self.grabbed + delta;
                match c.connection_end(self.end).and_then(|e| e.orientation) {
                    Some(orientation) => {
                        project_factor(c.point_at(index), target, orientation, self.reference)
                            .map(|factor| ConnectionMutation::SetFactor {
                                id: self.id,
                                end: self.end,
                                factor,
                            })
                            .into_iter()
                            .collect()
                    }
                    None => vec![ConnectionMutation::SetCtrlPoint {
                        id: self.id,
                        index,
                        side: self.side(),
                        to: target,
                    }],
                }
            }
            InputEvent::PointerUp { .. } => {
                self.drag.up();
                vec![]
            }
        }
    }
}

// ─── Reconnect ───────────────────────────────────────────────────────────

/// Detaches one end and drops it onto another connector.
///
/// Releasing over nothing compatible restores the original connector.
pub struct ChangeConnectionHandle {
    pub id: ConnectionId,
    pub end: End,
    original: Option<ConnectorId>,
    candidate: Option<ConnectorId>,
    drag: Drag,
    grabbed: Point,
}

impl ChangeConnectionHandle {
    pub fn new(id: ConnectionId, end: End) -> Self {
        Self {
            id,
            end,
            original: None,
            candidate: None,
            drag: Drag::default(),
            grabbed: Point::ZERO,
        }
    }

    pub fn start(id: ConnectionId) -> Self {
        Self::new(id, End::Start)
    }

    pub fn end(id: ConnectionId) -> Self {
        Self::new(id, End::End)
    }

    /// Connector the end would attach to if released now.
    pub fn candidate(&self) -> Option<ConnectorId> {
        self.candidate
    }
}

impl Handle for ChangeConnectionHandle {
    fn kind(&self) -> HandleKind {
        match self.end {
            End::Start => HandleKind::ChangeStart,
            End::End => HandleKind::ChangeEnd,
        }
    }

    fn connection(&self) -> ConnectionId {
        self.id
    }

    fn locate(&self, diagram: &Diagram) -> Option<Point> {
        let index = end_index(diagram, self.id, self.end)?;
        diagram.connection(self.id).map(|c| c.point_at(index))
    }

    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation> {
        let p = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag.down(p);
                self.grabbed = self.locate(diagram).unwrap_or(p);
                self.original = diagram.connection(self.id).and_then(|c| c.connector(self.end));
                self.candidate = None;
                log::debug!("{} {:?} grabbed from {:?}", self.id, self.end, self.original);
                vec![
                    ConnectionMutation::Disconnect {
                        id: self.id,
                        end: self.end,
                    },
                    ConnectionMutation::MarkTargets {
                        id: self.id,
                        end: self.end,
                    },
                ]
            }
            InputEvent::PointerMove { .. } => {
                let Some(delta) = self.drag.step(p, diagram.config.drag_deadzone) else {
                    return vec![];
                };
                self.candidate = diagram.candidate_at(p, self.id, self.end);
                vec![ConnectionMutation::SetEndPoint {
                    id: self.id,
                    end: self.end,
                    to: self.grabbed + delta,
                }]
            }
            InputEvent::PointerUp { .. } => {
                let target = diagram.candidate_at(p, self.id, self.end).or(self.original);
                if target.is_none() {
                    log::debug!("{} {:?} left free", self.id, self.end);
                }
                let mut out: Vec<ConnectionMutation> = target
                    .map(|connector| ConnectionMutation::Connect {
                        id: self.id,
                        end: self.end,
                        connector,
                    })
                    .into_iter()
                    .collect();
                out.push(ConnectionMutation::LayoutAndAdjust { id: self.id });
                out.push(ConnectionMutation::ClearMarks);
                self.drag.up();
                self.candidate = None;
                out
            }
        }
    }
}

// ─── Label ───────────────────────────────────────────────────────────────

/// Drags the label relative to its anchor on the curve.
pub struct MoveLabelHandle {
    pub id: ConnectionId,
    drag: Drag,
    grabbed: Vec2,
}

impl MoveLabelHandle {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            drag: Drag::default(),
            grabbed: Vec2::ZERO,
        }
    }
}

impl Handle for MoveLabelHandle {
    fn kind(&self) -> HandleKind {
        HandleKind::MoveLabel
    }

    fn connection(&self) -> ConnectionId {
        self.id
    }

    fn locate(&self, diagram: &Diagram) -> Option<Point> {
        diagram.connection(self.id).map(|c| c.label_position())
    }

    fn handle(&mut self, event: &InputEvent, diagram: &Diagram) -> Vec<ConnectionMutation> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag.down(event.position());
                self.grabbed = diagram
                    .connection(self.id)
                    .map_or(Vec2::ZERO, |c| c.label.offset);
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                let Some(delta) = self.drag.step(event.position(), diagram.config.drag_deadzone) else {
                    return vec![];
                };
                vec![ConnectionMutation::MoveLabel {
                    id: self.id,
                    offset: self.grabbed + delta,
                }]
            }
            InputEvent::PointerUp { .. } => {
                self.drag.up();
                vec![]
            }
        }
    }
}

// ─── Handle set ──────────────────────────────────────────────────────────

/// Every handle of a connection, in picking order: endpoint tangents,
/// interior control point pairs, reconnect handles, interior waypoints,
/// then the label.
pub fn handles_for(diagram: &Diagram, id: ConnectionId) -> Vec<Box<dyn Handle>> {
    let Some(c) = diagram.connection(id) else {
        return Vec::new();
    };
    let last = c.spline().last_index();
    let mut handles: Vec<Box<dyn Handle>> = Vec::new();
    if last == 0 {
        handles.push(Box::new(MoveLabelHandle::new(id)));
        return handles;
    }

    handles.push(Box::new(ConstrainedControlPointHandle::new(diagram, id, End::Start)));
    handles.push(Box::new(ConstrainedControlPointHandle::new(diagram, id, End::End)));
    for i in 1..last {
        handles.push(Box::new(ControlPointHandle::new(id, i, Side::Left)));
        handles.push(Box::new(ControlPointHandle::new(id, i, Side::Right)));
    }
    handles.push(Box::new(ChangeConnectionHandle::start(id)));
    handles.push(Box::new(ChangeConnectionHandle::end(id)));
    for i in 1..last {
        handles.push(Box::new(WaypointHandle::new(id, i)));
    }
    handles.push(Box::new(MoveLabelHandle::new(id)));
    handles
}

/// Index of the first handle drawn within `radius` of `p` (document space).
pub fn handle_at(handles: &[Box<dyn Handle>], diagram: &Diagram, p: Point, radius: f64) -> Option<usize> {
    handles.iter().position(|h| {
        h.locate(diagram)
            .is_some_and(|at| at.distance(p) <= radius)
    })
}

/// Feed one view-space event to `handle` and apply what it produces.
///
/// Pointer down opens an undo session for the handle's connection and
/// pointer up closes it, so the whole drag is one undo step.
pub fn drive(diagram: &mut Diagram, stack: &mut CommandStack, handle: &mut dyn Handle, event: &InputEvent) {
    let doc_event = event.at(diagram.view_to_doc(event.position()));
    let description = handle.kind().description();

    if matches!(doc_event, InputEvent::PointerDown { .. }) {
        stack.begin_session(diagram, handle.connection());
    }

    for mutation in handle.handle(&doc_event, diagram) {
        stack.execute(diagram, mutation, description);
    }

    if matches!(doc_event, InputEvent::PointerUp { .. }) {
        stack.end_session(diagram, description);
    }
}
