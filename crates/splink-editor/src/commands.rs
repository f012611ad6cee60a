//! Undo/Redo command stack.
//!
//! Every edit to a connection is recorded as a pair of snapshots: the
//! encoded geometry plus the attached connector ids, captured before and
//! after. Drag gestures open a session on pointer down and close it on
//! pointer up, so a whole drag (or a split, join, reconnect) undoes in a
//! single step.

use crate::diagram::{ConnectionMutation, Diagram};
use splink_core::{ConnectionId, ConnectorId, End, decode_geometry, encode_geometry};

/// Restorable state of one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub geometry: String,
    pub start: Option<ConnectorId>,
    pub end: Option<ConnectorId>,
}

impl ConnectionSnapshot {
    pub fn capture(diagram: &Diagram, id: ConnectionId) -> Option<Self> {
        let c = diagram.connection(id)?;
        Some(Self {
            id,
            geometry: encode_geometry(c),
            start: c.connector(End::Start),
            end: c.connector(End::End),
        })
    }

    /// Put the connection back into this state: geometry first, then the
    /// ends, then a layout pass against the current connector positions.
    pub fn restore(&self, diagram: &mut Diagram) -> Result<(), String> {
        let mode = diagram.config.decode_mode;
        diagram
            .with_connection(self.id, |c, lookup, subs| {
                decode_geometry(&self.geometry, c, mode)?;
                for (end, wanted) in [(End::Start, self.start), (End::End, self.end)] {
                    if c.connector(end) == wanted {
                        continue;
                    }
                    match wanted {
                        Some(connector) => c.connect(end, connector, lookup, subs),
                        None => c.disconnect(end, subs),
                    }
                }
                c.layout_connection(lookup);
                Ok(())
            })
            .unwrap_or_else(|| Err(format!("Unknown connection {}", self.id)))
    }
}

/// One undoable step.
#[derive(Debug, Clone)]
pub struct Command {
    pub before: ConnectionSnapshot,
    pub after: ConnectionSnapshot,
    pub description: String,
}

/// Manages undo/redo stacks with session grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Session nesting depth (0 = no session open).
    session_depth: usize,
    /// Snapshot captured when the outermost session opened.
    session_snapshot: Option<ConnectionSnapshot>,
    /// Whether any mutation was applied during the current session.
    session_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            session_depth: 0,
            session_snapshot: None,
            session_dirty: false,
        }
    }

    /// Open an undo session for `id`. Sessions nest; only the outermost
    /// one captures a snapshot.
    pub fn begin_session(&mut self, diagram: &Diagram, id: ConnectionId) {
        if self.session_depth == 0 {
            self.session_snapshot = ConnectionSnapshot::capture(diagram, id);
            self.session_dirty = false;
        }
        self.session_depth += 1;
    }

    /// Close a session. When the outermost session closes and the
    /// connection actually changed, one command is pushed.
    pub fn end_session(&mut self, diagram: &Diagram, description: &str) {
        if self.session_depth == 0 {
            return;
        }
        self.session_depth -= 1;
        if self.session_depth > 0 {
            return;
        }
        let before = self.session_snapshot.take();
        if self.session_dirty
            && let Some(before) = before
            && let Some(after) = ConnectionSnapshot::capture(diagram, before.id)
            && after != before
        {
            log::debug!("undo step: {description}");
            self.push(Command {
                before,
                after,
                description: description.to_string(),
            });
        }
        self.session_dirty = false;
    }

    pub fn in_session(&self) -> bool {
        self.session_depth > 0
    }

    /// Apply a mutation. Outside a session it becomes its own undo step.
    pub fn execute(&mut self, diagram: &mut Diagram, mutation: ConnectionMutation, description: &str) -> bool {
        if self.session_depth > 0 {
            let applied = diagram.apply_mutation(mutation);
            self.session_dirty |= applied;
            return applied;
        }
        let Some(id) = mutation.target() else {
            return diagram.apply_mutation(mutation);
        };
        self.begin_session(diagram, id);
        let applied = diagram.apply_mutation(mutation);
        self.session_dirty |= applied;
        self.end_session(diagram, description);
        applied
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the last command, returning its description.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        if let Err(e) = cmd.before.restore(diagram) {
            log::warn!("undo {}: {e}", cmd.description);
        }
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command, returning its description.
    pub fn redo(&mut self, diagram: &mut Diagram) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        if let Err(e) = cmd.after.restore(diagram) {
            log::warn!("redo {}: {e}", cmd.description);
        }
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::Figure;
    use kurbo::{Point, Rect};
    use pretty_assertions::assert_eq;
    use splink_core::{ConnectionKind, FigureKind};

    fn diagram_with_link() -> (Diagram, ConnectionId) {
        let mut d = Diagram::default();
        d.add_figure(
            None,
            Figure::new("cmd_a", FigureKind::Node, Rect::new(-40.0, -10.0, 0.0, 10.0)).with_side_connectors(),
        )
        .unwrap();
        d.add_figure(
            None,
            Figure::new("cmd_b", FigureKind::Node, Rect::new(100.0, -10.0, 140.0, 10.0)).with_side_connectors(),
        )
        .unwrap();
        let id = d.create_connection(ConnectionKind::Flow);
        d.with_connection(id, |c, _, _| {
            c.push_point(Point::new(0.0, 0.0));
            c.push_point(Point::new(50.0, 0.0));
            c.push_point(Point::new(100.0, 0.0));
        });
        d.connect(id, End::Start, ConnectorId::intern("cmd_a_right")).unwrap();
        d.connect(id, End::End, ConnectorId::intern("cmd_b_left")).unwrap();
        (d, id)
    }

    #[test]
    fn execute_records_single_step() {
        let (mut d, id) = diagram_with_link();
        let mut stack = CommandStack::new(10);
        let moved = ConnectionMutation::SetPoint {
            id,
            index: 1,
            to: Point::new(50.0, 40.0),
        };
        assert!(stack.execute(&mut d, moved, "move waypoint"));
        assert_eq!(d.connection(id).unwrap().point_at(1), Point::new(50.0, 40.0));

        assert_eq!(stack.undo(&mut d).as_deref(), Some("move waypoint"));
        assert_eq!(d.connection(id).unwrap().point_at(1), Point::new(50.0, 0.0));
        assert_eq!(stack.redo(&mut d).as_deref(), Some("move waypoint"));
        assert_eq!(d.connection(id).unwrap().point_at(1), Point::new(50.0, 40.0));
    }

    #[test]
    fn session_groups_many_mutations() {
        let (mut d, id) = diagram_with_link();
        let mut stack = CommandStack::new(10);
        stack.begin_session(&d, id);
        for y in [10.0, 20.0, 30.0] {
            stack.execute(
                &mut d,
                ConnectionMutation::SetPoint {
                    id,
                    index: 1,
                    to: Point::new(50.0, y),
                },
                "drag",
            );
        }
        stack.end_session(&d, "move waypoint");
        assert!(stack.can_undo());
        stack.undo(&mut d);
        assert!(!stack.can_undo());
        assert_eq!(d.connection(id).unwrap().point_at(1), Point::new(50.0, 0.0));
    }

    #[test]
    fn no_op_session_pushes_nothing() {
        let (mut d, id) = diagram_with_link();
        let mut stack = CommandStack::new(10);
        stack.begin_session(&d, id);
        stack.execute(&mut d, ConnectionMutation::JoinSegments { id, at: Point::new(500.0, 500.0) }, "join");
        stack.end_session(&d, "join");
        assert!(!stack.can_undo());
    }

    #[test]
    fn depth_is_bounded() {
        let (mut d, id) = diagram_with_link();
        let mut stack = CommandStack::new(2);
        for y in [10.0, 20.0, 30.0] {
            let m = ConnectionMutation::SetPoint {
                id,
                index: 1,
                to: Point::new(50.0, y),
            };
            stack.execute(&mut d, m, "move");
        }
        assert!(stack.undo(&mut d).is_some());
        assert!(stack.undo(&mut d).is_some());
        assert!(stack.undo(&mut d).is_none());
        assert_eq!(d.connection(id).unwrap().point_at(1), Point::new(50.0, 10.0));
    }

    #[test]
    fn split_then_undo_restores_topology() {
        let (mut d, id) = diagram_with_link();
        let mut stack = CommandStack::new(10);
        let split = ConnectionMutation::SplitSegment {
            id,
            at: Point::new(25.0, 0.0),
        };
        assert!(stack.execute(&mut d, split, "split segment"));
        assert_eq!(d.connection(id).unwrap().segment_count(), 3);
        stack.undo(&mut d);
        assert_eq!(d.connection(id).unwrap().segment_count(), 2);
    }
}
