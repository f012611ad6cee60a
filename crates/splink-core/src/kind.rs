//! Connection kinds and their policies.
//!
//! The set of kinds is closed. Each kind answers the same four questions:
//! may these figures be linked, should the link be reversed once both ends
//! are known, and what to do when an end is attached or detached.

use crate::connection::Connection;
use crate::model::{DataType, End, FigureInfo, FigureKind, LinkCheck, SocketRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Sequence flow between process nodes.
    #[default]
    Flow,
    /// Typed data flow from an output socket to an input socket.
    Data,
}

impl ConnectionKind {
    /// Whether a link may join `start` and `end`.
    ///
    /// A missing side means that end is still free; only the known side is
    /// checked then.
    pub fn can_link_figures(
        self,
        start: Option<&FigureInfo>,
        end: Option<&FigureInfo>,
        check: LinkCheck,
    ) -> bool {
        if let (Some(s), Some(e)) = (start, end)
            && s.id == e.id
        {
            return false;
        }
        match self {
            ConnectionKind::Flow => [start, end]
                .into_iter()
                .flatten()
                .all(|f| matches!(f.kind, FigureKind::Node)),
            ConnectionKind::Data => {
                let sockets: Option<Vec<(SocketRole, DataType)>> = [start, end]
                    .into_iter()
                    .flatten()
                    .map(|f| match f.kind {
                        FigureKind::Socket { role, data_type } => Some((role, data_type)),
                        _ => None,
                    })
                    .collect();
                match sockets.as_deref() {
                    None => false,
                    Some([(role_a, type_a), (role_b, type_b)]) => {
                        if role_a == role_b {
                            return false;
                        }
                        if check.omit_type_check {
                            return true;
                        }
                        let (from, to) = if *role_a == SocketRole::Output {
                            (type_a, type_b)
                        } else {
                            (type_b, type_a)
                        };
                        from.feeds(*to, check.allow_auto_conversion)
                    }
                    Some(_) => true,
                }
            }
        }
    }

    /// Whether the ends must swap roles once both figures are known.
    pub fn should_reverse(self, start: Option<&FigureInfo>, end: Option<&FigureInfo>) -> bool {
        match self {
            ConnectionKind::Flow => false,
            ConnectionKind::Data => matches!(
                (start.map(|f| f.kind), end.map(|f| f.kind)),
                (
                    Some(FigureKind::Socket {
                        role: SocketRole::Input,
                        ..
                    }),
                    Some(FigureKind::Socket {
                        role: SocketRole::Output,
                        ..
                    })
                )
            ),
        }
    }

    /// React to `end` having been attached to `figure`.
    pub fn handle_connect(self, connection: &mut Connection, end: End, figure: Option<&FigureInfo>) {
        match self {
            ConnectionKind::Flow => {}
            ConnectionKind::Data => {
                if let Some(FigureKind::Socket { role, data_type }) = figure.map(|f| f.kind)
                    && (role == SocketRole::Output || connection.carried_type().is_none())
                {
                    log::debug!("{} carries {:?} ({:?} end)", connection.id, data_type, end);
                    connection.set_carried_type(Some(data_type));
                }
            }
        }
    }

    /// React to `end` being detached. Runs before the reference is cleared.
    pub fn handle_disconnect(self, connection: &mut Connection, end: End) {
        match self {
            ConnectionKind::Flow => {}
            ConnectionKind::Data => {
                if connection.connector(end.opposite()).is_none() {
                    connection.set_carried_type(None);
                }
            }
        }
    }
}
