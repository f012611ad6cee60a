pub mod commands;
pub mod diagram;
pub mod handles;
pub mod input;

pub use commands::{Command, CommandStack, ConnectionSnapshot};
pub use diagram::{ConnectionMutation, ConnectorSpec, Diagram, Figure};
pub use handles::{
    ChangeConnectionHandle, ConstrainedControlPointHandle, ControlPointHandle, Handle, HandleKind,
    MoveLabelHandle, WaypointHandle, drive, handle_at, handles_for,
};
pub use input::{InputEvent, Modifiers};
