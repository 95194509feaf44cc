//! Inkslate Core Library
//!
//! The whiteboard drawing engine: shapes, hit-testing, gestures, undo history,
//! persistence and live sync. Rendering backends plug in through [`Surface`].

pub mod camera;
pub mod canvas;
pub mod collaboration;
pub mod config;
mod gestures;
pub mod history;
pub mod input;
pub mod interaction;
pub mod render_loop;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod spatial;
pub mod storage;
pub mod surface;
pub mod sync;
pub mod tools;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasDocument};
pub use collaboration::LiveSync;
pub use config::{ConfigError, EditorConfig};
pub use history::{History, Snapshot, UndoHistory};
pub use input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::InteractionState;
pub use render_loop::{RepaintScheduler, paint_canvas};
pub use selection::{Handle, HandleKind};
pub use session::BoardSession;
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use spatial::SpatialIndex;
pub use surface::{RecordingSurface, Surface};
pub use sync::{ConnectionState, NativeWebSocket, SyncEvent, SyncTransport};
pub use tools::{ToolMode, ToolSettings};
