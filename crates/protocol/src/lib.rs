pub mod commands;
pub mod shared_str;
pub mod theme;
pub mod types;

pub use commands::{CursorIcon, Icon, RenderCommand, TextAlign};
pub use shared_str::SharedStr;
pub use theme::ThemeToken;
pub use types::{Color, ColorParseError, Point, Rect, Viewport};
