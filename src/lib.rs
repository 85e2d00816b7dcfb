#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod graph_view;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod replay;
pub mod store;
pub mod tag_color;
pub mod text_metrics;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{Error, Result};
pub use gesture::{InputEvent, TouchPoint};
pub use graph_view::GraphView;
pub use model::{NodePosition, NodeSource, PositionSink, Project, StoryNode};
pub use render::{Canvas, SvgCanvas, render_scene};
pub use store::ProjectStore;
