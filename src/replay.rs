use crate::error::{Result, read_to_string};
use crate::gesture::InputEvent;
use crate::graph_view::GraphView;
use crate::model::PositionSink;
use crate::store::parse_document;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialView {
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

/// Recorded input: a bare event array, or `{ "view": {..}, "events": [..] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<InitialView>,
    pub events: Vec<InputEvent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Bare(Vec<InputEvent>),
    Full(GestureScript),
}

impl GestureScript {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { view: None, events }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let script = match parse_document::<ScriptFile>(contents, origin)? {
            ScriptFile::Bare(events) => Self::new(events),
            ScriptFile::Full(script) => script,
        };
        Ok(script)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    /// Events that changed the picture.
    pub redraws: usize,
}

/// Plays `script` against `view`, sending finished drags to `sink`.
pub fn replay(view: &mut GraphView, script: &GestureScript, sink: &mut dyn PositionSink) -> ReplaySummary {
    if let Some(initial) = script.view {
        view.set_view(initial.offset_x, initial.offset_y, initial.scale);
    }
    let mut summary = ReplaySummary::default();
    for event in &script.events {
        summary.events += 1;
        if view.handle_event(event, sink) {
            summary.redraws += 1;
        }
    }
    tracing::debug!(events = summary.events, redraws = summary.redraws, "gesture script replayed");
    summary
}

/// Collects events as they are handled so a session can be saved as a script.
#[derive(Debug, Clone, Default)]
pub struct GestureRecorder {
    script: GestureScript,
}

impl GestureRecorder {
    /// Starts recording from the current view state.
    pub fn start(view: &GraphView) -> Self {
        let transform = view.view();
        Self {
            script: GestureScript {
                view: Some(InitialView {
                    offset_x: transform.offset_x,
                    offset_y: transform.offset_y,
                    scale: transform.scale,
                }),
                events: Vec::new(),
            },
        }
    }

    /// Handles `event` on `view` and records it.
    pub fn handle(&mut self, view: &mut GraphView, event: InputEvent, sink: &mut dyn PositionSink) -> bool {
        let changed = view.handle_event(&event, sink);
        self.script.events.push(event);
        changed
    }

    pub fn finish(self) -> GestureScript {
        self.script
    }
}
