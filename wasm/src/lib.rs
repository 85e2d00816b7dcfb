mod canvas2d;

use canvas2d::{Context2d, ContextMetrics};
use serde::Deserialize;
use storygraph::config::{Config, parse_config};
use storygraph::model::{CommitLog, PositionCommit};
use storygraph::{GraphView, InputEvent, StoryNode};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Node list as handed over by the host page: either a bare array or a whole
/// project object.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodesPayload {
    Nodes(Vec<StoryNode>),
    Project { nodes: Vec<StoryNode> },
}

fn js_error(error: impl ToString) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_options(options_json: Option<&str>) -> Result<Config, String> {
    match options_json {
        Some(raw) if !raw.trim().is_empty() => parse_config(raw).map_err(|err| err.to_string()),
        _ => Ok(Config::default()),
    }
}

/// Backing-store size that fills a parent of `parent` CSS pixels, or `None`
/// when the parent has no layout yet or the canvas already matches.
fn fit_to_parent(parent: (i32, i32), current: (u32, u32)) -> Option<(u32, u32)> {
    let (width, height) = parent;
    if width <= 0 || height <= 0 {
        return None;
    }
    let target = (width as u32, height as u32);
    (target != current).then_some(target)
}

fn parse_nodes(json: &str) -> Result<Vec<StoryNode>, String> {
    match serde_json::from_str::<NodesPayload>(json).map_err(|err| err.to_string())? {
        NodesPayload::Nodes(nodes) | NodesPayload::Project { nodes } => Ok(nodes),
    }
}

/// Interactive story graph bound to an HTML canvas.
///
/// The host forwards pointer, touch and wheel input, calls `redraw` once per
/// animation frame and drains `takeCommits` to persist dragged positions.
#[wasm_bindgen]
pub struct StoryGraphCanvas {
    view: GraphView,
    canvas: HtmlCanvasElement,
    surface: Context2d,
    commits: CommitLog,
}

#[wasm_bindgen]
impl StoryGraphCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        project_id: &str,
        options_json: Option<String>,
    ) -> Result<StoryGraphCanvas, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        let mut config = parse_options(options_json.as_deref()).map_err(js_error)?;
        config.render.width = canvas.width() as f32;
        config.render.height = canvas.height() as f32;

        let view = GraphView::with_measure(project_id, config, Box::new(ContextMetrics::new(ctx.clone())));
        let mut graph = Self {
            view,
            canvas,
            surface: Context2d::new(ctx),
            commits: CommitLog::default(),
        };
        graph.poll_size();
        Ok(graph)
    }

    /// Sets the canvas backing store to `width` x `height` pixels.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
        self.view.resize(width, height)
    }

    #[wasm_bindgen(js_name = setProject)]
    pub fn set_project(&mut self, project_id: &str) {
        self.view.set_project(project_id);
    }

    /// Accepts a JSON array of nodes or a project object with `nodes`.
    #[wasm_bindgen(js_name = setNodes)]
    pub fn set_nodes(&mut self, json: &str) -> Result<(), JsValue> {
        let nodes = parse_nodes(json).map_err(js_error)?;
        self.view.set_nodes(nodes);
        Ok(())
    }

    /// Handles one JSON-encoded input event. Returns whether a redraw is due.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, json: &str) -> Result<bool, JsValue> {
        let event: InputEvent = serde_json::from_str(json).map_err(js_error)?;
        Ok(self.view.handle_event(&event, &mut self.commits))
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.view.handle_event(&InputEvent::Press { x, y }, &mut self.commits)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.view.handle_event(&InputEvent::Move { x, y }, &mut self.commits)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> bool {
        self.view.handle_event(&InputEvent::Release, &mut self.commits)
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) -> bool {
        self.view.handle_event(&InputEvent::Leave, &mut self.commits)
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.view
            .handle_event(&InputEvent::Wheel { x, y, delta_y }, &mut self.commits)
    }

    /// Grows or shrinks the canvas to fill its parent element, then picks up
    /// the resulting size.
    #[wasm_bindgen(js_name = pollSize)]
    pub fn poll_size(&mut self) -> bool {
        let canvas = &self.canvas;
        if let Some(parent) = canvas.parent_element() {
            let current = (canvas.width(), canvas.height());
            if let Some((width, height)) =
                fit_to_parent((parent.client_width(), parent.client_height()), current)
            {
                canvas.set_width(width);
                canvas.set_height(height);
            }
        }
        self.view
            .poll_size(|| Some((canvas.width() as f32, canvas.height() as f32)))
    }

    /// Paints if anything changed since the last frame.
    pub fn redraw(&mut self) -> bool {
        self.poll_size();
        self.view.redraw(Some(&mut self.surface))
    }

    /// Finished drags since the last call, as a JSON array of
    /// `{ projectId, nodeId, position: { x, y } }`.
    #[wasm_bindgen(js_name = takeCommits)]
    pub fn take_commits(&mut self) -> Result<String, JsValue> {
        let commits: Vec<PositionCommit> = std::mem::take(&mut self.commits.commits);
        serde_json::to_string(&commits).map_err(js_error)
    }
}
