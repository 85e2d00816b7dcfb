use crate::config::Config;
use crate::gesture::{GestureController, GestureState, GestureTargets, InputEvent};
use crate::layout::{LayoutSet, SyncOutcome};
use crate::model::{NodePosition, NodeSource, PositionSink, StoryNode};
use crate::render::{Canvas, render_scene};
use crate::text_metrics::{ApproxMetrics, FontMetrics, TextMeasure};
use crate::view::ViewTransform;

/// One interactive graph surface.
///
/// Owns the node list of a single project together with its layouts, the
/// pan/zoom transform and the gesture in progress. Every change that affects
/// the picture sets a dirty flag; [`GraphView::redraw`] paints only when the
/// flag is set.
pub struct GraphView {
    project_id: String,
    nodes: Vec<StoryNode>,
    layouts: LayoutSet,
    view: ViewTransform,
    gestures: GestureController,
    config: Config,
    measure: Box<dyn TextMeasure>,
    surface: (f32, f32),
    dirty: bool,
}

impl GraphView {
    /// Creates an empty view. Text is measured with real font metrics unless
    /// `render.fastText` is set in the config.
    pub fn new(project_id: impl Into<String>, config: Config) -> Self {
        let measure: Box<dyn TextMeasure> = if config.render.fast_text_metrics {
            Box::new(ApproxMetrics)
        } else {
            Box::new(FontMetrics::shared())
        };
        Self::with_measure(project_id, config, measure)
    }

    pub fn with_measure(
        project_id: impl Into<String>,
        config: Config,
        measure: Box<dyn TextMeasure>,
    ) -> Self {
        let surface = (config.render.width, config.render.height);
        Self {
            project_id: project_id.into(),
            nodes: Vec::new(),
            layouts: LayoutSet::default(),
            view: ViewTransform::new(&config.view),
            gestures: GestureController::new(),
            config,
            measure,
            surface,
            dirty: true,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn nodes(&self) -> &[StoryNode] {
        &self.nodes
    }

    pub fn layouts(&self) -> &LayoutSet {
        &self.layouts
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gesture_state(&self) -> &GestureState {
        self.gestures.state()
    }

    pub fn surface_size(&self) -> (f32, f32) {
        self.surface
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the pan/zoom state, clamping the scale to the configured range.
    pub fn set_view(&mut self, offset_x: f32, offset_y: f32, scale: f32) {
        self.view = ViewTransform::with_state(&self.config.view, offset_x, offset_y, scale);
        self.dirty = true;
    }

    /// Switches to another project. Layouts and any gesture in progress are
    /// dropped; the caller supplies the new node list.
    pub fn set_project(&mut self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        if project_id == self.project_id {
            return;
        }
        tracing::debug!(project_id = %project_id, "switching project");
        self.project_id = project_id;
        self.nodes.clear();
        self.layouts.clear();
        self.gestures.reset();
        self.dirty = true;
    }

    /// Takes a fresh node list for the current project.
    pub fn set_nodes(&mut self, nodes: Vec<StoryNode>) -> SyncOutcome {
        let outcome = if nodes.is_empty() {
            self.layouts.clear();
            SyncOutcome::Rebuilt
        } else {
            self.layouts.sync(
                &nodes,
                &self.config.layout,
                &self.config.theme,
                self.measure.as_ref(),
            )
        };
        self.nodes = nodes;
        self.dirty = true;
        outcome
    }

    /// Pulls the current project's nodes from `source`.
    pub fn load_from(&mut self, source: &dyn NodeSource) -> SyncOutcome {
        let nodes = source.nodes(&self.project_id);
        tracing::debug!(project_id = %self.project_id, nodes = nodes.len(), "loaded nodes");
        self.set_nodes(nodes)
    }

    /// Feeds one input event through the gesture controller. A finished node
    /// drag is reported to `sink`. Returns whether the picture changed.
    pub fn handle_event(&mut self, event: &InputEvent, sink: &mut dyn PositionSink) -> bool {
        let mut targets = GestureTargets {
            view: &mut self.view,
            layouts: &mut self.layouts,
            view_config: &self.config.view,
        };
        let effect = self.gestures.handle(event, &mut targets);

        if let Some(commit) = effect.commit {
            tracing::info!(
                project_id = %self.project_id,
                node_id = %commit.node_id,
                x = commit.position.x,
                y = commit.position.y,
                "node position committed"
            );
            self.remember_position(&commit.node_id, commit.position);
            sink.node_position_committed(&self.project_id, &commit.node_id, commit.position);
        }

        if effect.redraw {
            self.dirty = true;
        }
        effect.redraw
    }

    fn remember_position(&mut self, node_id: &str, position: NodePosition) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == node_id) {
            node.position = Some(position);
        }
    }

    /// Surface resized by the host.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if (width, height) == self.surface {
            return false;
        }
        tracing::trace!(width, height, "surface resized");
        self.surface = (width, height);
        self.dirty = true;
        true
    }

    /// For hosts without resize notifications: asks `probe` for the current
    /// surface size and applies it if it changed.
    pub fn poll_size<F>(&mut self, probe: F) -> bool
    where
        F: FnOnce() -> Option<(f32, f32)>,
    {
        match probe() {
            Some((width, height)) => self.resize(width, height),
            None => false,
        }
    }

    /// Paints a frame if anything changed since the last one.
    ///
    /// Without a canvas the frame is skipped and the view stays dirty.
    pub fn redraw(&mut self, canvas: Option<&mut dyn Canvas>) -> bool {
        if !self.dirty {
            return false;
        }
        let Some(canvas) = canvas else {
            return false;
        };
        render_scene(
            canvas,
            &self.nodes,
            &self.layouts,
            &self.view,
            &self.config.theme,
            &self.config.layout,
        );
        self.dirty = false;
        true
    }

    /// Paints unconditionally, leaving the dirty flag alone.
    pub fn paint(&self, canvas: &mut dyn Canvas) {
        render_scene(
            canvas,
            &self.nodes,
            &self.layouts,
            &self.view,
            &self.config.theme,
            &self.config.layout,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitLog;
    use crate::render::SvgCanvas;

    fn view_with(nodes: Vec<StoryNode>) -> GraphView {
        let mut view = GraphView::with_measure("p1", Config::default(), Box::new(ApproxMetrics));
        view.set_nodes(nodes);
        view
    }

    fn sample() -> Vec<StoryNode> {
        vec![
            StoryNode::new("a", "Wolf meets girl").with_position(100.0, 100.0),
            StoryNode::new("b", "Wolf eats grandmother")
                .with_causes(["a"])
                .with_position(100.0, 300.0),
        ]
    }

    #[test]
    fn drag_commits_with_project_id() {
        let mut view = view_with(sample());
        let mut sink = CommitLog::default();
        view.handle_event(&InputEvent::Press { x: 110.0, y: 110.0 }, &mut sink);
        view.handle_event(&InputEvent::Move { x: 140.0, y: 170.0 }, &mut sink);
        view.handle_event(&InputEvent::Release, &mut sink);

        assert_eq!(sink.commits.len(), 1);
        let commit = &sink.commits[0];
        assert_eq!(commit.project_id, "p1");
        assert_eq!(commit.node_id, "a");
        assert_eq!(commit.position, NodePosition { x: 130.0, y: 160.0 });
        assert_eq!(view.nodes()[0].position, Some(NodePosition { x: 130.0, y: 160.0 }));
    }

    #[test]
    fn redraw_only_when_dirty() {
        let mut view = view_with(sample());
        let mut canvas = SvgCanvas::new(800.0, 600.0);
        assert!(view.redraw(Some(&mut canvas)));
        assert!(!view.redraw(Some(&mut canvas)));

        let mut sink = CommitLog::default();
        view.handle_event(&InputEvent::Wheel { x: 0.0, y: 0.0, delta_y: 1.0 }, &mut sink);
        assert!(view.is_dirty());
        assert!(view.redraw(Some(&mut canvas)));
    }

    #[test]
    fn missing_canvas_skips_frame() {
        let mut view = view_with(sample());
        assert!(!view.redraw(None));
        assert!(view.is_dirty());
    }

    #[test]
    fn resize_marks_dirty_only_on_change() {
        let mut view = view_with(sample());
        let mut canvas = SvgCanvas::new(800.0, 600.0);
        view.redraw(Some(&mut canvas));
        let (w, h) = view.surface_size();
        assert!(!view.resize(w, h));
        assert!(!view.is_dirty());
        assert!(view.poll_size(|| Some((640.0, 480.0))));
        assert!(view.is_dirty());
        assert!(!view.poll_size(|| None));
    }

    #[test]
    fn content_change_keeps_dragged_positions() {
        let mut view = view_with(sample());
        let mut sink = CommitLog::default();
        view.handle_event(&InputEvent::Press { x: 110.0, y: 110.0 }, &mut sink);
        view.handle_event(&InputEvent::Move { x: 160.0, y: 110.0 }, &mut sink);

        let mut edited = sample();
        edited[0].tags = vec!["urgent".to_string()];
        let outcome = view.set_nodes(edited);
        assert_eq!(outcome, SyncOutcome::Remeasured(1));
        let layout = view.layouts().get("a").unwrap();
        assert_eq!((layout.x, layout.y), (150.0, 100.0));
        assert_eq!(layout.tag_rows.len(), 1);
    }

    #[test]
    fn empty_node_list_clears_layouts() {
        let mut view = view_with(sample());
        view.set_nodes(Vec::new());
        assert!(view.layouts().is_empty());
    }

    #[test]
    fn switching_project_drops_state() {
        let mut view = view_with(sample());
        let mut sink = CommitLog::default();
        view.handle_event(&InputEvent::Press { x: 110.0, y: 110.0 }, &mut sink);
        view.set_project("p2");
        assert_eq!(view.project_id(), "p2");
        assert!(view.layouts().is_empty());
        assert_eq!(view.gesture_state(), &GestureState::Idle);
        view.handle_event(&InputEvent::Release, &mut sink);
        assert!(sink.commits.is_empty());
    }

    #[test]
    fn set_view_clamps_scale() {
        let mut view = view_with(sample());
        view.set_view(10.0, 20.0, 9.0);
        assert_eq!(view.view().scale, 3.0);
        assert_eq!(view.view().offset_x, 10.0);
    }
}
