use crate::config::ViewConfig;
use crate::geometry::Point;
use crate::hit_test::hit_test;
use crate::layout::LayoutSet;
use crate::model::NodePosition;
use crate::view::ViewTransform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Input in surface pixel coordinates.
///
/// Touch events carry only the contacts that changed; the controller keeps
/// track of which fingers are still down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release,
    Leave,
    Wheel {
        x: f32,
        y: f32,
        #[serde(rename = "deltaY")]
        delta_y: f32,
    },
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint> },
    TouchEnd { ids: Vec<u32> },
    TouchCancel { ids: Vec<u32> },
}

/// Last known position of every finger currently down, keyed by contact id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchContacts {
    contacts: BTreeMap<u32, Point>,
}

impl TouchContacts {
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn insert(&mut self, touch: &TouchPoint) {
        self.contacts.insert(touch.id, touch.point());
    }

    fn update(&mut self, touch: &TouchPoint) -> bool {
        match self.contacts.get_mut(&touch.id) {
            Some(point) => {
                *point = touch.point();
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: u32) -> bool {
        self.contacts.remove(&id).is_some()
    }

    fn clear(&mut self) {
        self.contacts.clear();
    }

    fn first(&self) -> Option<Point> {
        self.contacts.values().next().copied()
    }

    /// The two lowest contact ids, which drive a pinch.
    fn pair(&self) -> Option<(Point, Point)> {
        let mut points = self.contacts.values().copied();
        Some((points.next()?, points.next()?))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    PanningCanvas {
        last: Point,
    },
    DraggingNode {
        node_id: String,
        last: Point,
    },
    PinchZooming {
        last_distance: f32,
        last_midpoint: Point,
    },
}

/// A node whose drag just finished, with its final world-space position.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCommit {
    pub node_id: String,
    pub position: NodePosition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureEffect {
    /// The transform or a node position changed.
    pub redraw: bool,
    pub commit: Option<NodeCommit>,
}

impl GestureEffect {
    fn redraw() -> Self {
        Self {
            redraw: true,
            commit: None,
        }
    }

    fn merge(mut self, other: GestureEffect) -> Self {
        self.redraw |= other.redraw;
        if other.commit.is_some() {
            self.commit = other.commit;
        }
        self
    }
}

/// The state the controller reads and writes while handling an event.
pub struct GestureTargets<'a> {
    pub view: &'a mut ViewTransform,
    pub layouts: &'a mut LayoutSet,
    pub view_config: &'a ViewConfig,
}

#[derive(Debug, Clone, Default)]
pub struct GestureController {
    state: GestureState,
    contacts: TouchContacts,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn contacts(&self) -> &TouchContacts {
        &self.contacts
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Drops any gesture in progress without committing it.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.contacts.clear();
    }

    pub fn handle(&mut self, event: &InputEvent, targets: &mut GestureTargets<'_>) -> GestureEffect {
        match event {
            InputEvent::Press { x, y } => {
                // a press without a release in between ends the old gesture first
                let ended = self.finish(targets);
                ended.merge(self.press(Point::new(*x, *y), targets))
            }
            InputEvent::Move { x, y } => self.pointer_move(Point::new(*x, *y), targets),
            InputEvent::Release | InputEvent::Leave => self.finish(targets),
            InputEvent::Wheel { x, y, delta_y } => {
                let changed = targets
                    .view
                    .wheel_zoom(Point::new(*x, *y), *delta_y, targets.view_config);
                GestureEffect {
                    redraw: changed,
                    commit: None,
                }
            }
            InputEvent::TouchStart { touches } => self.touch_start(touches, targets),
            InputEvent::TouchMove { touches } => self.touch_move(touches, targets),
            InputEvent::TouchEnd { ids } | InputEvent::TouchCancel { ids } => {
                self.touch_end(ids, targets)
            }
        }
    }

    fn press(&mut self, screen: Point, targets: &mut GestureTargets<'_>) -> GestureEffect {
        let world = targets.view.screen_to_world(screen);
        self.state = match hit_test(targets.layouts.iter(), world) {
            Some(node_id) => {
                tracing::trace!(node_id, "press on node, dragging");
                GestureState::DraggingNode {
                    node_id: node_id.to_string(),
                    last: screen,
                }
            }
            None => {
                tracing::trace!("press on empty canvas, panning");
                GestureState::PanningCanvas { last: screen }
            }
        };
        GestureEffect::default()
    }

    fn pointer_move(&mut self, screen: Point, targets: &mut GestureTargets<'_>) -> GestureEffect {
        match &mut self.state {
            GestureState::PanningCanvas { last } => {
                let (dx, dy) = last.delta_to(screen);
                targets.view.pan_by(dx, dy);
                *last = screen;
                GestureEffect::redraw()
            }
            GestureState::DraggingNode { node_id, last } => {
                let (dx, dy) = last.delta_to(screen);
                let scale = targets.view.scale;
                if targets.layouts.translate(node_id, dx / scale, dy / scale) {
                    *last = screen;
                    GestureEffect::redraw()
                } else {
                    tracing::warn!(node_id = %node_id, "dragged node has no layout, dropping drag");
                    self.state = GestureState::Idle;
                    GestureEffect::default()
                }
            }
            GestureState::Idle | GestureState::PinchZooming { .. } => GestureEffect::default(),
        }
    }

    /// Ends the current gesture. A node drag reports where the node ended up.
    fn finish(&mut self, targets: &mut GestureTargets<'_>) -> GestureEffect {
        let GestureState::DraggingNode { node_id, .. } = std::mem::take(&mut self.state) else {
            return GestureEffect::default();
        };
        match targets.layouts.get(&node_id) {
            Some(layout) => {
                tracing::debug!(node_id = %node_id, x = layout.x, y = layout.y, "node drag finished");
                GestureEffect {
                    redraw: false,
                    commit: Some(NodeCommit {
                        position: layout.position(),
                        node_id,
                    }),
                }
            }
            None => {
                tracing::warn!(node_id = %node_id, "dragged node vanished before release, nothing to commit");
                GestureEffect::default()
            }
        }
    }

    fn begin_pinch(&mut self) {
        let Some((a, b)) = self.contacts.pair() else {
            return;
        };
        if !matches!(self.state, GestureState::Idle | GestureState::PinchZooming { .. }) {
            tracing::trace!("second finger down, abandoning single-pointer gesture");
        }
        self.state = GestureState::PinchZooming {
            last_distance: a.distance(b),
            last_midpoint: a.midpoint(b),
        };
    }

    fn touch_start(&mut self, touches: &[TouchPoint], targets: &mut GestureTargets<'_>) -> GestureEffect {
        for touch in touches {
            self.contacts.insert(touch);
        }
        match self.contacts.len() {
            0 => GestureEffect::default(),
            1 => match self.contacts.first() {
                Some(point) => {
                    let ended = self.finish(targets);
                    ended.merge(self.press(point, targets))
                }
                None => GestureEffect::default(),
            },
            _ => {
                self.begin_pinch();
                GestureEffect::default()
            }
        }
    }

    fn touch_move(&mut self, touches: &[TouchPoint], targets: &mut GestureTargets<'_>) -> GestureEffect {
        for touch in touches {
            if !self.contacts.update(touch) {
                tracing::trace!(id = touch.id, "move for unknown touch contact ignored");
            }
        }

        let fingers = self.contacts.len();
        match self.state {
            GestureState::PanningCanvas { .. } | GestureState::DraggingNode { .. } if fingers == 1 => {
                match self.contacts.first() {
                    Some(point) => self.pointer_move(point, targets),
                    None => GestureEffect::default(),
                }
            }
            GestureState::PinchZooming {
                last_distance,
                last_midpoint,
            } if fingers >= 2 => {
                let Some((a, b)) = self.contacts.pair() else {
                    return GestureEffect::default();
                };
                let distance = a.distance(b);
                let midpoint = a.midpoint(b);
                let changed = targets
                    .view
                    .pinch(last_distance, last_midpoint, distance, midpoint);
                self.state = GestureState::PinchZooming {
                    last_distance: distance,
                    last_midpoint: midpoint,
                };
                GestureEffect {
                    redraw: changed,
                    commit: None,
                }
            }
            _ => GestureEffect::default(),
        }
    }

    fn touch_end(&mut self, ids: &[u32], targets: &mut GestureTargets<'_>) -> GestureEffect {
        for id in ids {
            self.contacts.remove(*id);
        }
        match self.contacts.len() {
            0 => {
                self.contacts.clear();
                self.finish(targets)
            }
            1 if matches!(self.state, GestureState::PinchZooming { .. }) => {
                // two fingers down to one: start over as a fresh single-finger press
                match self.contacts.first() {
                    Some(point) => self.press(point, targets),
                    None => GestureEffect::default(),
                }
            }
            1 => GestureEffect::default(),
            _ => {
                if matches!(self.state, GestureState::PinchZooming { .. }) {
                    self.begin_pinch();
                }
                GestureEffect::default()
            }
        }
    }
}
