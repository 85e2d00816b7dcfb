use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect};
use crate::model::{NodePosition, StoryNode};
use crate::text_metrics::{FontSpec, TextMeasure};
use crate::theme::Theme;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct TagChip {
    pub text: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title_lines: Vec<String>,
    pub tag_rows: Vec<Vec<TagChip>>,
    source_title: String,
    source_tags: Vec<String>,
}

impl NodeLayout {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn position(&self) -> NodePosition {
        NodePosition {
            x: self.x,
            y: self.y,
        }
    }

    fn content_matches(&self, node: &StoryNode) -> bool {
        self.source_title == node.title && self.source_tags == node.tags
    }

    fn apply_metrics(&mut self, metrics: NodeMetrics, node: &StoryNode) {
        self.width = metrics.width;
        self.height = metrics.height;
        self.title_lines = metrics.title_lines;
        self.tag_rows = metrics.tag_rows;
        self.source_title = node.title.clone();
        self.source_tags = node.tags.clone();
    }
}

/// Size and pre-wrapped content of one node box.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetrics {
    pub width: f32,
    pub height: f32,
    pub title_lines: Vec<String>,
    pub tag_rows: Vec<Vec<TagChip>>,
}

/// Greedy word wrap on single spaces, keeping at most `max_lines` lines.
/// A word wider than `max_width` still gets a line of its own.
pub fn wrap_title(
    text: &str,
    max_width: f32,
    font: &FontSpec,
    measure: &dyn TextMeasure,
    max_lines: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&candidate, font) > max_width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(max_lines);
    lines
}

/// Packs chips left to right, opening a new row when the next chip would
/// overflow `max_width`. The first chip of a row is always accepted.
pub fn pack_tag_rows(
    tags: &[String],
    max_width: f32,
    font: &FontSpec,
    measure: &dyn TextMeasure,
    config: &LayoutConfig,
) -> Vec<Vec<TagChip>> {
    let mut rows = Vec::new();
    let mut row: Vec<TagChip> = Vec::new();
    let mut row_width = 0.0f32;

    for tag in tags {
        let width = measure.text_width(tag, font) + config.tag_padding;
        let chip = TagChip {
            text: tag.clone(),
            width,
        };
        if row.is_empty() {
            row_width = width;
            row.push(chip);
        } else if row_width + config.tag_spacing + width <= max_width {
            row_width += config.tag_spacing + width;
            row.push(chip);
        } else {
            rows.push(std::mem::take(&mut row));
            row_width = width;
            row.push(chip);
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

pub fn measure_node(
    node: &StoryNode,
    config: &LayoutConfig,
    theme: &Theme,
    measure: &dyn TextMeasure,
) -> NodeMetrics {
    let usable = config.usable_width();
    let title_lines = wrap_title(
        &node.title,
        usable,
        &theme.title_font,
        measure,
        config.max_title_lines,
    );
    let tag_rows = pack_tag_rows(&node.tags, usable, &theme.tag_font, measure, config);

    let title_height = title_lines.len() as f32 * config.line_height;
    let tags_height = if tag_rows.is_empty() {
        0.0
    } else {
        config.section_spacing + tag_rows.len() as f32 * (config.tag_height + config.tag_spacing)
            - config.tag_spacing
    };
    let height = config.padding + title_height + tags_height + config.padding;

    NodeMetrics {
        width: config.node_width,
        height: height.max(config.min_node_height),
        title_lines,
        tag_rows,
    }
}

/// Grid slot for the node at `index` in list order.
pub fn default_position(index: usize, config: &LayoutConfig) -> Point {
    let columns = config.grid_columns.max(1);
    let column = (index % columns) as f32;
    let row = (index / columns) as f32;
    Point::new(
        config.grid_origin.x + column * config.grid_column_width,
        config.grid_origin.y + row * config.grid_row_height,
    )
}

fn build_layout(
    node: &StoryNode,
    index: usize,
    config: &LayoutConfig,
    theme: &Theme,
    measure: &dyn TextMeasure,
) -> NodeLayout {
    let origin = match node.position {
        Some(saved) => Point::new(saved.x, saved.y),
        None => default_position(index, config),
    };
    let metrics = measure_node(node, config, theme, measure);
    NodeLayout {
        id: node.id.clone(),
        x: origin.x,
        y: origin.y,
        width: metrics.width,
        height: metrics.height,
        title_lines: metrics.title_lines,
        tag_rows: metrics.tag_rows,
        source_title: node.title.clone(),
        source_tags: node.tags.clone(),
    }
}

/// One layout per node, in input order.
pub fn compute_layouts(
    nodes: &[StoryNode],
    config: &LayoutConfig,
    theme: &Theme,
    measure: &dyn TextMeasure,
) -> Vec<NodeLayout> {
    let mut set = LayoutSet::default();
    set.rebuild(nodes, config, theme, measure);
    set.layouts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    /// Same ids; this many nodes had their content re-measured in place.
    Remeasured(usize),
    Rebuilt,
}

/// The layouts currently on the surface, indexed by node id.
#[derive(Debug, Clone, Default)]
pub struct LayoutSet {
    layouts: Vec<NodeLayout>,
    index: HashMap<String, usize>,
    ids: Vec<String>,
}

impl LayoutSet {
    /// Brings the set in line with `nodes`.
    ///
    /// A change in the id sequence rebuilds everything from saved positions.
    /// Otherwise positions are left alone (they may be mid-drag) and only
    /// nodes whose title or tags changed are re-measured.
    pub fn sync(
        &mut self,
        nodes: &[StoryNode],
        config: &LayoutConfig,
        theme: &Theme,
        measure: &dyn TextMeasure,
    ) -> SyncOutcome {
        let ids_match = self.ids.len() == nodes.len()
            && self.ids.iter().zip(nodes).all(|(id, node)| *id == node.id);
        if !ids_match {
            self.rebuild(nodes, config, theme, measure);
            return SyncOutcome::Rebuilt;
        }

        let mut remeasured = 0;
        let mut seen = HashSet::new();
        for node in nodes {
            // later duplicates never own a layout
            if !seen.insert(node.id.as_str()) {
                continue;
            }
            let Some(&slot) = self.index.get(&node.id) else {
                continue;
            };
            let layout = &mut self.layouts[slot];
            if !layout.content_matches(node) {
                layout.apply_metrics(measure_node(node, config, theme, measure), node);
                remeasured += 1;
            }
        }
        if remeasured == 0 {
            SyncOutcome::Unchanged
        } else {
            tracing::debug!(remeasured, "node content changed, sizes updated");
            SyncOutcome::Remeasured(remeasured)
        }
    }

    pub fn rebuild(
        &mut self,
        nodes: &[StoryNode],
        config: &LayoutConfig,
        theme: &Theme,
        measure: &dyn TextMeasure,
    ) {
        self.layouts.clear();
        self.index.clear();
        self.ids = nodes.iter().map(|node| node.id.clone()).collect();

        for (idx, node) in nodes.iter().enumerate() {
            if self.index.contains_key(&node.id) {
                tracing::warn!(id = %node.id, "duplicate node id, keeping the first occurrence");
                continue;
            }
            self.index.insert(node.id.clone(), self.layouts.len());
            self.layouts.push(build_layout(node, idx, config, theme, measure));
        }
        tracing::debug!(nodes = self.layouts.len(), "layouts rebuilt");
    }

    pub fn clear(&mut self) {
        self.layouts.clear();
        self.index.clear();
        self.ids.clear();
    }

    pub fn get(&self, id: &str) -> Option<&NodeLayout> {
        self.index.get(id).map(|&slot| &self.layouts[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut NodeLayout> {
        self.index.get(id).map(|&slot| &mut self.layouts[slot])
    }

    /// Moves a node by a world-space delta. Size is untouched.
    pub fn translate(&mut self, id: &str, dx: f32, dy: f32) -> bool {
        match self.get_mut(id) {
            Some(layout) => {
                layout.x += dx;
                layout.y += dy;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeLayout> {
        self.layouts.iter()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl<'a> IntoIterator for &'a LayoutSet {
    type Item = &'a NodeLayout;
    type IntoIter = std::slice::Iter<'a, NodeLayout>;

    fn into_iter(self) -> Self::IntoIter {
        self.layouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::ApproxMetrics;

    /// Every character is exactly `per_char` units wide.
    struct Monospace {
        per_char: f32,
    }

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, _font: &FontSpec) -> f32 {
            text.chars().count() as f32 * self.per_char
        }
    }

    fn font() -> FontSpec {
        FontSpec::new(14.0, "Inter, sans-serif")
    }

    #[test]
    fn wrap_title_breaks_on_width() {
        let measure = Monospace { per_char: 10.0 };
        let lines = wrap_title("aaaa bbbb cccc", 90.0, &font(), &measure, 3);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn wrap_title_caps_line_count() {
        let measure = Monospace { per_char: 10.0 };
        let lines = wrap_title("one two three four five", 40.0, &font(), &measure, 3);
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn wrap_title_keeps_overlong_word() {
        let measure = Monospace { per_char: 10.0 };
        let lines = wrap_title("extraordinarily long", 50.0, &font(), &measure, 3);
        assert_eq!(lines, vec!["extraordinarily", "long"]);
    }

    #[test]
    fn empty_title_has_no_lines() {
        let measure = Monospace { per_char: 10.0 };
        assert!(wrap_title("", 100.0, &font(), &measure, 3).is_empty());
    }

    #[test]
    fn tag_rows_pack_greedily() {
        let measure = Monospace { per_char: 10.0 };
        let config = LayoutConfig::default();
        let tags: Vec<String> = ["aaaaa", "bbbbb", "ccccc", "dddddddddddddddddddddd"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        // chips are 62 wide; 62 + 4 + 62 = 128 fits 184, a third needs 194
        let rows = pack_tag_rows(&tags, config.usable_width(), &font(), &measure, &config);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[2][0].width, 232.0);
    }

    #[test]
    fn height_follows_content() {
        let measure = Monospace { per_char: 10.0 };
        let config = LayoutConfig::default();
        let theme = Theme::dark();
        let node = StoryNode::new("n", "aaaa bbbb cccc dddd eeee ffff gggg hhhh")
            .with_tags(["t1", "t2", "t3", "t4", "t5", "t6"]);
        let metrics = measure_node(&node, &config, &theme, &measure);
        assert_eq!(metrics.title_lines.len(), 3);
        // chips are 32 wide: five fit in 184 (5*32 + 4*4 = 176), the sixth wraps
        assert_eq!(metrics.tag_rows.len(), 2);
        let expected = 8.0 + 3.0 * 18.0 + 8.0 + 2.0 * 20.0 - 4.0 + 8.0;
        assert_eq!(metrics.height, expected);
    }

    #[test]
    fn height_has_floor() {
        let config = LayoutConfig::default();
        let metrics = measure_node(&StoryNode::new("n", "x"), &config, &Theme::dark(), &ApproxMetrics);
        assert_eq!(metrics.height, 80.0);
        assert_eq!(metrics.width, 200.0);
    }

    #[test]
    fn default_grid_positions() {
        let config = LayoutConfig::default();
        assert_eq!(default_position(0, &config), Point::new(100.0, 100.0));
        assert_eq!(default_position(2, &config), Point::new(700.0, 100.0));
        assert_eq!(default_position(4, &config), Point::new(400.0, 300.0));
    }

    #[test]
    fn saved_positions_win_over_grid() {
        let nodes = vec![
            StoryNode::new("a", "A").with_position(5.0, 6.0),
            StoryNode::new("b", "B"),
        ];
        let layouts = compute_layouts(&nodes, &LayoutConfig::default(), &Theme::dark(), &ApproxMetrics);
        assert_eq!((layouts[0].x, layouts[0].y), (5.0, 6.0));
        assert_eq!((layouts[1].x, layouts[1].y), (400.0, 100.0));
    }

    #[test]
    fn layouts_are_deterministic() {
        let nodes = vec![
            StoryNode::new("a", "Sick grandmother").with_tags(["exposition", "character motivation"]),
            StoryNode::new("b", "Journey with food").with_causes(["a"]),
        ];
        let config = LayoutConfig::default();
        let theme = Theme::dark();
        let first = compute_layouts(&nodes, &config, &theme, &ApproxMetrics);
        let second = compute_layouts(&nodes, &config, &theme, &ApproxMetrics);
        assert_eq!(first, second);
        assert!(first.iter().all(|layout| layout.height >= 80.0));
    }

    #[test]
    fn sync_keeps_dragged_positions_until_ids_change() {
        let config = LayoutConfig::default();
        let theme = Theme::dark();
        let mut nodes = vec![StoryNode::new("a", "A"), StoryNode::new("b", "B")];
        let mut set = LayoutSet::default();
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Rebuilt);

        assert!(set.translate("a", 10.0, 20.0));
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Unchanged);
        assert_eq!(set.get("a").map(|l| (l.x, l.y)), Some((110.0, 120.0)));

        nodes[1].tags.push("new".to_string());
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Remeasured(1));
        assert_eq!(set.get("b").map(|l| l.tag_rows.len()), Some(1));
        assert_eq!(set.get("a").map(|l| l.x), Some(110.0));

        nodes.remove(0);
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Rebuilt);
        assert!(set.get("a").is_none());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("b").map(|l| l.x), Some(100.0));
    }

    #[test]
    fn empty_input_clears_layouts() {
        let config = LayoutConfig::default();
        let theme = Theme::dark();
        let mut set = LayoutSet::default();
        set.sync(&[StoryNode::new("a", "A")], &config, &theme, &ApproxMetrics);
        set.sync(&[], &config, &theme, &ApproxMetrics);
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_one_layout() {
        let nodes = vec![StoryNode::new("a", "first"), StoryNode::new("a", "second")];
        let layouts = compute_layouts(&nodes, &LayoutConfig::default(), &Theme::dark(), &ApproxMetrics);
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].title_lines, vec!["first"]);

        let mut set = LayoutSet::default();
        let config = LayoutConfig::default();
        let theme = Theme::dark();
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Rebuilt);
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Unchanged);
        assert_eq!(set.sync(&nodes, &config, &theme, &ApproxMetrics), SyncOutcome::Unchanged);
        assert_eq!(set.get("a").unwrap().title_lines, vec!["first"]);
    }
}
