use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Saved world-space top-left corner of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ids of the nodes this one causally depends on.
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<NodePosition>,
    /// Fields owned by other collaborators (timestamps, suggestions, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoryNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            causes: Vec::new(),
            tags: Vec::new(),
            order: 0,
            position: None,
            extra: Map::new(),
        }
    }

    pub fn with_causes<I, S>(mut self, causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.causes = causes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(NodePosition { x, y });
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<StoryNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supplies the ordered node list of a project.
pub trait NodeSource {
    fn nodes(&self, project_id: &str) -> Vec<StoryNode>;
}

/// Receives the final position of a node once a drag completes.
pub trait PositionSink {
    fn node_position_committed(&mut self, project_id: &str, node_id: &str, position: NodePosition);
}

/// Sink that remembers every commit, in order.
#[derive(Debug, Default, Clone)]
pub struct CommitLog {
    pub commits: Vec<PositionCommit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCommit {
    pub project_id: String,
    pub node_id: String,
    pub position: NodePosition,
}

impl PositionSink for CommitLog {
    fn node_position_committed(&mut self, project_id: &str, node_id: &str, position: NodePosition) {
        self.commits.push(PositionCommit {
            project_id: project_id.to_string(),
            node_id: node_id.to_string(),
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_node_keeps_unknown_fields() {
        let raw = r#"{
            "id": "a",
            "title": "Sick grandmother",
            "causes": [],
            "tags": ["exposition"],
            "order": 0,
            "createdAt": "2024-01-01T00:00:00Z",
            "position": {"x": 100, "y": 200}
        }"#;
        let node: StoryNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.position, Some(NodePosition { x: 100.0, y: 200.0 }));
        assert_eq!(node.description, "");
        assert!(node.extra.contains_key("createdAt"));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(back["tags"][0], "exposition");
    }

    #[test]
    fn missing_position_is_not_serialized() {
        let node = StoryNode::new("a", "A");
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("position").is_none());
    }
}
