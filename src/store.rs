use crate::error::{Error, Result, read_to_string, write_bytes};
use crate::model::{NodePosition, NodeSource, PositionSink, Project, StoryNode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A project file holds either one project or an array of them.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum ProjectFile {
    Many(Vec<Project>),
    One(Box<Project>),
}

/// Parses JSON, falling back to JSON5 (comments, trailing commas, unquoted
/// keys). Files with a `.json5` extension go straight to the JSON5 parser.
pub(crate) fn parse_document<T: DeserializeOwned>(contents: &str, origin: &Path) -> Result<T> {
    let is_json5 = origin
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json5"));
    if is_json5 {
        return json5::from_str(contents).map_err(|source| Error::Json5 {
            path: origin.to_path_buf(),
            source,
        });
    }
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(source) => match json5::from_str(contents) {
            Ok(value) => {
                tracing::debug!(path = %origin.display(), "parsed as JSON5");
                Ok(value)
            }
            Err(_) => Err(Error::Json {
                path: origin.to_path_buf(),
                source,
            }),
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: Vec<Project>,
    single: bool,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            single: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        Self::parse(&contents, path)
    }

    /// `origin` is only used to pick the parser and to label errors.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let store = match parse_document::<ProjectFile>(contents, origin)? {
            ProjectFile::Many(projects) => Self {
                projects,
                single: false,
            },
            ProjectFile::One(project) => Self {
                projects: vec![*project],
                single: true,
            },
        };
        tracing::debug!(
            path = %origin.display(),
            projects = store.projects.len(),
            "project file loaded"
        );
        Ok(store)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| project.id == id)
    }

    /// `requested` if it names a known project, otherwise the first project.
    pub fn resolve_project_id(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(id) => self
                .project(id)
                .map(|project| project.id.clone())
                .ok_or_else(|| Error::UnknownProject(id.to_string())),
            None => self
                .projects
                .first()
                .map(|project| project.id.clone())
                .ok_or(Error::EmptyStore),
        }
    }

    /// Adds a project, replacing any existing one with the same id.
    pub fn insert(&mut self, project: Project) {
        match self.project_mut(&project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    pub fn update_node_position(
        &mut self,
        project_id: &str,
        node_id: &str,
        position: NodePosition,
    ) -> bool {
        let node = self
            .project_mut(project_id)
            .and_then(|project| project.nodes.iter_mut().find(|node| node.id == node_id));
        match node {
            Some(node) => {
                node.position = Some(position);
                true
            }
            None => false,
        }
    }

    /// Serializes in the same shape it was loaded from.
    pub fn to_json_string(&self) -> Result<String> {
        let json = match (self.single, self.projects.as_slice()) {
            (true, [project]) => serde_json::to_string_pretty(project)?,
            _ => serde_json::to_string_pretty(&self.projects)?,
        };
        Ok(json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json_string()?;
        json.push('\n');
        write_bytes(path, json)?;
        tracing::debug!(path = %path.display(), "project file saved");
        Ok(())
    }
}

impl NodeSource for ProjectStore {
    fn nodes(&self, project_id: &str) -> Vec<StoryNode> {
        match self.project(project_id) {
            Some(project) => project.nodes.clone(),
            None => {
                tracing::warn!(project_id, "unknown project, no nodes");
                Vec::new()
            }
        }
    }
}

impl PositionSink for ProjectStore {
    fn node_position_committed(&mut self, project_id: &str, node_id: &str, position: NodePosition) {
        if !self.update_node_position(project_id, node_id, position) {
            tracing::warn!(project_id, node_id, "position commit for unknown node dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SINGLE: &str = r#"{
        "id": "p1",
        "name": "Tale",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "nodes": [
            {
                "id": "n1",
                "title": "Sick grandmother",
                "description": "",
                "causes": [],
                "tags": ["exposition"],
                "order": 0,
                "aiSuggestions": ["more wolves"],
                "position": {"x": 100, "y": 100}
            },
            {"id": "n2", "title": "Journey", "causes": ["n1"], "order": 1}
        ]
    }"#;

    #[test]
    fn loads_single_project() {
        let store = ProjectStore::parse(SINGLE, Path::new("tale.json")).unwrap();
        assert_eq!(store.projects().len(), 1);
        let nodes = store.nodes("p1");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].causes, vec!["n1".to_string()]);
        assert_eq!(nodes[1].position, None);
    }

    #[test]
    fn loads_project_array_and_json5() {
        let raw = r#"[
            // comments and trailing commas are fine
            {id: "a", name: "A", nodes: [],},
            {id: "b", name: "B", nodes: [],},
        ]"#;
        let store = ProjectStore::parse(raw, Path::new("projects.json")).unwrap();
        assert_eq!(store.resolve_project_id(None).unwrap(), "a");
        assert_eq!(store.resolve_project_id(Some("b")).unwrap(), "b");
        assert!(matches!(
            store.resolve_project_id(Some("zzz")),
            Err(Error::UnknownProject(_))
        ));
    }

    #[test]
    fn invalid_input_reports_json_error() {
        let err = ProjectStore::parse("{ nope", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        let err = ProjectStore::parse("{ nope", Path::new("bad.json5")).unwrap_err();
        assert!(matches!(err, Error::Json5 { .. }));
    }

    #[test]
    fn empty_store_has_no_default_project() {
        assert!(matches!(
            ProjectStore::new().resolve_project_id(None),
            Err(Error::EmptyStore)
        ));
    }

    #[test]
    fn commit_updates_position_and_keeps_unknown_fields() {
        let mut store = ProjectStore::parse(SINGLE, Path::new("tale.json")).unwrap();
        store.node_position_committed("p1", "n2", NodePosition { x: 130.0, y: 160.0 });
        store.node_position_committed("p1", "missing", NodePosition { x: 0.0, y: 0.0 });

        let saved: Value = serde_json::from_str(&store.to_json_string().unwrap()).unwrap();
        assert_eq!(saved["createdAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(saved["nodes"][0]["aiSuggestions"][0], "more wolves");
        assert_eq!(saved["nodes"][1]["position"]["x"], 130.0);
        assert_eq!(saved["nodes"][1]["position"]["y"], 160.0);
    }

    #[test]
    fn unknown_project_yields_no_nodes() {
        let store = ProjectStore::parse(SINGLE, Path::new("tale.json")).unwrap();
        assert!(store.nodes("other").is_empty());
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut store = ProjectStore::parse(SINGLE, Path::new("tale.json")).unwrap();
        let mut replacement = store.project("p1").unwrap().clone();
        replacement.name = "Renamed".to_string();
        store.insert(replacement);
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.project("p1").unwrap().name, "Renamed");
    }
}
