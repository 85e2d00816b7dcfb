use crate::graph_view::GraphView;
use crate::layout::NodeLayout;
use crate::render::EdgeCurve;
use crate::view::ViewTransform;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub project_id: String,
    pub view: ViewTransform,
    pub surface_width: f32,
    pub surface_height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title_lines: Vec<String>,
    pub tag_rows: Vec<Vec<TagDump>>,
}

#[derive(Debug, Serialize)]
pub struct TagDump {
    pub text: String,
    pub width: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub points: [[f32; 2]; 4],
}

impl NodeDump {
    fn from_layout(layout: &NodeLayout) -> Self {
        Self {
            id: layout.id.clone(),
            x: layout.x,
            y: layout.y,
            width: layout.width,
            height: layout.height,
            title_lines: layout.title_lines.clone(),
            tag_rows: layout
                .tag_rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|chip| TagDump {
                            text: chip.text.clone(),
                            width: chip.width,
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

impl LayoutDump {
    pub fn from_view(view: &GraphView) -> Self {
        let layouts = view.layouts();
        let nodes = layouts.iter().map(NodeDump::from_layout).collect();

        let mut edges = Vec::new();
        for node in view.nodes() {
            let Some(child) = layouts.get(&node.id) else {
                continue;
            };
            for cause in &node.causes {
                let Some(parent) = layouts.get(cause) else {
                    continue;
                };
                let curve = EdgeCurve::between(&parent.rect(), &child.rect());
                edges.push(EdgeDump {
                    from: cause.clone(),
                    to: node.id.clone(),
                    points: [curve.start, curve.cp1, curve.cp2, curve.end].map(|p| [p.x, p.y]),
                });
            }
        }

        let (surface_width, surface_height) = view.surface_size();
        Self {
            project_id: view.project_id().to_string(),
            view: *view.view(),
            surface_width,
            surface_height,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, view: &GraphView) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_view(view);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
