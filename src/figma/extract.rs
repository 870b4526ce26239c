//! Pure projection of a Figma file into the flat element lists the prompt
//! builder consumes. No I/O here: fetch happens in [`super::Client`], and the
//! same input always yields the same output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::DesignError;

/// Top-level document children count as pages only when named like "Page 1".
/// Case-sensitive and anchored, so "Cover Page" and "page1" are discarded.
static PAGE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Page \d+").expect("static regex"));

/// Node types surfaced to the test-case prompt. Everything else is traversal
/// scaffolding.
const IMPORTANT_TYPES: [&str; 6] = [
    "TEXT",
    "TEXTBOX",
    "BUTTON",
    "DROPDOWN",
    "CHECKBOX",
    "RADIO_BUTTON",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ImportantElement {
    pub id: Option<String>,
    pub name: String,
    pub node_type: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub id: Option<String>,
    pub name: String,
    pub node_type: String,
    pub elements: Vec<ImportantElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub name: String,
    pub frames: Vec<FrameSummary>,
}

/// Map a node's type tag to the UI category shown in prompts. Unknown tags
/// pass through verbatim.
pub fn category_for_type(node_type: &str) -> String {
    match node_type {
        "BUTTON" => "Button".to_string(),
        "DROPDOWN" => "Dropdown".to_string(),
        "CHECKBOX" => "Checkbox".to_string(),
        "RADIO_BUTTON" => "Radio Button".to_string(),
        // TODO: confirm whether the "input" probe should inspect the element
        // name instead of the type tag; no tag in IMPORTANT_TYPES contains
        // "input", so this arm currently always yields "Text".
        "TEXT" | "TEXTBOX" => {
            if node_type.to_lowercase().contains("input") {
                "Input Field".to_string()
            } else {
                "Text".to_string()
            }
        }
        other => other.to_string(),
    }
}

fn node_name(node: &Value) -> Option<&str> {
    node.get("name").and_then(Value::as_str).filter(|n| !n.is_empty())
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn node_id(node: &Value) -> Option<String> {
    node.get("id").and_then(Value::as_str).map(str::to_string)
}

fn node_children(node: &Value) -> &[Value] {
    node.get("children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Depth-first flatten of a frame subtree, collecting important elements in
/// document order. Traversal always descends, whatever the node's own type;
/// a node missing its name or type is dropped from the output but its
/// children are still visited. Uses an explicit work stack so input nesting
/// depth cannot exhaust the call stack.
fn flatten_important(children: &[Value]) -> Vec<ImportantElement> {
    let mut elements = Vec::new();
    let mut stack: Vec<&Value> = children.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if let (Some(name), Some(node_ty)) = (node_name(node), node_type(node)) {
            if IMPORTANT_TYPES.contains(&node_ty) {
                elements.push(ImportantElement {
                    id: node_id(node),
                    name: name.trim().to_string(),
                    node_type: node_ty.to_string(),
                    category: category_for_type(node_ty),
                });
            }
        }
        for child in node_children(node).iter().rev() {
            stack.push(child);
        }
    }

    elements
}

/// Project a fetched Figma file into page summaries.
///
/// Fatal only when `document.children` is absent or not a sequence; an
/// individually malformed node is skipped without aborting the extraction.
/// Frames with no important descendants and pages with no surviving frames
/// are dropped.
pub fn extract_pages(file: &Value) -> Result<Vec<PageSummary>, DesignError> {
    let top_level = file
        .get("document")
        .and_then(|doc| doc.get("children"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DesignError::MalformedDocument("missing document.children".to_string())
        })?;

    let mut pages = Vec::new();
    for page in top_level {
        let Some(page_name) = node_name(page) else {
            continue;
        };
        if !PAGE_NAME.is_match(page_name) {
            continue;
        }

        let mut frames = Vec::new();
        for node in node_children(page) {
            let Some(node_ty) = node_type(node) else {
                continue;
            };
            if node_ty != "FRAME" && node_ty != "GROUP" {
                continue;
            }
            let Some(frame_name) = node_name(node) else {
                continue;
            };

            let elements = flatten_important(node_children(node));
            if elements.is_empty() {
                continue;
            }

            frames.push(FrameSummary {
                id: node_id(node),
                name: frame_name.trim().to_string(),
                node_type: node_ty.to_string(),
                elements,
            });
        }

        if !frames.is_empty() {
            pages.push(PageSummary {
                name: page_name.to_string(),
                frames,
            });
        }
    }

    Ok(pages)
}
