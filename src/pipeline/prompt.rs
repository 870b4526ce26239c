//! Prompt templates for the three model calls: requirements summary,
//! test-case generation, and Playwright conversion.

use crate::figma::PageSummary;

/// Flat lists derived from the extraction result for prompt display.
/// Screens are frame names (minus placeholder "frame" labels); inputs and
/// buttons are classified by name substring, case-insensitively.
struct Inventory {
    screens: Vec<String>,
    input_fields: Vec<String>,
    buttons: Vec<String>,
}

impl Inventory {
    fn from_pages(pages: &[PageSummary]) -> Self {
        let mut screens = Vec::new();
        let mut input_fields = Vec::new();
        let mut buttons = Vec::new();

        for page in pages {
            for frame in &page.frames {
                if frame.name.to_lowercase() != "frame" {
                    screens.push(frame.name.clone());
                }
                for element in &frame.elements {
                    let lowered = element.name.to_lowercase();
                    if lowered.contains("input") {
                        input_fields.push(element.name.clone());
                    }
                    if lowered.contains("button") {
                        buttons.push(element.name.clone());
                    }
                }
            }
        }

        Self {
            screens,
            input_fields,
            buttons,
        }
    }
}

fn push_list(prompt: &mut String, heading: &str, items: &[String]) {
    prompt.push_str(&format!("## {}\n\n", heading));
    if items.is_empty() {
        prompt.push_str("None\n\n");
        return;
    }
    for item in items {
        prompt.push_str(&format!("- {}\n", item));
    }
    prompt.push('\n');
}

/// Prompt for the requirements summary produced at upload time.
pub fn build_summary_prompt(srs_text: &str) -> String {
    format!(
        r#"Analyze the software requirements document below. Produce a concise summary of its key functional and non-functional requirements, and include the frontend source URL if the document mentions one.

{srs_text}"#
    )
}

/// Merge the requirements summary with the extracted design inventory into
/// the test-case generation prompt.
pub fn build_test_case_prompt(summary: &str, pages: &[PageSummary]) -> String {
    let inventory = Inventory::from_pages(pages);
    let mut prompt = String::new();

    prompt.push_str(
        "You are a QA engineer writing manual test cases for a web application.\n\n",
    );
    prompt.push_str("## Requirements Summary\n\n");
    prompt.push_str(summary.trim());
    prompt.push_str("\n\n");

    push_list(&mut prompt, "Screens", &inventory.screens);
    push_list(&mut prompt, "Input Fields", &inventory.input_fields);
    push_list(&mut prompt, "Buttons", &inventory.buttons);

    prompt.push_str(
        r#"## Instructions

Write concrete, executable test cases covering the requirements and every screen and control listed above. Include both positive and negative flows, boundary values for input fields, and validation-message checks.

Format every test case exactly as:

Test Case: <short descriptive name>
Steps:
1. <step>
2. <step>
Expected Result: <single-line expected outcome>

Generate at least 10 test cases. Output only test cases in this format, nothing else.
"#,
    );

    prompt
}

/// Prompt for converting the generated test-case text into a Playwright file.
pub fn build_script_prompt(test_cases: &str, target_url: &str) -> String {
    format!(
        r#"You are an expert in Playwright test automation. Convert the manual test cases below into one complete, runnable Playwright test file in JavaScript.

Target application URL: {target_url}

Requirements for the generated file:
- Import `test` and `expect` from @playwright/test
- One test(...) block per test case, titled after the test case name
- Navigate to the target application URL at the start of each test
- Prefer resilient selectors: getByRole, getByLabel, getByPlaceholder, getByText
- Assert the expected result of every test case with expect(...)
- Output only the file's source code, with no commentary before or after

Manual test cases:

{test_cases}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figma::{FrameSummary, ImportantElement, PageSummary};

    fn element(name: &str, node_type: &str) -> ImportantElement {
        ImportantElement {
            id: None,
            name: name.to_string(),
            node_type: node_type.to_string(),
            category: crate::figma::extract::category_for_type(node_type),
        }
    }

    fn sample_pages() -> Vec<PageSummary> {
        vec![PageSummary {
            name: "Page 1".to_string(),
            frames: vec![
                FrameSummary {
                    id: None,
                    name: "Login Screen".to_string(),
                    node_type: "FRAME".to_string(),
                    elements: vec![
                        element("Email Input", "TEXTBOX"),
                        element("Password input", "TEXTBOX"),
                        element("Login Button", "BUTTON"),
                        element("Welcome heading", "TEXT"),
                    ],
                },
                FrameSummary {
                    id: None,
                    name: "Frame".to_string(),
                    node_type: "GROUP".to_string(),
                    elements: vec![element("Submit BUTTON", "BUTTON")],
                },
            ],
        }]
    }

    #[test]
    fn test_summary_prompt_carries_document_text() {
        let prompt = build_summary_prompt("The system shall allow login.");
        assert!(prompt.contains("The system shall allow login."));
        assert!(prompt.contains("functional and non-functional requirements"));
    }

    #[test]
    fn test_test_case_prompt_lists_inventory() {
        let prompt = build_test_case_prompt("Users must be able to log in.", &sample_pages());

        assert!(prompt.contains("Users must be able to log in."));
        assert!(prompt.contains("- Login Screen"));
        assert!(prompt.contains("- Email Input"));
        assert!(prompt.contains("- Password input"));
        assert!(prompt.contains("- Login Button"));
        assert!(prompt.contains("- Submit BUTTON"));
        assert!(prompt.contains("at least 10 test cases"));
    }

    #[test]
    fn test_placeholder_frame_names_are_not_screens() {
        let prompt = build_test_case_prompt("s", &sample_pages());
        // The generic "Frame" frame is dropped from the screens list even
        // though its elements still count.
        assert!(!prompt.contains("- Frame\n"));
    }

    #[test]
    fn test_plain_text_elements_are_not_classified() {
        let prompt = build_test_case_prompt("s", &sample_pages());
        assert!(!prompt.contains("- Welcome heading"));
    }

    #[test]
    fn test_empty_inventory_prints_none() {
        let prompt = build_test_case_prompt("s", &[]);
        assert!(prompt.contains("## Screens\n\nNone"));
        assert!(prompt.contains("## Input Fields\n\nNone"));
        assert!(prompt.contains("## Buttons\n\nNone"));
    }

    #[test]
    fn test_script_prompt_carries_cases_and_url() {
        let prompt = build_script_prompt("Test Case: Login works", "https://app.example.com");
        assert!(prompt.contains("Test Case: Login works"));
        assert!(prompt.contains("https://app.example.com"));
        assert!(prompt.contains("@playwright/test"));
    }
}
