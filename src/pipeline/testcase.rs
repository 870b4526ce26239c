//! Parser for the model's test-case text.
//!
//! The generation prompt pins the output format ("Test Case:", numbered
//! steps, "Expected Result:"), but model output drifts, so the parser is
//! lenient: unrecognized lines are skipped and garbage input yields an
//! empty list rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;

static STEP_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s*(.+)$").expect("static regex"));

const CASE_MARKER: &str = "Test Case:";
const EXPECTED_MARKER: &str = "Expected Result:";

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<String>,
    pub expected_result: Option<String>,
}

/// Parse test cases out of raw model output.
pub fn parse_test_cases(text: &str) -> Vec<TestCase> {
    let mut cases = Vec::new();
    let mut current: Option<TestCase> = None;

    for raw_line in text.lines() {
        // Models often bold the markers in markdown.
        let cleaned = raw_line.replace("**", "");
        let line = cleaned.trim();

        if let Some(rest) = line.strip_prefix(CASE_MARKER) {
            if let Some(done) = current.take() {
                if !done.name.is_empty() {
                    cases.push(done);
                }
            }
            current = Some(TestCase {
                name: rest.trim().to_string(),
                steps: Vec::new(),
                expected_result: None,
            });
        } else if let Some(rest) = line.strip_prefix(EXPECTED_MARKER) {
            if let Some(case) = current.as_mut() {
                let rest = rest.trim();
                if !rest.is_empty() {
                    case.expected_result = Some(rest.to_string());
                }
            }
        } else if let Some(caps) = STEP_LINE.captures(line) {
            if let Some(case) = current.as_mut() {
                // Numbered lines after the expected result are commentary,
                // not steps of this case.
                if case.expected_result.is_none() {
                    case.steps.push(caps[1].trim().to_string());
                }
            }
        }
    }

    if let Some(done) = current.take() {
        if !done.name.is_empty() {
            cases.push(done);
        }
    }

    cases
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"Test Case: Successful login with valid credentials
Steps:
1. Navigate to the login screen
2. Enter a registered email into the Email Input
3. Enter the matching password
4. Click the Login Button
Expected Result: The user lands on the dashboard

Test Case: Login rejected with wrong password
Steps:
1. Navigate to the login screen
2. Enter a registered email
3. Enter an incorrect password
4. Click the Login Button
Expected Result: An "invalid credentials" message is shown
"#;

    #[test]
    fn test_parses_well_formed_output() {
        let cases = parse_test_cases(WELL_FORMED);
        assert_eq!(cases.len(), 2);

        assert_eq!(cases[0].name, "Successful login with valid credentials");
        assert_eq!(cases[0].steps.len(), 4);
        assert_eq!(cases[0].steps[0], "Navigate to the login screen");
        assert_eq!(cases[0].steps[3], "Click the Login Button");
        assert_eq!(
            cases[0].expected_result.as_deref(),
            Some("The user lands on the dashboard")
        );

        assert_eq!(cases[1].name, "Login rejected with wrong password");
        assert_eq!(
            cases[1].expected_result.as_deref(),
            Some("An \"invalid credentials\" message is shown")
        );
    }

    #[test]
    fn test_markdown_bold_markers_are_tolerated() {
        let text = "**Test Case: Bold case**\nSteps:\n1. Do the thing\n**Expected Result:** It works";
        let cases = parse_test_cases(text);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "Bold case");
        assert_eq!(cases[0].steps, vec!["Do the thing".to_string()]);
        assert_eq!(cases[0].expected_result.as_deref(), Some("It works"));
    }

    #[test]
    fn test_paren_numbered_steps_are_accepted() {
        let text = "Test Case: Paren steps\n1) First\n2) Second\nExpected Result: Done";
        let cases = parse_test_cases(text);
        assert_eq!(cases[0].steps, vec!["First".to_string(), "Second".to_string()]);
    }

    #[test]
    fn test_garbage_yields_no_cases() {
        assert!(parse_test_cases("I'm sorry, I cannot help with that.").is_empty());
        assert!(parse_test_cases("").is_empty());
    }

    #[test]
    fn test_nameless_case_is_dropped() {
        let text = "Test Case:\n1. Step without a case name\nExpected Result: Nothing";
        assert!(parse_test_cases(text).is_empty());
    }

    #[test]
    fn test_numbered_lines_after_expected_result_are_ignored() {
        let text = "Test Case: Tail commentary\n1. Only step\nExpected Result: Ok\n1. Note one\n2. Note two";
        let cases = parse_test_cases(text);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].steps, vec!["Only step".to_string()]);
    }

    #[test]
    fn test_steps_without_marker_line_still_parse() {
        let text = "Test Case: No Steps heading\n1. Go\n2. Stop\nExpected Result: Stopped";
        let cases = parse_test_cases(text);
        assert_eq!(cases[0].steps.len(), 2);
    }
}
