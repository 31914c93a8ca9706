//! Recording domain types
//!
//! A recording is the JSON document produced by a browser recorder: an
//! optional title and viewport plus the ordered list of captured steps.
//! Parsing is lenient where recorders disagree (null lists, bare-string
//! selector groups, non-string values, fractional dimensions). Steps are kept
//! as raw JSON and decoded one at a time, so a malformed step only affects
//! itself.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// A captured browser interaction session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<RecordedStep>,
}

impl Recording {
    /// Parse a recording from its JSON text
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

/// Browser viewport dimensions; zero means "not recorded"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default, deserialize_with = "dimension")]
    pub width: u32,
    #[serde(default, deserialize_with = "dimension")]
    pub height: u32,
}

impl Viewport {
    /// Both dimensions were recorded
    pub fn is_set(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Scroll offsets recorded on a scroll step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// A step exactly as the recorder wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedStep(JsonValue);

impl RecordedStep {
    /// Decode into a typed step; fails for this step only
    pub fn decode(&self) -> serde_json::Result<Step> {
        Step::deserialize(&self.0)
    }

    /// The literal `type` field, when it is a string
    pub fn type_name(&self) -> Option<&str> {
        self.0.get("type").and_then(JsonValue::as_str)
    }
}

impl From<JsonValue> for RecordedStep {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// One recorded interaction or assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub target: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub key: Option<String>,
    /// Candidate selector groups, most specific recorder guess first
    #[serde(
        default,
        deserialize_with = "selector_groups",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selectors: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_position: Option<ScrollPosition>,
    /// Frame nesting path; empty for the top-level document
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub frame: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<u32>,
    #[serde(
        default,
        deserialize_with = "optional_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<u32>,
}

impl Step {
    /// Creates a step of the given type with every optional field empty
    pub fn new(step_type: StepType) -> Self {
        Self {
            step_type,
            url: None,
            target: None,
            value: None,
            key: None,
            selectors: Vec::new(),
            scroll_position: None,
            frame: Vec::new(),
            assertion: None,
            width: None,
            height: None,
        }
    }

    /// First frame index of the nesting path, if the step ran inside a frame
    pub fn frame_index(&self) -> Option<usize> {
        self.frame.first().copied()
    }
}

/// The closed set of step kinds the compiler understands
///
/// Anything else is kept verbatim in `Unknown` so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    SetViewport,
    Navigate,
    Click,
    DoubleClick,
    Change,
    KeyDown,
    KeyUp,
    Submit,
    Scroll,
    Hover,
    WaitForElement,
    Assert,
    Unknown(String),
}

impl StepType {
    /// The literal type string used in recordings
    pub fn as_str(&self) -> &str {
        match self {
            StepType::SetViewport => "setViewport",
            StepType::Navigate => "navigate",
            StepType::Click => "click",
            StepType::DoubleClick => "doubleClick",
            StepType::Change => "change",
            StepType::KeyDown => "keyDown",
            StepType::KeyUp => "keyUp",
            StepType::Submit => "submit",
            StepType::Scroll => "scroll",
            StepType::Hover => "hover",
            StepType::WaitForElement => "waitForElement",
            StepType::Assert => "assert",
            StepType::Unknown(raw) => raw,
        }
    }
}

impl From<String> for StepType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "setViewport" => StepType::SetViewport,
            "navigate" => StepType::Navigate,
            "click" => StepType::Click,
            "doubleClick" => StepType::DoubleClick,
            "change" => StepType::Change,
            "keyDown" => StepType::KeyDown,
            "keyUp" => StepType::KeyUp,
            "submit" => StepType::Submit,
            "scroll" => StepType::Scroll,
            "hover" => StepType::Hover,
            "waitForElement" => StepType::WaitForElement,
            "assert" => StepType::Assert,
            _ => StepType::Unknown(raw),
        }
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        match step_type {
            StepType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lenient field decoding
// =============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and booleans; the compiler only ever embeds text
fn text_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// Pixel count from any JSON number, rounded and clamped
fn pixels(value: &JsonValue) -> Option<u32> {
    let pixels = value.as_f64()?.round();
    (pixels.is_finite() && pixels >= 0.0).then(|| pixels.min(f64::from(u32::MAX)) as u32)
}

fn dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_dimension(deserializer)?.unwrap_or_default())
}

fn optional_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<JsonValue>::deserialize(deserializer)?
        .as_ref()
        .and_then(pixels))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectorGroup {
    Single(String),
    Many(Vec<String>),
}

fn selector_groups<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups: Option<Vec<SelectorGroup>> = Option::deserialize(deserializer)?;
    Ok(groups
        .unwrap_or_default()
        .into_iter()
        .map(|group| match group {
            SelectorGroup::Single(selector) => vec![selector],
            SelectorGroup::Many(selectors) => selectors,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recorder_document() {
        let source = r##"{
            "title": "Login flow",
            "viewport": { "width": 1280, "height": 720 },
            "steps": [
                { "type": "setViewport", "width": 1280, "height": 720, "deviceScaleFactor": 1 },
                { "type": "navigate", "url": "https://example.com/login" },
                {
                    "type": "click",
                    "target": "main",
                    "selectors": [["aria/Sign in"], ["#sign-in"]],
                    "frame": [0]
                }
            ]
        }"##;

        let recording = Recording::from_json(source).unwrap();
        assert_eq!(recording.title.as_deref(), Some("Login flow"));
        assert_eq!(
            recording.viewport,
            Some(Viewport {
                width: 1280,
                height: 720
            })
        );
        assert_eq!(recording.steps.len(), 3);
        let steps: Vec<Step> = recording.steps.iter().map(|s| s.decode().unwrap()).collect();
        assert_eq!(steps[0].step_type, StepType::SetViewport);
        assert_eq!(steps[0].width, Some(1280));
        assert_eq!(steps[2].selectors[1], vec!["#sign-in"]);
        assert_eq!(steps[2].frame_index(), Some(0));
    }

    #[test]
    fn test_missing_or_null_steps_default_to_empty() {
        let recording = Recording::from_json(r#"{ "title": "empty" }"#).unwrap();
        assert!(recording.steps.is_empty());

        let recording = Recording::from_json(r#"{ "steps": null }"#).unwrap();
        assert!(recording.steps.is_empty());
    }

    #[test]
    fn test_unknown_step_type_keeps_literal() {
        let recording =
            Recording::from_json(r#"{ "steps": [{ "type": "customStep" }] }"#).unwrap();
        let step_type = recording.steps[0].decode().unwrap().step_type;
        assert_eq!(step_type, StepType::Unknown("customStep".to_string()));
        assert_eq!(step_type.as_str(), "customStep");
    }

    #[test]
    fn test_step_type_round_trips_through_string() {
        let json = serde_json::to_string(&StepType::WaitForElement).unwrap();
        assert_eq!(json, "\"waitForElement\"");
        let parsed: StepType = serde_json::from_str("\"doubleClick\"").unwrap();
        assert_eq!(parsed, StepType::DoubleClick);
    }

    #[test]
    fn test_lenient_selector_and_value_fields() {
        let recording = Recording::from_json(
            r##"{ "steps": [{ "type": "assert", "selectors": ["#total", ["text/Sum"]], "value": 42 }] }"##,
        )
        .unwrap();
        let step = recording.steps[0].decode().unwrap();
        assert_eq!(
            step.selectors,
            vec![vec!["#total".to_string()], vec!["text/Sum".to_string()]]
        );
        assert_eq!(step.value.as_deref(), Some("42"));
    }

    #[test]
    fn test_scroll_position_defaults_missing_axis() {
        let recording = Recording::from_json(
            r#"{ "steps": [{ "type": "scroll", "scrollPosition": { "y": 300 } }] }"#,
        )
        .unwrap();
        let position = recording.steps[0].decode().unwrap().scroll_position.unwrap();
        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 300.0);
    }

    #[test]
    fn test_malformed_step_does_not_fail_recording() {
        let recording = Recording::from_json(
            r##"{ "steps": [{ "url": "x" }, { "type": "click", "selectors": [["#go"]] }] }"##,
        )
        .unwrap();

        assert_eq!(recording.steps.len(), 2);
        assert!(recording.steps[0].decode().is_err());
        assert_eq!(recording.steps[0].type_name(), None);
        assert_eq!(recording.steps[1].type_name(), Some("click"));
        assert_eq!(recording.steps[1].decode().unwrap().step_type, StepType::Click);
    }

    #[test]
    fn test_fractional_dimensions_and_numeric_key() {
        let recording = Recording::from_json(
            r#"{
                "viewport": { "width": 1280.5, "height": 719.6 },
                "steps": [
                    { "type": "setViewport", "width": 1280.5, "height": 720 },
                    { "type": "keyDown", "key": 13 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(recording.viewport, Some(Viewport { width: 1281, height: 720 }));
        assert_eq!(recording.steps[0].decode().unwrap().width, Some(1281));
        assert_eq!(recording.steps[1].decode().unwrap().key.as_deref(), Some("13"));
    }

    #[test]
    fn test_viewport_is_set() {
        assert!(Viewport { width: 800, height: 600 }.is_set());
        assert!(!Viewport { width: 800, height: 0 }.is_set());
    }
}
