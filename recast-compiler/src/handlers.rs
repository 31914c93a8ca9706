//! Step handlers
//!
//! One arm per step type. Each arm turns a step and its resolved selector
//! into Cypress instructions; selector-bound instructions are then scoped to
//! the step's frame when it has one.

use recast_core::domain::recording::{Step, StepType};

use crate::error::StepError;
use crate::frame::wrap_in_frame;
use crate::script::{comment_text, js_string};
use crate::selector::locator_code;

const NAVIGATION_SETTLE: &str = "cy.wait(2000); // let the page load";
const LONG_SETTLE: &str = "cy.wait(1000);";
const SHORT_SETTLE: &str = "cy.wait(500);";

/// Keys pressed globally regardless of the recorded target
const GLOBAL_KEYS: [&str; 2] = ["Tab", "Enter"];

/// What a single step compiles to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Instructions in execution order
    Code(Vec<String>),
    /// Inert marker for a step type without a handler
    Placeholder(String),
}

/// An emitted instruction and whether it targets the located element
enum Line {
    Bound(String),
    Global(String),
}

impl Line {
    fn global(text: impl Into<String>) -> Self {
        Line::Global(text.into())
    }
}

/// Compile one step
///
/// # Arguments
/// * `step` - The recorded step
/// * `selector` - The selector resolved from the step's candidates, if any
///
/// # Returns
/// The emitted instructions, or the reason this step cannot be compiled
pub fn compile_step(step: &Step, selector: Option<&str>) -> Result<Emission, StepError> {
    let lines = match &step.step_type {
        StepType::SetViewport => set_viewport(step)?,
        StepType::Navigate => navigate(step)?,
        StepType::Click => click(step, selector)?,
        StepType::DoubleClick => bound_action(step, selector, "dblclick()", Some(LONG_SETTLE))?,
        StepType::Submit => bound_action(step, selector, "submit()", Some(LONG_SETTLE))?,
        StepType::Hover => {
            bound_action(step, selector, "trigger('mouseover')", Some(SHORT_SETTLE))?
        }
        StepType::WaitForElement => bound_action(step, selector, "should('exist')", None)?,
        StepType::Change => change(step, selector)?,
        StepType::KeyDown => key_down(step, selector)?,
        StepType::KeyUp => vec![Line::Global(format!(
            "// keyUp: {} (no key-release command, ignored)",
            comment_text(step.key.as_deref().unwrap_or("?"))
        ))],
        StepType::Scroll => scroll(step, selector),
        StepType::Assert => assert(step, selector)?,
        StepType::Unknown(raw) => {
            return Ok(Emission::Placeholder(format!(
                "// Unhandled step type: {}",
                comment_text(raw)
            )));
        }
    };

    Ok(Emission::Code(scope_to_frame(step.frame_index(), lines)))
}

// =============================================================================
// Handlers
// =============================================================================

fn set_viewport(step: &Step) -> Result<Vec<Line>, StepError> {
    let width = step
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| missing_field(step, "width"))?;
    let height = step
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| missing_field(step, "height"))?;
    Ok(vec![Line::Global(format!("cy.viewport({}, {});", width, height))])
}

fn navigate(step: &Step) -> Result<Vec<Line>, StepError> {
    let url = non_empty(step.url.as_deref()).ok_or_else(|| missing_field(step, "url"))?;
    Ok(vec![
        Line::Global(format!("cy.visit({});", js_string(url))),
        Line::global(NAVIGATION_SETTLE),
    ])
}

fn click(step: &Step, selector: Option<&str>) -> Result<Vec<Line>, StepError> {
    if let Some(target) = navigation_target(step) {
        return Ok(vec![
            Line::global("// click opened a new page, replaced with a visit"),
            Line::Global(format!("cy.visit({});", js_string(target))),
            Line::global(NAVIGATION_SETTLE),
        ]);
    }
    bound_action(
        step,
        selector,
        "should('exist').first().click()",
        Some(LONG_SETTLE),
    )
}

/// The click's target when it points at a different absolute page
fn navigation_target(step: &Step) -> Option<&str> {
    let target = step.target.as_deref()?;
    let absolute = target.starts_with("http://") || target.starts_with("https://");
    (absolute && step.url.as_deref() != Some(target)).then_some(target)
}

fn change(step: &Step, selector: Option<&str>) -> Result<Vec<Line>, StepError> {
    let locator = locate(step, selector)?;
    let action = match non_empty(step.value.as_deref()) {
        Some(value) => format!("{}.clear().type({});", locator, js_string(value)),
        None => format!("{}.clear();", locator),
    };
    Ok(vec![Line::Bound(action), Line::global(LONG_SETTLE)])
}

fn key_down(step: &Step, selector: Option<&str>) -> Result<Vec<Line>, StepError> {
    let key = non_empty(step.key.as_deref()).ok_or_else(|| missing_field(step, "key"))?;
    let press = format!("cy.realPress({});", js_string(key));

    if GLOBAL_KEYS.contains(&key) {
        return Ok(vec![Line::Global(press), Line::global(LONG_SETTLE)]);
    }
    match selector {
        None => Ok(vec![Line::Global(press)]),
        Some(selector) => Ok(vec![
            Line::Bound(format!(
                "{}.realType({});",
                locator_code(selector),
                js_string(key)
            )),
            Line::global(SHORT_SETTLE),
        ]),
    }
}

fn scroll(step: &Step, selector: Option<&str>) -> Vec<Line> {
    let position = step.scroll_position.unwrap_or_default();
    match selector {
        Some(selector) => vec![Line::Bound(format!(
            "{}.scrollTo({}, {});",
            locator_code(selector),
            position.x,
            position.y
        ))],
        None => vec![Line::Global(format!(
            "cy.scrollTo({}, {});",
            position.x, position.y
        ))],
    }
}

fn assert(step: &Step, selector: Option<&str>) -> Result<Vec<Line>, StepError> {
    let locator = locate(step, selector)?;
    let kind = non_empty(step.assertion.as_deref()).unwrap_or("exist");
    let should = match non_empty(step.value.as_deref()) {
        Some(expected) => format!(
            "{}.should({}, {});",
            locator,
            js_string(kind),
            js_string(expected)
        ),
        None => format!("{}.should({});", locator, js_string(kind)),
    };
    Ok(vec![Line::Bound(should)])
}

/// `<locator>.<action>;` followed by an optional settle delay
fn bound_action(
    step: &Step,
    selector: Option<&str>,
    action: &str,
    settle: Option<&str>,
) -> Result<Vec<Line>, StepError> {
    let mut lines = vec![Line::Bound(format!("{}.{};", locate(step, selector)?, action))];
    lines.extend(settle.map(Line::global));
    Ok(lines)
}

// =============================================================================
// Helpers
// =============================================================================

fn locate(step: &Step, selector: Option<&str>) -> Result<String, StepError> {
    selector
        .map(locator_code)
        .ok_or_else(|| StepError::MissingSelector {
            step_type: step.step_type.to_string(),
        })
}

fn missing_field(step: &Step, field: &'static str) -> StepError {
    StepError::MissingField {
        step_type: step.step_type.to_string(),
        field,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Wrap each run of selector-bound lines in the frame scope
fn scope_to_frame(frame: Option<usize>, lines: Vec<Line>) -> Vec<String> {
    let Some(index) = frame else {
        return lines
            .into_iter()
            .map(|line| match line {
                Line::Bound(text) | Line::Global(text) => text,
            })
            .collect();
    };

    let mut out = Vec::new();
    let mut bound = Vec::new();
    for line in lines {
        match line {
            Line::Bound(text) => bound.push(text),
            Line::Global(text) => {
                if !bound.is_empty() {
                    out.extend(wrap_in_frame(index, std::mem::take(&mut bound)));
                }
                out.push(text);
            }
        }
    }
    if !bound.is_empty() {
        out.extend(wrap_in_frame(index, bound));
    }
    out
}
