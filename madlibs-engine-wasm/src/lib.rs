//! WASM bindings for madlibs-engine, called by the browser editor and reader.
//!
//! Everything crosses the boundary as JSON strings in the stored record shape
//! (`{"id", "type": "text", "textContent"}` and so on).

use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use madlibs_engine::builtin_templates::builtin_templates;
use madlibs_engine::core::brackets;
use madlibs_engine::core::ids::SeededIds;
use madlibs_engine::core::render::{self, DisplayToken};
use madlibs_engine::schema::content::ContentItem;
use madlibs_engine::schema::story::BlankValues;
use madlibs_engine::schema::template::Template;

thread_local! {
    static IDS: RefCell<SeededIds> = RefCell::new(SeededIds::from_entropy());
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct TokenOut<'a> {
    kind: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<&'a str>,
}

#[derive(serde::Serialize)]
struct MissingBlankOut<'a> {
    id: &'a str,
    part_of_speech: &'a str,
    hint: Option<&'a str>,
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_previous(previous_json: &str) -> Result<Vec<ContentItem>, JsValue> {
    if previous_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(previous_json).map_err(to_js)
}

fn parse_values(values_json: &str) -> Result<BlankValues, JsValue> {
    if values_json.trim().is_empty() {
        return Ok(BlankValues::default());
    }
    serde_json::from_str(values_json).map_err(to_js)
}

// ---------------------------------------------------------------------------
// Exported API
// ---------------------------------------------------------------------------

/// Parse edited sentence text against the sentence's previous content (a
/// JSON array, or an empty string). Returns the new content as JSON.
#[wasm_bindgen]
pub fn parse_sentence(text: &str, previous_json: &str) -> Result<String, JsValue> {
    let previous = parse_previous(previous_json)?;
    let content = IDS.with(|ids| brackets::parse(text, &previous, &mut *ids.borrow_mut()));
    serde_json::to_string(&content).map_err(to_js)
}

/// Editable bracket text for a content list given as JSON.
#[wasm_bindgen]
pub fn serialize_sentence(content_json: &str) -> Result<String, JsValue> {
    let content: Vec<ContentItem> = serde_json::from_str(content_json).map_err(to_js)?;
    Ok(brackets::serialize(&content))
}

/// Plain text of a template filled with `values` (a JSON object of blank id
/// to word). Missing words show as `[missing]`.
#[wasm_bindgen]
pub fn render_plain(template_json: &str, values_json: &str) -> Result<String, JsValue> {
    let template: Template = serde_json::from_str(template_json).map_err(to_js)?;
    let values = parse_values(values_json)?;
    Ok(render::plain_text(&render::render(&template, &values)))
}

/// Rendered tokens, one array per sentence, for markup on the JS side.
#[wasm_bindgen]
pub fn render_tokens(template_json: &str, values_json: &str) -> Result<String, JsValue> {
    let template: Template = serde_json::from_str(template_json).map_err(to_js)?;
    let values = parse_values(values_json)?;
    let rendered = render::render(&template, &values);
    let out: Vec<Vec<TokenOut<'_>>> = rendered
        .iter()
        .map(|sentence| {
            sentence
                .iter()
                .map(|token| match token {
                    DisplayToken::Text(text) => TokenOut {
                        kind: "text",
                        text,
                        item_id: None,
                    },
                    DisplayToken::Filled { item_id, value } => TokenOut {
                        kind: "filled",
                        text: value,
                        item_id: Some(item_id.as_str()),
                    },
                    DisplayToken::Missing { item_id } => TokenOut {
                        kind: "missing",
                        text: token.as_str(),
                        item_id: Some(item_id.as_str()),
                    },
                })
                .collect()
        })
        .collect();
    serde_json::to_string(&out).map_err(to_js)
}

/// Blanks that still need a word, in document order, as JSON.
#[wasm_bindgen]
pub fn missing_blanks(template_json: &str, values_json: &str) -> Result<String, JsValue> {
    let template: Template = serde_json::from_str(template_json).map_err(to_js)?;
    let values = parse_values(values_json)?;
    let missing: Vec<MissingBlankOut<'_>> = render::find_missing_blanks(&template, &values)
        .into_iter()
        .map(|item| MissingBlankOut {
            id: item.id.as_str(),
            part_of_speech: &item.blank.part_of_speech,
            hint: item.blank.hint.as_deref(),
        })
        .collect();
    serde_json::to_string(&missing).map_err(to_js)
}

/// The templates bundled with the engine, as a JSON array.
#[wasm_bindgen]
pub fn bundled_templates() -> Result<String, JsValue> {
    serde_json::to_string(&builtin_templates()).map_err(to_js)
}
