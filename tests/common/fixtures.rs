use serde_json::{json, Value};

/// A scene holding `items`.
pub fn scene(items: Vec<Value>) -> Value {
    json!({ "items": items })
}

pub fn rect(width: f32, height: f32) -> Value {
    json!({ "type": "rect", "width": width, "height": height })
}

pub fn text(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}

pub fn clock(precision: usize) -> Value {
    json!({ "type": "clock", "precision": precision })
}

pub fn translate(x: f32, y: f32) -> Value {
    json!({ "type": "attribute", "attr": "translate", "x": x, "y": y })
}

pub fn image(uri: &str, width: f32, height: f32) -> Value {
    json!({ "type": "image", "uri": uri, "width": width, "height": height })
}

pub fn page_break() -> Value {
    json!({ "type": "break", "order": "page" })
}

/// A page of the given size without margins.
pub fn page(width: f32, height: f32, items: Vec<Value>) -> Value {
    json!({
        "type": "page",
        "size": { "width": width, "height": height },
        "margins": 0,
        "items": items
    })
}

/// A layout rebuilt every `period` seconds.
pub fn timed_layout(period: f64, items: Vec<Value>) -> Value {
    json!({ "type": "layout", "refresh_every": period, "items": items })
}

/// A layout rebuilt whenever one of `events` arrives.
pub fn event_layout(events: &[u32], items: Vec<Value>) -> Value {
    json!({ "type": "layout", "refresh_on": events, "items": items })
}

pub fn flow(name: &str, items: Vec<Value>) -> Value {
    json!({ "type": "flow", "name": name, "items": items })
}

pub fn anchor(flow: &str) -> Value {
    json!({ "type": "anchor", "flow": flow })
}
