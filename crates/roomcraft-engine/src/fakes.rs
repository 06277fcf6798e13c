//! Scripted stand-ins for the hosted model, shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use roomcraft_contracts::{DesignError, DesignResult};
use serde_json::{json, Value};

use crate::agents::{AgentProfile, TaskRunner, TaskSpec};
use crate::client::ModelBackend;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub model: String,
    pub payload: Value,
}

/// Replays queued replies in order; an exhausted queue is a service error.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<DesignResult<Value>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, value: Value) {
        self.replies.borrow_mut().push_back(Ok(value));
    }

    pub fn push_text(&self, text: &str) {
        self.push_json(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        }));
    }

    pub fn push_image(&self, png: &[u8]) {
        self.push_json(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(png)}}
            ]}}]
        }));
    }

    pub fn push_error(&self, err: DesignError) {
        self.replies.borrow_mut().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    fn reply(&self, method: &'static str, model: &str, payload: &Value) -> DesignResult<Value> {
        self.calls.borrow_mut().push(RecordedCall {
            method,
            model: model.to_string(),
            payload: payload.clone(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(DesignError::service("scripted", "no scripted reply left")))
    }
}

impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate_content(&self, model: &str, payload: &Value) -> DesignResult<Value> {
        self.reply("generateContent", model, payload)
    }

    fn predict(&self, model: &str, payload: &Value) -> DesignResult<Value> {
        self.reply("predict", model, payload)
    }
}

#[derive(Default)]
pub struct ScriptedRunner {
    replies: RefCell<VecDeque<DesignResult<String>>>,
    tasks: RefCell<Vec<(String, String)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: &str) {
        self.replies.borrow_mut().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, err: DesignError) {
        self.replies.borrow_mut().push_back(Err(err));
    }

    /// `(role, task description)` pairs in call order.
    pub fn tasks(&self) -> Vec<(String, String)> {
        self.tasks.borrow().clone()
    }
}

impl TaskRunner for ScriptedRunner {
    fn run_task(&self, agent: &AgentProfile, task: &TaskSpec) -> DesignResult<String> {
        self.tasks
            .borrow_mut()
            .push((agent.role.to_string(), task.description.clone()));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(DesignError::service("scripted", "no scripted task reply left")))
    }
}

pub fn test_png_bytes(width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn write_test_png(path: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    std::fs::write(path, test_png_bytes(width, height)?)?;
    Ok(())
}

pub fn analysis_json() -> Value {
    json!({
        "room_type": "office",
        "current_style": "eclectic",
        "features": ["large window", "hardwood floor"],
        "furniture": ["desk", "office chair"],
        "colors": ["white", "grey"],
        "lighting": "natural",
        "dimensions_estimate": "small <100sqft",
        "condition": "needs_refresh",
        "challenges": ["cable clutter"],
        "opportunities": ["wall shelving"]
    })
}
