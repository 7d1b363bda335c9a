//! Running page header and the comments attached to a document.
//!
//! The header describes the entity that owns the document (an issue) and is
//! repainted at the top of every page. Both inputs are plain JSON files:
//!
//! ```json
//! {"identifier": "WEB-12", "title": "Checkout fails",
//!  "status": {"name": "In progress", "color": "#f59e0bff"},
//!  "priority": "high", "assignees": ["Ana"]}
//! ```
//!
//! Comments are an array of `{"author", "created", "body"}` where `body` is a
//! wire document.

use super::fonts::FaceSlot;
use super::layout::{DrawOp, LayoutContext, MUTED_COLOR, RULE_COLOR, TEXT_COLOR};
use crate::error::DecodeError;
use crate::formats::json;
use crate::model::{Color, Document};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentHeader {
    pub identifier: String,
    pub title: String,
    pub author: Option<String>,
    pub status: Option<StatusBadge>,
    pub priority: Option<Priority>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub due: Option<String>,
    pub assignees: Vec<String>,
    pub watchers: Vec<String>,
}

impl DocumentHeader {
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusBadge {
    pub name: String,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    None,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::None => "No priority",
        }
    }

    /// Filled bars in the four-bar priority icon.
    pub fn bars(&self) -> usize {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::None => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub author: String,
    pub created: Option<String>,
    pub body: Document,
}

#[derive(Deserialize)]
struct WireComment {
    #[serde(default)]
    author: String,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    body: Value,
}

/// Reads a JSON array of comments. A comment whose body is not a document is
/// kept with an empty body.
pub fn comments_from_json(bytes: &[u8]) -> Result<Vec<Comment>, DecodeError> {
    let wire: Vec<WireComment> = serde_json::from_slice(bytes)?;
    Ok(wire
        .into_iter()
        .map(|comment| {
            let body = if comment.body.is_null() {
                Document::default()
            } else {
                json::decode_value(&comment.body).unwrap_or_else(|err| {
                    log::warn!("comment by '{}' has an unreadable body: {err}", comment.author);
                    Document::default()
                })
            };
            Comment {
                author: comment.author,
                created: comment.created,
                body,
            }
        })
        .collect())
}

const URGENT_COLOR: Color = Color::rgb(0xdc, 0x26, 0x26);
const LABEL_WIDTH: f32 = 64.0;

enum FieldValue<'h> {
    Plain(String),
    Status(&'h StatusBadge),
    Priority(Priority),
}

/// Paints the header band at the cursor and leaves the cursor below it.
pub fn paint_running_header(ctx: &mut LayoutContext, header: &DocumentHeader) {
    let body = ctx.body_size;
    let title_size = body * 1.3;
    let left = ctx.left;
    let width = ctx.available_width();

    let baseline = ctx.y + title_size;
    let mut x = left;
    if !header.identifier.is_empty() {
        let id = format!("{}  ", header.identifier);
        ctx.text(x, baseline, FaceSlot::Regular, title_size, MUTED_COLOR, &id);
        x += ctx.text_width(FaceSlot::Regular, &id, title_size);
    }
    let title = ctx.clip(FaceSlot::Bold, &header.title, title_size, left + width - x, true);
    ctx.text(x, baseline, FaceSlot::Bold, title_size, TEXT_COLOR, &title);
    ctx.y = baseline + title_size * 0.5;

    let fields = fields(header);
    let size = body * 0.85;
    let row_height = size * 1.6;
    let column_width = width / 2.0;
    for pair in fields.chunks(2) {
        let baseline = ctx.y + size;
        for (column, (label, value)) in pair.iter().enumerate() {
            let x = left + column as f32 * column_width;
            ctx.text(x, baseline, FaceSlot::Regular, size, MUTED_COLOR, label);
            let value_x = x + LABEL_WIDTH;
            let room = column_width - LABEL_WIDTH - 6.0;
            paint_value(ctx, value_x, baseline, size, room, value);
        }
        ctx.y += row_height;
    }

    ctx.y += 2.0;
    let y = ctx.y;
    ctx.push(DrawOp::Line {
        x1: left,
        y1: y,
        x2: left + width,
        y2: y,
        color: RULE_COLOR,
        width: 0.75,
    });
    ctx.y += body;
}

fn fields(header: &DocumentHeader) -> Vec<(&'static str, FieldValue<'_>)> {
    let mut fields = Vec::new();
    if let Some(author) = &header.author {
        fields.push(("Author", FieldValue::Plain(author.clone())));
    }
    if let Some(status) = &header.status {
        fields.push(("Status", FieldValue::Status(status)));
    }
    if let Some(priority) = header.priority {
        fields.push(("Priority", FieldValue::Priority(priority)));
    }
    let dates = [
        ("Created", &header.created),
        ("Updated", &header.updated),
        ("Due", &header.due),
    ];
    for (label, date) in dates {
        if let Some(date) = date {
            fields.push((label, FieldValue::Plain(date.clone())));
        }
    }
    if !header.assignees.is_empty() {
        fields.push(("Assignees", FieldValue::Plain(header.assignees.join(", "))));
    }
    if !header.watchers.is_empty() {
        fields.push(("Watchers", FieldValue::Plain(header.watchers.join(", "))));
    }
    fields
}

fn paint_value(ctx: &mut LayoutContext, x: f32, baseline: f32, size: f32, room: f32, value: &FieldValue) {
    let (text, offset) = match value {
        FieldValue::Plain(text) => (text.clone(), 0.0),
        FieldValue::Status(status) => {
            let r = size * 0.3;
            ctx.push(DrawOp::Circle {
                cx: x + r,
                cy: baseline - size * 0.35,
                r,
                color: status.color.unwrap_or(MUTED_COLOR),
            });
            (status.name.clone(), r * 2.0 + 4.0)
        }
        FieldValue::Priority(priority) => {
            paint_priority_bars(ctx, x, baseline, size, *priority);
            (priority.label().to_string(), size + 4.0)
        }
    };
    let text = ctx.clip(FaceSlot::Regular, &text, size, room - offset, true);
    ctx.text(x + offset, baseline, FaceSlot::Regular, size, TEXT_COLOR, &text);
}

/// Four ascending bars, the first `bars()` of them filled.
fn paint_priority_bars(ctx: &mut LayoutContext, x: f32, baseline: f32, size: f32, priority: Priority) {
    let bar_width = size * 0.16;
    let gap = size * 0.08;
    let filled = if priority == Priority::Urgent {
        URGENT_COLOR
    } else {
        TEXT_COLOR
    };
    for i in 0..4 {
        let h = size * 0.2 * (i + 1) as f32;
        ctx.push(DrawOp::FillRect {
            x: x + i as f32 * (bar_width + gap),
            y: baseline - h,
            w: bar_width,
            h,
            color: if i < priority.bars() { filled } else { RULE_COLOR },
        });
    }
}
