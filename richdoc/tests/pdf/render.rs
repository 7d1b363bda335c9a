use image::{ImageFormat, Rgba, RgbaImage};
use richdoc::error::ImageFetchError;
use richdoc::format::{Format, SerializedDocument};
use richdoc::formats::json;
use richdoc::formats::pdf::{
    render, render_to_vec, ImageFetcher, ImageSource, PdfFormat, RenderContext,
};
use richdoc::model::{Block, Document, Paragraph};
use serde_json::json;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

/// Serves one PNG for every `https://cdn.example.com/` source.
struct CdnFetcher {
    png: Vec<u8>,
    calls: AtomicUsize,
}

impl CdnFetcher {
    fn new() -> Self {
        let img = RgbaImage::from_pixel(40, 20, Rgba([37, 99, 235, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        Self {
            png: out.into_inner(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ImageFetcher for CdnFetcher {
    fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, ImageFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match source {
            ImageSource::Remote(url) if url.host_str() == Some("cdn.example.com") => {
                Ok(self.png.clone())
            }
            other => Err(ImageFetchError::InvalidSource(format!("{other:?}"))),
        }
    }
}

fn issue_description() -> Document {
    json::decode_value(&json!({
        "type": "doc",
        "content": [
            {"type": "paragraph", "content": [
                {"type": "text", "text": "Login fails after "},
                {"type": "text", "text": "password reset", "marks": [{"type": "bold"}]},
                {"type": "text", "text": ", see "},
                {"type": "text", "text": "the log", "marks": [{"type": "link", "attrs": {"href": "/logs/1"}}]}
            ]},
            {"type": "image", "attrs": {"src": "https://cdn.example.com/shot.png", "width": 200}},
            {"type": "image", "attrs": {"src": "https://cdn.example.com/shot.png"}},
            {"type": "image", "attrs": {"src": "https://elsewhere.example.com/missing.png"}},
            {"type": "taskList", "content": [
                {"type": "taskItem", "attrs": {"checked": true}, "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Reproduce"}]}
                ]}
            ]},
            {"type": "codeBlock", "content": [{"type": "text", "text": "POST /reset\n\tstatus=500"}]},
            {"type": "table", "content": [
                {"type": "tableRow", "content": [
                    {"type": "tableHeader", "attrs": {"colspan": 2, "rowspan": 1},
                     "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Env"}]}]}
                ]},
                {"type": "tableRow", "content": [
                    {"type": "tableCell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "prod"}]}]},
                    {"type": "tableCell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "broken"}]}]}
                ]}
            ]},
            {"type": "spoiler", "attrs": {"title": "Stack trace", "collapsed": true}, "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "at reset()"}]}
            ]},
            {"type": "kanban", "attrs": {}}
        ]
    }))
    .unwrap()
}

fn context_with(fetcher: Arc<CdnFetcher>) -> RenderContext {
    RenderContext::new().with_fetcher(fetcher)
}

#[test]
fn test_render_issue_description() {
    let fetcher = Arc::new(CdnFetcher::new());
    let ctx = context_with(fetcher.clone());

    let mut out = Vec::new();
    let summary = render(&issue_description(), &ctx, &mut out).unwrap();

    assert!(out.starts_with(b"%PDF-"));
    assert_eq!(summary.bytes, out.len());
    assert_eq!(summary.pages, 1);
    // One decoded image shared by both references; the foreign host fails.
    assert_eq!(summary.images, 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_long_documents_paginate() {
    let blocks: Vec<Block> = (0..300)
        .map(|i| Block::Paragraph(Paragraph::from_text(format!("Paragraph number {i}"))))
        .collect();
    let doc = Document::new(blocks);
    let ctx = context_with(Arc::new(CdnFetcher::new()));

    let mut first = Vec::new();
    let summary = render(&doc, &ctx, &mut first).unwrap();
    assert!(summary.pages > 3);

    let mut second = Vec::new();
    let again = render(&doc, &ctx, &mut second).unwrap();
    assert_eq!(again, summary);
    assert_eq!(first, second);
}

#[test]
fn test_format_options_add_header_and_comments() {
    let dir = tempdir().unwrap();
    let header = dir.path().join("header.json");
    let comments = dir.path().join("comments.json");
    std::fs::write(
        &header,
        serde_json::to_vec(&json!({
            "identifier": "WEB-12",
            "title": "Login fails",
            "author": "Ana",
            "status": {"name": "In Progress", "color": "#f59e0b"},
            "priority": "urgent",
            "assignees": ["Ana", "Ben"]
        }))
        .unwrap(),
    )
    .unwrap();
    std::fs::write(
        &comments,
        serde_json::to_vec(&json!([
            {"author": "Ben", "created": "2024-05-02", "body": {"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Confirmed on staging."}]}
            ]}}
        ]))
        .unwrap(),
    )
    .unwrap();

    let format = PdfFormat::with_context(context_with(Arc::new(CdnFetcher::new())));
    let mut options = HashMap::new();
    options.insert("header".to_string(), header.display().to_string());
    options.insert("comments".to_string(), comments.display().to_string());
    options.insert("base-url".to_string(), "https://tracker.example.com/".to_string());

    let bytes = match format
        .serialize_with_options(&issue_description(), &options)
        .unwrap()
    {
        SerializedDocument::Binary(bytes) => bytes,
        SerializedDocument::Text(_) => panic!("expected binary output"),
    };

    let raw = String::from_utf8_lossy(&bytes);
    assert!(raw.contains("(Login fails)"));
    assert!(raw.contains("(Description)"));
    assert!(raw.contains("(Comments)"));
    assert!(raw.contains("(https://tracker.example.com/logs/1)"));
}

#[test]
fn test_missing_option_file_is_reported() {
    let format = PdfFormat::new();
    let mut options = HashMap::new();
    options.insert("header".to_string(), "/nonexistent/header.json".to_string());

    let result = format.serialize_with_options(&Document::default(), &options);
    assert!(matches!(
        result,
        Err(richdoc::FormatError::InvalidOption(_))
    ));
}

#[test]
fn test_render_to_vec_of_empty_document() {
    let ctx = context_with(Arc::new(CdnFetcher::new()));
    let bytes = render_to_vec(&Document::default(), &ctx).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}
