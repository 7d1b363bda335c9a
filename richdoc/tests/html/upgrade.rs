use pretty_assertions::assert_eq;
use richdoc::formats::html::parse_html;
use richdoc::formats::json;
use richdoc::{upgrade_html_to_json, DecodeError, FormatError};

const RECORD: &str = r#"
<p>Steps to <u>reproduce</u>:</p>
<ol><li><p>Open the <a href="/settings">settings</a></p></li><li><p>Click <span style="color: rgb(220, 38, 38)">Save</span></p></li></ol>
<p><img src="https://cdn.example.com/shot.png" style="width: 320px"></p>
<table>
  <tr><th>Build</th><th>Result</th></tr>
  <tr><td>142</td><td><mark>flaky</mark></td></tr>
</table>
<div data-info-block data-title="Workaround" data-color="rgb(37, 99, 235)"><p>Restart twice.</p></div>
"#;

#[test]
fn test_upgrade_is_lossless_for_imported_content() {
    let imported = parse_html(RECORD).unwrap();
    let upgraded = upgrade_html_to_json(RECORD).unwrap();
    let decoded = json::decode(&upgraded).unwrap();

    assert_eq!(decoded, imported);
}

#[test]
fn test_upgraded_json_shape() {
    let upgraded = upgrade_html_to_json(RECORD).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&upgraded).unwrap();

    let types: Vec<&str> = value["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec!["paragraph", "orderedList", "paragraph", "table", "info-block"]
    );
    assert_eq!(value["content"][2]["content"][0]["type"], "image");
    assert_eq!(value["content"][2]["content"][0]["attrs"]["width"], 320);
    assert_eq!(value["content"][4]["attrs"]["color"], "#2563ebff");
}

#[test]
fn test_upgrade_rejects_nul_bytes() {
    let err = upgrade_html_to_json("<p>bad\0input</p>").unwrap_err();
    assert!(matches!(err, FormatError::Decode(DecodeError::Html(_))));
}

#[test]
fn test_upgrade_of_empty_record() {
    let upgraded = upgrade_html_to_json("").unwrap();
    let value: serde_json::Value = serde_json::from_slice(&upgraded).unwrap();
    assert_eq!(value, serde_json::json!({"type": "doc"}));
}
