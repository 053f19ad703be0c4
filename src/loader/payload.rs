use serde_json::Value as JsonValue;

use crate::dom::DocumentTree;

/// `type` of the script element carrying a container's serialized state.
pub const STATE_SCRIPT_TYPE: &str = "qwik/json";

/// Undo the `<script` escaping the serializer applies so the payload can sit
/// inside a script element.
pub fn unescape_script_text(text: &str) -> String {
    text.replace("\\x3C/script", "</script")
        .replace("\\x3Cscript", "<script")
}

pub fn parse_state(text: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(&unescape_script_text(text))
}

/// Locate the state script of `container`.
///
/// The root container keeps its state at the end of `<body>`; any other
/// container keeps it among its own trailing children.
pub fn find_state_script<D: DocumentTree>(doc: &D, container: &D::Node) -> Option<D::Node> {
    let parent = match doc.document_element() {
        Some(root) if &root == container => doc.body()?,
        _ => container.clone(),
    };

    let mut candidate = doc.last_element_child(&parent);
    while let Some(script) = candidate {
        if doc.tag_name(&script).as_deref() == Some("script")
            && doc.get_attribute(&script, "type").as_deref() == Some(STATE_SCRIPT_TYPE)
        {
            return Some(script);
        }
        candidate = doc.previous_element_sibling(&script);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;
    use serde_json::json;
    use url::Url;

    #[test]
    fn unescapes_embedded_script_tags() {
        let text = r#"{"html":"\x3Cscript>a()\x3C/script>"}"#;
        assert_eq!(
            unescape_script_text(text),
            r#"{"html":"<script>a()</script>"}"#
        );
        assert_eq!(
            parse_state(text).unwrap(),
            json!({"html": "<script>a()</script>"})
        );
    }

    #[test]
    fn leaves_other_escapes_alone() {
        assert_eq!(unescape_script_text(r"\x3Cdiv"), r"\x3Cdiv");
    }

    #[test]
    fn root_container_state_lives_in_body() {
        let doc = HtmlDocument::parse(
            r#"<html q:container><body><p></p>
               <script type="qwik/json">{"a":1}</script>
               <script>other()</script></body></html>"#,
            Url::parse("http://localhost/").unwrap(),
        );
        let root = doc.document_element().unwrap();
        let script = find_state_script(&doc, &root).unwrap();
        assert_eq!(parse_state(&doc.text_content(&script)).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn nested_container_uses_own_children() {
        let doc = HtmlDocument::parse(
            r#"<body><script type="qwik/json">{"outer":true}</script>
               <div id="c" q:container><span></span></div></body>"#,
            Url::parse("http://localhost/").unwrap(),
        );
        let container = doc.get_element_by_id("c").unwrap();
        assert!(find_state_script(&doc, &container).is_none());
    }
}
