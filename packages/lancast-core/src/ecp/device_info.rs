//! Parsing for control-protocol response bodies.
//!
//! Device-info responses are a flat, non-nested listing of
//! `<tag>value</tag>` lines, so a single-level scan is all the structure
//! we extract - no general document model. App listings are matched by
//! identifier substring since the two firmware generations in the field
//! disagree on the exact body shape.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Parses a flat `<tag>value</tag>` body into a tag/value map.
///
/// Container elements (the document root, anything without direct text)
/// contribute nothing. Returns an empty map for bodies with no parseable
/// leaf text, which callers treat as a negative probe.
pub fn parse_device_info(body: &str) -> HashMap<String, String> {
    let mut reader = Reader::from_str(body);
    let mut buf = Vec::new();
    let mut map = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Text(ref t)) => {
                if let (Some(tag), Ok(text)) = (current.as_ref(), t.unescape()) {
                    let text = text.trim();
                    if !text.is_empty() {
                        map.insert(tag.clone(), text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("[ECP] Device-info parse stopped early: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    map
}

/// Picks a display name out of a device-info map.
///
/// Prefers the user-visible friendly name, then the model name; `None`
/// when neither is present (callers substitute the generic name).
pub fn device_name(info: &HashMap<String, String>) -> Option<String> {
    info.get("friendly-device-name")
        .or_else(|| info.get("user-device-name"))
        .or_else(|| info.get("model-name"))
        .cloned()
}

/// True when an app listing or active-app body names the given app id.
///
/// Matches both the attribute shape (`id="12345"`) and the quoted
/// key/value shape (`"id":"12345"`).
pub fn body_lists_app(body: &str, app_id: &str) -> bool {
    body.contains(&format!("id=\"{}\"", app_id))
        || body.contains(&format!("\"id\":\"{}\"", app_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_INFO_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<device-info>
    <udn>29380007-4a09-10af-80b5-ac3a7a6ae3b4</udn>
    <serial-number>X00400DE7XD4</serial-number>
    <model-name>Express 4K</model-name>
    <friendly-device-name>Bedroom TV</friendly-device-name>
    <network-type>wifi</network-type>
</device-info>
"#;

    #[test]
    fn parses_flat_tag_value_lines() {
        let info = parse_device_info(DEVICE_INFO_BODY);
        assert_eq!(info.get("serial-number").unwrap(), "X00400DE7XD4");
        assert_eq!(info.get("model-name").unwrap(), "Express 4K");
        assert_eq!(info.get("network-type").unwrap(), "wifi");
        // The container element carries no direct text
        assert!(!info.contains_key("device-info"));
    }

    #[test]
    fn empty_or_junk_body_yields_empty_map() {
        assert!(parse_device_info("").is_empty());
        assert!(parse_device_info("503 Service Unavailable").is_empty());
    }

    #[test]
    fn name_prefers_friendly_over_model() {
        let info = parse_device_info(DEVICE_INFO_BODY);
        assert_eq!(device_name(&info).unwrap(), "Bedroom TV");

        let mut model_only = info.clone();
        model_only.remove("friendly-device-name");
        assert_eq!(device_name(&model_only).unwrap(), "Express 4K");

        assert_eq!(device_name(&HashMap::new()), None);
    }

    #[test]
    fn app_listing_matches_both_body_shapes() {
        let xml = r#"<apps><app id="12345" version="1.0">Receiver</app></apps>"#;
        assert!(body_lists_app(xml, "12345"));
        assert!(!body_lists_app(xml, "99999"));

        let json_ish = r#"{"app":{"id":"12345","name":"Receiver"}}"#;
        assert!(body_lists_app(json_ish, "12345"));
        assert!(!body_lists_app(json_ish, "1234"));
    }
}
