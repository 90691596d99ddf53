use super::*;
use crate::error::HostError;

#[test]
fn test_open_detached_deserialize() {
    let json = r#"{
        "type": "OpenDetached",
        "url": "https://www.youtube.com/watch?v=abc",
        "width": 800,
        "height": 450,
        "position": "top-left",
        "volume": 0.6
    }"#;
    let request: ControllerRequest = serde_json::from_str(json).unwrap();
    let ControllerRequest::OpenDetached(open) = request else {
        panic!("expected OpenDetached");
    };
    assert_eq!(open.url.as_deref(), Some("https://www.youtube.com/watch?v=abc"));
    assert_eq!(open.width, Some(800.0));
    assert_eq!(open.height, Some(450.0));
    assert_eq!(open.position.as_deref(), Some("top-left"));
    assert_eq!(open.volume, Some(0.6));
    assert_eq!(open.platform_hint, None);
}

#[test]
fn test_open_generic_accepts_platform_alias() {
    let json = r#"{"type": "OpenGenericDetached", "url": "https://vimeo.com/1", "platform": "vimeo"}"#;
    let request: ControllerRequest = serde_json::from_str(json).unwrap();
    let ControllerRequest::OpenGenericDetached(open) = request else {
        panic!("expected OpenGenericDetached");
    };
    assert_eq!(open.platform_hint, Some(Platform::Vimeo));
    assert_eq!(open.width, None);
}

#[test]
fn test_non_numeric_dimensions_become_none() {
    let json = r#"{"type": "OpenDetached", "url": "https://a.b/", "width": "wide", "height": null, "volume": [1]}"#;
    let request: ControllerRequest = serde_json::from_str(json).unwrap();
    let ControllerRequest::OpenDetached(open) = request else {
        panic!("expected OpenDetached");
    };
    assert_eq!(open.width, None);
    assert_eq!(open.height, None);
    assert_eq!(open.volume, None);
}

#[test]
fn test_numeric_strings_are_accepted() {
    let json = r#"{"type": "OpenDetached", "url": "https://a.b/", "width": " 720 "}"#;
    let request: ControllerRequest = serde_json::from_str(json).unwrap();
    let ControllerRequest::OpenDetached(open) = request else {
        panic!("expected OpenDetached");
    };
    assert_eq!(open.width, Some(720.0));
}

#[test]
fn test_unit_requests_deserialize() {
    let close: ControllerRequest = serde_json::from_str(r#"{"type": "CloseDetached"}"#).unwrap();
    assert_eq!(close, ControllerRequest::CloseDetached);
    let minimize: ControllerRequest = serde_json::from_str(r#"{"type": "MinimizeDetached"}"#).unwrap();
    assert_eq!(minimize.kind(), "MinimizeDetached");
}

#[test]
fn test_record_history_deserialize() {
    let json = r#"{"type": "RecordHistory", "url": "https://a.b/v", "videoUrl": "https://cdn/v.mp4", "title": "Clip"}"#;
    let request: ControllerRequest = serde_json::from_str(json).unwrap();
    let ControllerRequest::RecordHistory(history) = request else {
        panic!("expected RecordHistory");
    };
    assert_eq!(history.video_url.as_deref(), Some("https://cdn/v.mp4"));
    assert_eq!(history.title.as_deref(), Some("Clip"));
    assert_eq!(history.thumbnail, None);
}

#[test]
fn test_unknown_type_is_rejected() {
    let result: Result<ControllerRequest, _> = serde_json::from_str(r#"{"type": "Explode"}"#);
    assert!(result.is_err());
}

#[test]
fn test_reply_shape() {
    assert_eq!(serde_json::to_string(&Reply::ok()).unwrap(), r#"{"ok":true}"#);
    assert_eq!(
        serde_json::to_string(&Reply::error("nope")).unwrap(),
        r#"{"ok":false,"error":"nope"}"#
    );
}

#[test]
fn test_reply_from_result() {
    let ok: Result<(), PipdockError> = Ok(());
    assert_eq!(Reply::from(ok), Reply::ok());

    let err: Result<(), HostError> = Err(HostError::Operation("denied".to_string()));
    let reply = Reply::from(err);
    assert!(!reply.ok);
    assert!(reply.error.unwrap().contains("denied"));
}
