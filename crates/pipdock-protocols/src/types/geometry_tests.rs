use super::*;

#[test]
fn test_rect_edges_and_center() {
    let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert_eq!(rect.right(), 110.0);
    assert_eq!(rect.bottom(), 70.0);
    assert_eq!(rect.center_x(), 60.0);
    assert_eq!(rect.center_y(), 45.0);
}

#[test]
fn test_rect_outside_viewport() {
    let viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };
    assert!(Rect::new(2000.0, 0.0, 800.0, 600.0).is_outside(&viewport));
    assert!(Rect::new(0.0, -700.0, 800.0, 600.0).is_outside(&viewport));
    assert!(!Rect::new(-100.0, -100.0, 800.0, 600.0).is_outside(&viewport));
    assert!(!Rect::new(440.0, 210.0, 400.0, 300.0).is_outside(&viewport));
}

#[test]
fn test_position_preset_parse() {
    assert_eq!("top-left".parse::<PositionPreset>(), Ok(PositionPreset::TopLeft));
    assert_eq!(" bottom-left ".parse::<PositionPreset>(), Ok(PositionPreset::BottomLeft));
    assert!("middle".parse::<PositionPreset>().is_err());
}

#[test]
fn test_position_preset_parse_or_default() {
    assert_eq!(PositionPreset::parse_or_default(None), PositionPreset::BottomRight);
    assert_eq!(PositionPreset::parse_or_default(Some("center")), PositionPreset::BottomRight);
    assert_eq!(PositionPreset::parse_or_default(Some("top-right")), PositionPreset::TopRight);
}

#[test]
fn test_position_preset_sides() {
    assert!(PositionPreset::TopLeft.is_left());
    assert!(PositionPreset::TopLeft.is_top());
    assert!(!PositionPreset::BottomRight.is_left());
    assert!(!PositionPreset::BottomRight.is_top());
}

#[test]
fn test_position_preset_serde() {
    let json = serde_json::to_string(&PositionPreset::BottomLeft).unwrap();
    assert_eq!(json, "\"bottom-left\"");
    let preset: PositionPreset = serde_json::from_str("\"top-right\"").unwrap();
    assert_eq!(preset, PositionPreset::TopRight);
}

#[test]
fn test_work_area_edges() {
    let area = WorkArea {
        left: 0,
        top: 25,
        width: 1920,
        height: 1055,
    };
    assert_eq!(area.right(), 1920);
    assert_eq!(area.bottom(), 1080);
}
