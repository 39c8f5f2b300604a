use super::*;

#[test]
fn catalog_order_matches_ids() {
    for (i, tpl) in catalog().iter().enumerate() {
        assert_eq!(tpl.id as usize, i, "{} is out of order", tpl.name);
        assert!(std::ptr::eq(tpl.id.template(), tpl));
    }
}

#[test]
fn ids_round_trip_through_parse() {
    for tpl in catalog() {
        assert_eq!(TemplateId::parse(tpl.id.as_str()), Some(tpl.id));
    }
    assert_eq!(TemplateId::parse("baroque"), None);
}

#[test]
fn ids_serialize_kebab_case() {
    let json = serde_json::to_string(&TemplateId::SalesProfessional).unwrap();
    assert_eq!(json, r#""sales-professional""#);
}

#[test]
fn catalog_json_hides_layout_parameters() {
    let json = serde_json::to_value(TemplateId::Minimal.template()).unwrap();
    assert_eq!(json["id"], "minimal");
    assert_eq!(json["name"], "Minimal");
    assert_eq!(json["supportsAnimation"], false);
    assert!(json.get("arrangement").is_none());
    assert!(json.get("headshotPx").is_none());
}

#[test]
fn default_template_is_minimal() {
    assert_eq!(TemplateId::default(), TemplateId::Minimal);
}
