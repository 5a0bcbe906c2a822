use std::path::Path;

use super::*;

const FULL: &str = r##"
selectors:
  - business_id: bright-smiles
    service_selector: ".services li"
    about_selector: ".about p"
    contact_selector:
      phone: ".contact .phone"
      email: "a[href^='mailto:']"
    faqs_selector:
      question: ".faq dt"
      answer: ".faq dd"
  - business_id: corner-clinic
    service_selector: "#treatments h3"
"##;

#[test]
fn parses_full_and_minimal_entries() {
    let file = parse_selectors(FULL).unwrap();
    assert_eq!(file.selectors.len(), 2);

    let full = file.find("bright-smiles").unwrap();
    assert_eq!(full.service_selector, ".services li");
    assert_eq!(full.about(), Some(".about p"));
    assert_eq!(full.phone(), Some(".contact .phone"));
    assert_eq!(full.email(), Some("a[href^='mailto:']"));
    assert_eq!(full.faqs_selector.pair(), Some((".faq dt", ".faq dd")));

    let minimal = file.find("corner-clinic").unwrap();
    assert!(minimal.about().is_none());
    assert!(minimal.phone().is_none());
    assert!(minimal.email().is_none());
    assert!(minimal.faqs_selector.pair().is_none());
}

#[test]
fn accepts_camel_case_keys() {
    let yaml = r#"
selectors:
  - businessId: b-7
    serviceSelector: ".svc"
    contactSelector:
      phone: ".tel"
    faqsSelector:
      question: ".q"
      answer: ".a"
"#;
    let file = parse_selectors(yaml).unwrap();
    let config = file.find("b-7").unwrap();
    assert_eq!(config.service_selector, ".svc");
    assert_eq!(config.phone(), Some(".tel"));
    assert_eq!(config.faqs_selector.pair(), Some((".q", ".a")));
}

#[test]
fn rejects_missing_service_selector() {
    let yaml = r#"
selectors:
  - business_id: no-services
    about_selector: ".about"
"#;
    let err = parse_selectors(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("no-services"));
    assert!(err.to_string().contains("service_selector"));
}

#[test]
fn rejects_blank_service_selector() {
    let yaml = r#"
selectors:
  - business_id: blank
    service_selector: "   "
"#;
    assert!(matches!(
        parse_selectors(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn rejects_duplicate_business_id() {
    let yaml = r#"
selectors:
  - business_id: dup
    service_selector: ".a"
  - business_id: dup
    service_selector: ".b"
"#;
    let err = parse_selectors(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate selector config"));
}

#[test]
fn rejects_empty_business_id() {
    let yaml = r#"
selectors:
  - business_id: ""
    service_selector: ".a"
"#;
    let err = parse_selectors(yaml).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn padded_business_id_is_trimmed_and_findable() {
    let yaml = r#"
selectors:
  - business_id: "  bright-smiles "
    service_selector: ".a"
"#;
    let file = parse_selectors(yaml).unwrap();
    assert_eq!(file.selectors[0].business_id, "bright-smiles");
    assert!(file.find("bright-smiles").is_some());
    assert!(file.find(" bright-smiles").is_some());
}

#[test]
fn padded_duplicate_business_id_is_rejected() {
    let yaml = r#"
selectors:
  - business_id: bright-smiles
    service_selector: ".a"
  - business_id: " bright-smiles"
    service_selector: ".b"
"#;
    let err = parse_selectors(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn faq_pair_requires_both_selectors() {
    let only_question = FaqSelector {
        question: Some(".q".to_string()),
        answer: None,
    };
    assert!(only_question.pair().is_none());

    let blank_answer = FaqSelector {
        question: Some(".q".to_string()),
        answer: Some(String::new()),
    };
    assert!(blank_answer.pair().is_none());
}

#[test]
fn unknown_business_is_not_found() {
    let file = parse_selectors(FULL).unwrap();
    assert!(file.find("missing").is_none());
    assert_eq!(
        file.business_ids().collect::<Vec<_>>(),
        vec!["bright-smiles", "corner-clinic"]
    );
}

#[test]
fn load_selectors_reports_missing_file() {
    let err = load_selectors(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::SelectorsFileIo { .. }));
}

#[test]
fn load_selectors_from_sample_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("selectors.yaml");
    assert!(
        path.exists(),
        "selectors.yaml missing at {path:?}; required for this test"
    );
    let result = load_selectors(&path);
    assert!(result.is_ok(), "failed to load selectors.yaml: {result:?}");
    assert!(!result.unwrap().selectors.is_empty());
}
