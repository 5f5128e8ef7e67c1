use super::*;

#[test]
fn validate_key_accepts_simple_lowercase() {
    assert_eq!(validate_key("app.tick.period").unwrap(), "app.tick.period");
}

#[test]
fn validate_key_trims_whitespace() {
    assert_eq!(validate_key("  foo.bar  ").unwrap(), "foo.bar");
}

#[test]
fn validate_key_rejects_uppercase() {
    assert!(validate_key("Foo.bar").is_err());
}

#[test]
fn validate_key_rejects_leading_digit() {
    assert!(validate_key("1abc").is_err());
}

#[test]
fn validate_key_rejects_trailing_punctuation() {
    assert!(validate_key("foo.bar-").is_err());
}

#[test]
fn validate_key_rejects_empty() {
    assert!(validate_key("").is_err());
    assert!(validate_key("   ").is_err());
}

#[test]
fn validate_key_single_char_must_be_lowercase_letter() {
    assert!(validate_key("a").is_ok());
    assert!(validate_key("5").is_err());
}

#[test]
fn parse_bool_and_int_and_float() {
    assert_eq!(Variable::parse("bool", "true").unwrap(), Variable::Bool(true));
    assert_eq!(Variable::parse("int", "-7").unwrap(), Variable::Int(-7));
    assert_eq!(Variable::parse("uint", "7").unwrap(), Variable::Uint(7));
    assert_eq!(Variable::parse("float", "1.5").unwrap(), Variable::Float(1.5));
}

#[test]
fn parse_duration_kind_delegates_to_duration_fmt() {
    let v = Variable::parse("duration", "30s").unwrap();
    assert_eq!(v.as_duration().unwrap(), Duration::from_secs(30));
}

#[test]
fn parse_unknown_kind_errors() {
    let err = Variable::parse("complex128", "1+2i").unwrap_err();
    assert!(matches!(err, VariableError::UnknownKind { .. }));
}

#[test]
fn parse_invalid_input_errors() {
    let err = Variable::parse("int", "not-a-number").unwrap_err();
    assert!(matches!(err, VariableError::ParseFailed { .. }));
}

#[test]
fn new_value_builds_from_rust_scalars() {
    assert_eq!(Variable::new_value(true), Variable::Bool(true));
    assert_eq!(Variable::new_value(3i64), Variable::Int(3));
    assert_eq!(Variable::new_value("hi"), Variable::String("hi".to_string()));
}

#[test]
fn default_variable_is_none_and_zero_valued() {
    let v = Variable::default();
    assert!(v.is_none());
    assert_eq!(v.kind(), "none");
}

#[test]
fn map_store_and_load_roundtrip() {
    let map = VariableMap::new();
    map.store("app.name", Variable::from("oddjobs")).unwrap();
    assert_eq!(map.load("app.name").as_str(), Some("oddjobs"));
}

#[test]
fn map_load_missing_key_returns_zero_variable() {
    let map = VariableMap::new();
    assert!(map.load("does.not.exist").is_none());
}

#[test]
fn map_store_rejects_invalid_key() {
    let map = VariableMap::new();
    assert!(map.store("Bad Key", Variable::Bool(true)).is_err());
}

#[test]
fn map_load_and_delete_removes_entry() {
    let map = VariableMap::new();
    map.store("a.b", Variable::Int(1)).unwrap();
    assert_eq!(map.load_and_delete("a.b"), Variable::Int(1));
    assert!(map.load("a.b").is_none());
    assert_eq!(map.load_and_delete("a.b"), Variable::None);
}

#[test]
fn map_len_and_is_empty() {
    let map = VariableMap::new();
    assert!(map.is_empty());
    map.store("a", Variable::Int(1)).unwrap();
    map.store("b", Variable::Int(2)).unwrap();
    assert_eq!(map.len(), 2);
    assert!(!map.is_empty());
}

#[test]
fn map_range_visits_all_entries() {
    let map = VariableMap::new();
    map.store("a", Variable::Int(1)).unwrap();
    map.store("b", Variable::Int(2)).unwrap();
    let mut seen = 0;
    map.range(|_, _| {
        seen += 1;
        true
    });
    assert_eq!(seen, 2);
}

#[test]
fn map_range_can_stop_early() {
    let map = VariableMap::new();
    map.store("a", Variable::Int(1)).unwrap();
    map.store("b", Variable::Int(2)).unwrap();
    let mut seen = 0;
    map.range(|_, _| {
        seen += 1;
        false
    });
    assert_eq!(seen, 1);
}

#[test]
fn named_variable_new_rejects_invalid_name() {
    assert!(NamedVariable::new("Bad Key", Variable::Bool(true), false).is_err());
}

#[test]
fn named_variable_set_updates_when_not_readonly() {
    let var = NamedVariable::new("app.name", Variable::from("oddjobs"), false).unwrap();
    assert!(!var.is_readonly());
    var.set(Variable::from("renamed")).unwrap();
    assert_eq!(var.get().as_str(), Some("renamed"));
}

#[test]
fn named_variable_set_rejects_when_readonly() {
    let var = NamedVariable::new("app.name", Variable::from("oddjobs"), true).unwrap();
    assert!(var.is_readonly());
    let err = var.set(Variable::from("renamed")).unwrap_err();
    assert!(matches!(err, VariableError::Readonly { .. }));
    assert_eq!(var.get().as_str(), Some("oddjobs"));
}

#[test]
fn map_declare_readonly_then_store_is_rejected() {
    let map = VariableMap::new();
    map.declare("app.name", Variable::from("oddjobs"), true)
        .unwrap();
    let err = map.store("app.name", Variable::from("renamed")).unwrap_err();
    assert!(matches!(err, VariableError::Readonly { .. }));
    assert_eq!(map.load("app.name").as_str(), Some("oddjobs"));
}

#[test]
fn map_declare_writable_then_store_overwrites() {
    let map = VariableMap::new();
    map.declare("app.name", Variable::from("oddjobs"), false)
        .unwrap();
    map.store("app.name", Variable::from("renamed")).unwrap();
    assert_eq!(map.load("app.name").as_str(), Some("renamed"));
}

#[test]
fn map_store_on_missing_key_declares_it_writable() {
    let map = VariableMap::new();
    map.store("app.name", Variable::from("oddjobs")).unwrap();
    map.store("app.name", Variable::from("renamed")).unwrap();
    assert_eq!(map.load("app.name").as_str(), Some("renamed"));
}

#[test]
fn map_load_with_prefix_filters_and_sorts() {
    let map = VariableMap::new();
    map.store("app.tick.period", Variable::Int(1)).unwrap();
    map.store("app.tock.period", Variable::Int(2)).unwrap();
    map.store("other.key", Variable::Int(3)).unwrap();
    let matches = map.load_with_prefix("app.");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].0, "app.tick.period");
    assert_eq!(matches[1].0, "app.tock.period");
}
