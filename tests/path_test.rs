//! Integration tests for JsonPath.

use formschema::{JsonPath, PathSegment, SchemaKeyword};

#[test]
fn test_path_construction_and_display() {
    assert_eq!(JsonPath::root().to_string(), "");
    assert_eq!(JsonPath::root().push_field("name").to_string(), "name");
    assert_eq!(JsonPath::root().push_index(0).to_string(), "[0]");

    let path = JsonPath::root()
        .push_field("users")
        .push_index(0)
        .push_field("address")
        .push_field("city");
    assert_eq!(path.to_string(), "users[0].address.city");
}

#[test]
fn test_keyword_segments() {
    let path = JsonPath::root()
        .push_keyword(SchemaKeyword::AllOf(2))
        .push_keyword(SchemaKeyword::Then)
        .push_field("pets")
        .push_keyword(SchemaKeyword::Items)
        .push_index(1);

    assert_eq!(path.to_string(), "allOf[2].then.pets.items[1]");
    assert_eq!(path.len(), 5);
    assert_eq!(path.value_path().to_string(), "pets[1]");
    assert_eq!(path.last(), Some(&PathSegment::Index(1)));
}

#[test]
fn test_value_segments() {
    assert!(PathSegment::field("a").is_value_segment());
    assert!(PathSegment::index(3).is_value_segment());
    assert!(!PathSegment::Keyword(SchemaKeyword::Else).is_value_segment());
}

#[test]
fn test_paths_are_immutable() {
    let base = JsonPath::from_field("user");
    let child = base.push_field("email");

    assert_eq!(base.to_string(), "user");
    assert_eq!(child.to_string(), "user.email");
    assert!(!base.is_root());
    assert!(JsonPath::root().value_path().is_root());
}
