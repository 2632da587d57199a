use arbor_json_pointer::{
    format_json_pointer, get_mut, parse_array_index, parse_json_pointer, prefix_pointer,
    ArrayIndex,
};
use serde_json::json;

#[test]
fn prefixing_segment_by_segment_matches_formatting_whole_path() {
    let path = vec!["store".to_string(), "to/dos".to_string(), "2".to_string()];
    let mut pointer = String::new();
    for segment in path.iter().rev() {
        pointer = prefix_pointer(segment, &pointer);
    }
    assert_eq!(pointer, format_json_pointer(&path));
    assert_eq!(parse_json_pointer(&pointer).unwrap(), path);
}

#[test]
fn end_marker_is_an_index_but_never_resolves() {
    let mut doc = json!([1, 2, 3]);
    assert_eq!(parse_array_index("-").unwrap(), ArrayIndex::End);
    assert_eq!(get_mut(&mut doc, &["-".to_string()]), None);
    assert_eq!(get_mut(&mut doc, &["2".to_string()]), Some(&mut json!(3)));
}

#[test]
fn empty_segments_are_keys() {
    let mut doc = json!({"": {"": 1}});
    let path = parse_json_pointer("//").unwrap();
    assert_eq!(path, vec!["", ""]);
    assert_eq!(get_mut(&mut doc, &path), Some(&mut json!(1)));
}
