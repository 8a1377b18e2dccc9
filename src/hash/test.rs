use super::*;

#[test]
fn test_known_digest() {
    assert_eq!(
        stable_name("abc").as_str(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_name_is_deterministic() {
    assert_eq!(stable_name("3_add"), stable_name("3_add"));
    assert_eq!(stable_name(b"3_add"), stable_name(String::from("3_add")));
}

#[test]
fn test_distinct_inputs() {
    assert_ne!(stable_name("0_main"), stable_name("1_main"));
    assert_ne!(stable_name("\"a\""), stable_name("\"b\""));
}

#[test]
fn test_name_shape() {
    let name = stable_name("");
    assert_eq!(name.as_str().len(), 64);
    assert!(name.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(name.to_string(), name.as_str());
}
