use std::fs;

use rust_bezel::ContentIdentity;
use rust_bezel::catalog::{CandidateNames, Catalog};
use tempfile::tempdir;

#[test]
fn pitfall_resolves_to_normalized_name_then_default() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let catalog = Catalog::new(root, vec!["png".into()]);
    let names = CandidateNames::new(&ContentIdentity::new("Pitfall!"), "default");

    assert_eq!(names.name_at(0).as_deref(), Some("pitfall"));

    let mut index = 0;
    assert_eq!(catalog.get_name(&names, &mut index), None);

    fs::write(root.join("default.png"), b"x").unwrap();
    let mut index = 0;
    let found = catalog.get_name(&names, &mut index).unwrap();
    assert_eq!(found.name, "default");

    fs::write(root.join("pitfall.png"), b"x").unwrap();
    let mut index = 0;
    let found = catalog.get_name(&names, &mut index).unwrap();
    assert_eq!(found.name, "pitfall");
    assert_eq!(found.path, root.join("pitfall.png"));
    assert_eq!(found.sidecar_path(), root.join("pitfall.yaml"));
}

#[test]
fn override_is_tried_verbatim() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::write(root.join("Activision Wood.png"), b"x").unwrap();
    fs::write(root.join("pitfall.png"), b"x").unwrap();
    let catalog = Catalog::new(root, vec!["png".into()]);
    let names = CandidateNames::new(
        &ContentIdentity::new("Pitfall!").with_override(" Activision Wood "),
        "",
    );

    let mut index = 0;
    let found = catalog.get_name(&names, &mut index).unwrap();
    assert_eq!(found.name, "Activision Wood");
    let next = catalog.get_name(&names, &mut index).unwrap();
    assert_eq!(next.name, "pitfall");
    assert_eq!(catalog.get_name(&names, &mut index), None);
}

#[test]
fn listing_a_missing_directory_fails() {
    let tmp = tempdir().unwrap();
    let catalog = Catalog::new(tmp.path().join("nope"), vec!["png".into()]);
    assert!(catalog.list().is_err());
}
