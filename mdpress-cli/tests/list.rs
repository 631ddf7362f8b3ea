use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn lists_platforms_with_their_chains() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("mdpress");
    cmd.current_dir(dir.path()).arg("--list-platforms");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("wechat"))
        .stdout(predicate::str::contains("zhihu"))
        .stdout(predicate::str::contains("twitter"))
        .stdout(predicate::str::contains("lists → code-blocks → tables → styles"));
}

#[test]
fn lists_components_as_json() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("mdpress");
    cmd.current_dir(dir.path()).arg("--list-plugins");

    let output = cmd.assert().success().get_output().stdout.clone();
    let listing: serde_json::Value = serde_json::from_slice(&output).unwrap();

    let plugins = listing["plugins"].as_array().unwrap();
    let names: Vec<&str> = plugins
        .iter()
        .map(|plugin| plugin["name"].as_str().unwrap())
        .collect();
    for expected in ["images", "links", "headings", "lists", "code-blocks", "tables", "styles"] {
        assert!(names.contains(&expected), "missing {expected}");
    }

    let styles = plugins
        .iter()
        .find(|plugin| plugin["name"] == "styles")
        .unwrap();
    assert_eq!(styles["config"]["enabled"], true);
    assert_eq!(styles["meta"]["max_font_size"]["type"], "number");
    assert!(styles["description"].as_str().unwrap().contains("inline"));

    assert!(!listing["extensions"].as_array().unwrap().is_empty());
}
