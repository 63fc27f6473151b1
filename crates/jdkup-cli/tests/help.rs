use assert_cmd::cargo::cargo_bin_cmd;

fn help_output(args: &[&str]) -> String {
    let assert = cargo_bin_cmd!("jdkup").args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 help")
}

#[test]
fn top_level_help_lists_commands() {
    let output = help_output(&["--help"]);
    for command in ["find", "list", "install", "update", "cache"] {
        assert!(output.contains(command), "help missing {command}: {output}");
    }
    assert!(output.contains("--offline"), "help missing --offline: {output}");
}

#[test]
fn find_help_shows_criteria_flags() {
    let output = help_output(&["find", "--help"]);
    assert!(
        output.contains("jdkup find [--version N] [--vendor V] [--implementation I]"),
        "find usage missing: {output}"
    );
    assert!(output.contains("--vendor"), "find help missing --vendor: {output}");
}

#[test]
fn cache_prune_help_mentions_age() {
    let output = help_output(&["cache", "prune", "--help"]);
    assert!(
        output.contains("Remove abandoned downloads and half-unpacked installations."),
        "cache prune about missing: {output}"
    );
    assert!(output.contains("--max-age-hours"), "{output}");
}
