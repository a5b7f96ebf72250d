use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_plain_prompt() {
    let text = "Draw a class diagram for a blog";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_quit() {
    assert!(SlashCommand::parse("/q").unwrap().is_quit());
    assert!(SlashCommand::parse("/quit").unwrap().is_quit());
    assert!(SlashCommand::parse("/exit").unwrap().is_quit());
}

#[test]
fn it_is_model_set_with_arg() {
    let cmd = SlashCommand::parse("/model  codellama:7b ").unwrap();
    assert!(cmd.is_model_set());
    assert_eq!(cmd.arg(), Some("codellama:7b"));
}

#[test]
fn it_is_model_list() {
    assert!(SlashCommand::parse("/ml").unwrap().is_model_list());
    assert!(SlashCommand::parse("/modellist").unwrap().is_model_list());
}

#[test]
fn it_is_branch_create() {
    let cmd = SlashCommand::parse("/branch experiment").unwrap();
    assert!(cmd.is_branch_create());
    assert_eq!(cmd.arg(), Some("experiment"));
}

#[test]
fn it_is_branch_switch() {
    let cmd = SlashCommand::parse("/s main").unwrap();
    assert!(cmd.is_branch_switch());
    assert_eq!(cmd.arg(), Some("main"));
}

#[test]
fn it_is_branch_list() {
    assert!(SlashCommand::parse("/branches").unwrap().is_branch_list());
}

#[test]
fn it_is_artifacts() {
    assert!(SlashCommand::parse("/artifacts").unwrap().is_artifacts());
}

#[test]
fn it_is_render() {
    assert!(SlashCommand::parse("/r").unwrap().is_render());
}

#[test]
fn it_is_run() {
    assert!(SlashCommand::parse("/run").unwrap().is_run());
}

#[test]
fn it_is_help() {
    assert!(SlashCommand::parse("/h").unwrap().is_help());
    assert!(SlashCommand::parse("/help").unwrap().is_help());
}

#[test]
fn it_has_no_arg() {
    let cmd = SlashCommand::parse("/branch").unwrap();
    assert_eq!(cmd.arg(), None);
}
