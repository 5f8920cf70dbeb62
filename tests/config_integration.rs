use richview::config::{
    ConfigFlags, RichTextOptions, ThemeMode, clear_config_flags, load_config_flags,
    parse_flag_tokens, save_config_flags,
};

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".richviewrc");
    let content = r"
# comment
--watch

--theme light
   
--tab-size=2
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.tab_size, Some(2));
}

#[test]
fn test_missing_config_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".richviewrc");
    std::fs::write(&path, "--watch\n--theme light\n--width 100\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_flags = parse_flag_tokens(&args(&["richview", "--theme", "dark", "--no-links"]));

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.no_links, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(
        effective.width,
        Some(100),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_save_then_load_keeps_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config");
    let flags = parse_flag_tokens(&args(&[
        "richview",
        "-n",
        "--no-wrap",
        "--case-sensitive",
        "--width=72",
        "--theme=dark",
        "notes.md",
    ]));

    save_config_flags(&path, &flags).unwrap();
    assert_eq!(load_config_flags(&path).unwrap(), flags);

    clear_config_flags(&path).unwrap();
    assert!(!path.exists());
    clear_config_flags(&path).unwrap();
}

#[test]
fn test_flags_apply_to_render_options() {
    let flags = parse_flag_tokens(&args(&[
        "--no-wrap",
        "--line-numbers",
        "--no-highlight",
        "--tab-size",
        "8",
    ]));
    let options = flags.apply(RichTextOptions::default());
    assert!(!options.word_wrap);
    assert!(options.line_numbers);
    assert!(!options.syntax_highlighting);
    assert!(options.hyperlinks);
    assert_eq!(options.tab_size, 8);
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        watch: true,
        no_wrap: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        line_numbers: true,
        perf: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.watch);
    assert!(merged.no_wrap);
    assert!(merged.line_numbers);
    assert!(merged.perf);
}
