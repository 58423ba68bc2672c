use std::{fs, path::PathBuf, process::Command};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("medusa-tower-{}-{name}", std::process::id()))
}

fn run_script(name: &str, lines: &[&str]) -> String {
    let script = scratch(&format!("{name}.txt"));
    fs::write(&script, lines.join("\n")).expect("script written");

    let output = Command::new(env!("CARGO_BIN_EXE_medusa-tower"))
        .arg("--script")
        .arg(&script)
        .arg("--save")
        .arg(scratch(&format!("{name}.save")))
        .arg("--no-autosave")
        .output()
        .expect("failed to run the medusa-tower binary");
    let _ = fs::remove_file(&script);

    assert!(output.status.success(), "medusa-tower exited with {}", output.status);
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn scripted_walk_into_the_snake_gaze() {
    let stdout = run_script("gaze", &["w", "w", "w", "w", "fly", "a", "a", "a", "quit"]);

    assert!(stdout.starts_with("Welcome"), "banner first: {stdout}");
    assert!(stdout.contains("floor 1F  position (5,9,1)"));
    assert!(stdout.contains("? unknown input 'fly'"));
    assert!(stdout.contains("> The snake spotted you. [ok]"));
}

#[test]
fn pushes_without_the_move_spell_change_nothing() {
    let stdout = run_script("push", &["push b north", "quit"]);

    assert!(!stdout.contains("? "), "push line parses: {stdout}");
    assert!(!stdout.contains("> "), "no dialog opens: {stdout}");
}

#[test]
fn quit_stops_reading_the_script() {
    let stdout = run_script("quit", &["quit", "w"]);

    assert_eq!(stdout.matches("floor 1F").count(), 1);
    assert!(!scratch("quit.save").exists());
}
