use crate::command::assert_cmd_snapshot;

fn done() -> crate::command::Command {
    crate::due(["task", "done"])
}

#[test]
fn stdin() {
    assert_cmd_snapshot!(
        done().stdin(super::TASKS),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"1","date":"20240128","title":"water plants","comment":"","repeat":"d 3"}
    {"id":"3","date":"20240229","title":"rent","comment":"flat","repeat":"m -1"}
    {"id":"4","date":"20250228","title":"birthday","comment":"","repeat":"y"}

    ----- stderr -----
    "#,
    );
}

#[test]
fn now_flag() {
    assert_cmd_snapshot!(
        done().args(["-n", "20240301"]).stdin(super::TASKS),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"1","date":"20240304","title":"water plants","comment":"","repeat":"d 3"}
    {"id":"3","date":"20240331","title":"rent","comment":"flat","repeat":"m -1"}
    {"id":"4","date":"20250228","title":"birthday","comment":"","repeat":"y"}

    ----- stderr -----
    "#,
    );
}

/// One-shot tasks disappear from the output, which is only mentioned at
/// the debug level.
#[test]
fn removed_tasks_are_logged() {
    let snap = done().env("DUE_LOG", "debug").stdin(super::TASKS).snapshot();
    let got = snap.snapshot();
    assert!(got.contains("|DEBUG|src/cmd/task/done.rs:"), "{got}");
    assert!(got.contains("removing one-shot task `2`"), "{got}");
    assert!(!got.contains(r#"{"id":"2""#), "{got}");

    let snap = done().env("DUE_LOG", "info").stdin(super::TASKS).snapshot();
    let got = snap.snapshot();
    assert!(!got.contains("removing one-shot task"), "{got}");
}

#[test]
fn files() {
    let tmp = crate::TempDir::new();
    tmp.create("a.jsonl", super::TASKS);
    tmp.create(
        "b.jsonl",
        r#"{"id":"5","date":"20240126","title":"stretch","repeat":"w 1,3,5"}"#,
    );
    assert_cmd_snapshot!(
        tmp.due(["task", "done", "b.jsonl", "a.jsonl"]),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"5","date":"20240129","title":"stretch","comment":"","repeat":"w 1,3,5"}
    {"id":"1","date":"20240128","title":"water plants","comment":"","repeat":"d 3"}
    {"id":"3","date":"20240229","title":"rent","comment":"flat","repeat":"m -1"}
    {"id":"4","date":"20250228","title":"birthday","comment":"","repeat":"y"}

    ----- stderr -----
    "#,
    );
}

#[test]
fn invalid_task() {
    let tmp = crate::TempDir::new();
    tmp.create(
        "tasks.jsonl",
        "{\"id\":\"1\",\"date\":\"20240125\",\"title\":\"a\",\"repeat\":\"d 3\"}\n\
         {\"id\":\"2\",\"date\":\"20240125\",\"title\":\"b\",\"repeat\":\"d 0\"}\n",
    );
    assert_cmd_snapshot!(
        tmp.due(["task", "done", "tasks.jsonl"]),
        @r#"
    success: false
    exit_code: 1
    ----- stdout -----
    {"id":"1","date":"20240128","title":"a","comment":"","repeat":"d 3"}

    ----- stderr -----
    line 2 of tasks.jsonl: invalid recurrence rule `d 0`: invalid daily interval `0` (values must be in range 1..=400)
    "#,
    );

    assert_cmd_snapshot!(
        done().stdin(
            r#"{"id":"1","date":"2024-01-25","title":"a","repeat":"d 3"}"#,
        ),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    line 1 of <stdin>: invalid date `2024-01-25` (dates must be 8 digits in the format YYYYMMDD)
    ",
    );
}

#[test]
fn invalid_json() {
    let output = done()
        .std()
        .stdin(std::process::Stdio::null())
        .arg("-")
        .output()
        .unwrap();
    // Empty stdin is no tasks at all.
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let tmp = crate::TempDir::new();
    tmp.create("tasks.jsonl", "\n{\"id\":1}\n");
    let output =
        tmp.due(["task", "done", "tasks.jsonl"]).std().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.starts_with("line 2 of tasks.jsonl: invalid task JSON: "),
        "{stderr}",
    );
}

/// A task whose rule can never be satisfied fails with a distinct exit code.
#[test]
fn unsatisfiable_rule() {
    assert_cmd_snapshot!(
        done().stdin(
            r#"{"id":"1","date":"20240125","title":"a","repeat":"m 30,31 2"}"#,
        ),
        @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    line 1 of <stdin>: internal error: no occurrence of `m 30,31 2` found within 2000 months after 2024-01-26
    ",
    );
}
