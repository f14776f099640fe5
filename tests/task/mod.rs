mod check;
mod done;

/// Tasks in various states, relative to the default date of the tests.
const TASKS: &str = r#"{"id":"1","date":"20240125","title":"water plants","repeat":"d 3"}
{"id":"2","date":"20240125","title":"call mom"}
{"id":"3","date":"20240131","title":"rent","comment":"flat","repeat":"m -1"}

{"id":"4","date":"20240229","title":"birthday","comment":"","repeat":"y"}
"#;

#[test]
fn no_sub_command() {
    crate::command::assert_cmd_snapshot!(
        crate::due(["task", "later"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    unrecognized command 'later'
    ",
    );
}

const RENT: &str =
    r#"{"id":"1","date":"20240101","title":"rent","repeat":"m 1"}"#;

/// New tasks are normalized and then marked done, which is what happens to
/// a task over its lifetime.
#[test]
fn check_then_done() {
    crate::command::assert_cmd_snapshot!(
        crate::due(["task", "check"])
            .stdin(RENT)
            .pipe(crate::due(["task", "done"])),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"1","date":"20240301","title":"rent","comment":"","repeat":"m 1"}

    ----- stderr -----
    "#,
    );
}
