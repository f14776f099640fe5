use crate::command::assert_cmd_snapshot;

fn check() -> crate::command::Command {
    crate::due(["task", "check"])
}

#[test]
fn normalizes() {
    assert_cmd_snapshot!(
        check().stdin(super::TASKS),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"1","date":"20240128","title":"water plants","comment":"","repeat":"d 3"}
    {"id":"2","date":"20240126","title":"call mom","comment":"","repeat":""}
    {"id":"3","date":"20240131","title":"rent","comment":"flat","repeat":"m -1"}
    {"id":"4","date":"20240229","title":"birthday","comment":"","repeat":"y"}

    ----- stderr -----
    "#,
    );
}

#[test]
fn missing_date_is_today() {
    assert_cmd_snapshot!(
        check().stdin(r#"{"title":"water plants","repeat":"d 3"}"#),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"","date":"20240126","title":"water plants","comment":"","repeat":"d 3"}

    ----- stderr -----
    "#,
    );

    assert_cmd_snapshot!(
        check()
            .args(["--now", "20240310"])
            .stdin(r#"{"title":"rent","date":"20240101","repeat":"m 1"}"#),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"id":"","date":"20240401","title":"rent","comment":"","repeat":"m 1"}

    ----- stderr -----
    "#,
    );
}

#[test]
fn missing_title() {
    assert_cmd_snapshot!(
        check().stdin(
            "{\"id\":\"1\",\"title\":\"a\"}\n{\"id\":\"2\",\"date\":\"20240101\"}\n",
        ),
        @r#"
    success: false
    exit_code: 1
    ----- stdout -----
    {"id":"1","date":"20240126","title":"a","comment":"","repeat":""}

    ----- stderr -----
    line 2 of <stdin>: task title is required
    "#,
    );
}

#[test]
fn invalid_recurrence() {
    assert_cmd_snapshot!(
        check().stdin(r#"{"title":"a","repeat":"w 8"}"#),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    line 1 of <stdin>: invalid task recurrence: invalid recurrence rule `w 8`: invalid day of the week `8` (values must be in range 1..=7)
    ",
    );

    assert_cmd_snapshot!(
        check().stdin(r#"{"title":"a","date":"2024013"}"#),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    line 1 of <stdin>: invalid task date: invalid date `2024013` (dates must be 8 digits in the format YYYYMMDD)
    ",
    );
}
