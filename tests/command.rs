/*!
A small command snapshotting mechanism for running the `due` binary.

A snapshot records whether the command succeeded, its exit code and its full
stdout and stderr. Commands can be given stdin and can be chained into a
pipeline, where the stdout of each command is the stdin of the next. Since
`due` reads and writes line delimited data, this lets tests compose commands
the same way a shell would.

Tests build commands with the `Command` wrapper defined here instead of
`std::process::Command`. It's an owned builder, which composes more easily
with pipelines.
*/

use std::{
    collections::BTreeMap,
    env::consts::EXE_SUFFIX,
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process, thread,
};

use bstr::{BString, ByteSlice, ByteVec};

macro_rules! run_and_snapshot {
    ($cmd:expr, $body:expr) => {{
        let snap = $cmd.snapshot();
        let mut settings = insta::Settings::clone_current();
        settings.set_info(snap.info());
        settings.set_omit_expression(true);
        settings.bind(|| ($body)(snap.snapshot()));
    }};
}

macro_rules! assert_cmd_snapshot {
    ($spawnable:expr, @$snapshot:literal $(,)?) => {{
        $crate::command::run_and_snapshot!($spawnable, |snapshot: &str| {
            insta::assert_snapshot!(snapshot, @$snapshot);
        });
    }};
}

pub(crate) use {assert_cmd_snapshot, run_and_snapshot};

/// A snapshot generated from running a command.
///
/// The contextual info is shown by `cargo insta review`, but is not part of
/// the snapshot itself.
pub struct Snapshot {
    info: CommandInfo,
    snapshot: String,
}

impl Snapshot {
    fn new(cmd: &Command, output: &process::Output) -> Snapshot {
        let info = cmd.info();
        let snapshot = format!(
            "success: {:?}\n\
             exit_code: {}\n\
             ----- stdout -----\n\
             {}\n\
             ----- stderr -----\n\
             {}",
            output.status.success(),
            output.status.code().unwrap_or(!0),
            bytes_to_string(&output.stdout),
            bytes_to_string(&output.stderr),
        );
        Snapshot { info, snapshot }
    }

    /// Returns the Insta "info" that contextualizes the snapshot.
    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    /// Returns the snapshot derived from running the command.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }
}

/// A rudimentary pipeline of commands.
#[derive(Debug)]
pub struct Pipeline {
    /// When present, this gets piped into the first command.
    stdin: Option<BString>,
    /// Every command but the last. The stdout of each is connected to the
    /// stdin of the one after it.
    priors: Vec<Command>,
    /// The command whose output is snapshotted.
    last: Command,
}

impl Pipeline {
    /// Pipe the stdout of the current last command into the given command.
    pub fn pipe(mut self, cmd: Command) -> Pipeline {
        self.add(cmd);
        self
    }

    /// Passes the provided bytes as stdin into the first process in this
    /// pipeline.
    pub fn pass_stdin(self, bytes: impl Into<Vec<u8>>) -> Pipeline {
        Pipeline { stdin: Some(BString::from(bytes.into())), ..self }
    }

    fn add(&mut self, cmd: Command) {
        let previous_last = std::mem::replace(&mut self.last, cmd);
        self.priors.push(previous_last);
    }

    /// Run the commands in this pipeline and create a snapshot from the output
    /// of the last command.
    ///
    /// This panics if any command before the last one fails.
    pub fn snapshot(&self) -> Snapshot {
        let mut thread_stdin = None;
        let mut threads = vec![];
        let mut first_stdin = self.stdin.clone();
        let mut prior_stdout: Option<process::ChildStdout> = None;
        for cmd in self.priors.iter() {
            let mut cmd = cmd.std();
            if first_stdin.is_some() {
                cmd.stdin(process::Stdio::piped());
            } else if let Some(prior_stdout) = prior_stdout.take() {
                cmd.stdin(prior_stdout);
            } else {
                cmd.stdin(process::Stdio::null());
            }
            cmd.stdout(process::Stdio::piped());
            cmd.stderr(process::Stdio::piped());
            let mut child = cmd.spawn().unwrap();
            if let Some(first_stdin) = first_stdin.take() {
                let mut child_stdin = child.stdin.take().unwrap();
                thread_stdin = Some(thread::spawn(move || {
                    child_stdin.write_all(&first_stdin)
                }));
            }
            prior_stdout = child.stdout.take();
            threads.push((
                format!("{cmd:?}"),
                thread::spawn(move || child.wait_with_output()),
            ));
        }

        let mut last = self.last.std();
        if first_stdin.is_some() {
            last.stdin(process::Stdio::piped());
        } else if let Some(prior_stdout) = prior_stdout.take() {
            last.stdin(prior_stdout);
        } else {
            last.stdin(process::Stdio::null());
        }
        last.stdout(process::Stdio::piped());
        last.stderr(process::Stdio::piped());
        let output = match first_stdin.take() {
            None => last.output().unwrap(),
            Some(first_stdin) => {
                let mut child = last.spawn().unwrap();
                let mut child_stdin = child.stdin.take().unwrap();
                thread_stdin = Some(thread::spawn(move || {
                    child_stdin.write_all(&first_stdin)
                }));
                child.wait_with_output().unwrap()
            }
        };
        let mut snap = Snapshot::new(&self.last, &output);

        for (cmd_debug, thread) in threads {
            let output = thread.join().unwrap().unwrap();
            if !output.status.success() {
                panic!(
                    "command `{cmd_debug}` failed with exit code {exit},\n\
                     ----- stderr -----\n\
                     {stderr}",
                    exit = output.status.code().unwrap_or(!0),
                    stderr = bytes_to_string(&output.stderr),
                );
            }
        }
        if let Some(thread_stdin) = thread_stdin {
            // A command that exits early (say, on an error) may never read
            // all of its stdin, so a broken pipe here is fine.
            let _ = thread_stdin.join().unwrap();
            snap.info.set_stdin(self.stdin.as_ref().unwrap());
        }
        snap
    }
}

impl From<Command> for Pipeline {
    fn from(cmd: Command) -> Pipeline {
        Pipeline { stdin: None, priors: vec![], last: cmd }
    }
}

/// An owned wrapper around `std::process::Command`.
///
/// Only the builder parts are wrapped. Each method consumes and returns the
/// command, which makes it easy to store commands in a `Pipeline`. The
/// `stdin`, `stdout` and `stderr` methods are left out because they represent
/// I/O resources that the snapshotting machinery sets up itself.
#[derive(Clone, Debug)]
pub struct Command {
    bin: OsString,
    current_dir: Option<PathBuf>,
    args: Vec<OsString>,
    envs: Vec<EnvAction>,
}

impl Command {
    /// Create a new command wrapper for the given binary program.
    pub fn new(bin: impl AsRef<OsStr>) -> Command {
        Command {
            bin: bin.as_ref().to_os_string(),
            current_dir: None,
            args: vec![],
            envs: vec![],
        }
    }

    /// Add an argument to the end of this command invocation.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Command {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add arguments to the end of this command invocation.
    pub fn args(
        mut self,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Command {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set an environment variable.
    pub fn env(
        mut self,
        key: impl AsRef<OsStr>,
        val: impl AsRef<OsStr>,
    ) -> Command {
        self.envs.push(EnvAction::Set(
            key.as_ref().to_os_string(),
            val.as_ref().to_os_string(),
        ));
        self
    }

    /// Remove an environment variable (also prevents inheriting from the
    /// parent process).
    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Command {
        self.envs.push(EnvAction::Remove(key.as_ref().to_os_string()));
        self
    }

    /// Set the current directory in which to run this command.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Command {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Returns a new pipeline where the given data is passed into the stdin
    /// of this command.
    pub fn stdin(self, stdin: impl Into<Vec<u8>>) -> Pipeline {
        Pipeline::from(self).pass_stdin(stdin)
    }

    /// Turn this wrapper into a fresh `std::process::Command`.
    pub fn std(&self) -> process::Command {
        let mut cmd = process::Command::new(&self.bin);
        if let Some(ref current_dir) = self.current_dir {
            cmd.current_dir(current_dir);
        }
        cmd.args(self.args.iter());
        for action in self.envs.iter() {
            match *action {
                EnvAction::Set(ref key, ref val) => {
                    cmd.env(key, val);
                }
                EnvAction::Remove(ref key) => {
                    cmd.env_remove(key);
                }
            }
        }
        cmd
    }

    /// Runs this command and returns a snapshot based on its output.
    pub fn snapshot(&self) -> Snapshot {
        let output = self.std().output().unwrap();
        Snapshot::new(self, &output)
    }

    /// Returns the info for this command.
    pub fn info(&self) -> CommandInfo {
        CommandInfo::new(&self.std())
    }
}

/// A single change to the environment of a command.
#[derive(Clone, Debug)]
enum EnvAction {
    /// Maps to `std::process::Command::env`.
    Set(OsString, OsString),
    /// Maps to `std::process::Command::env_remove`.
    Remove(OsString),
}

/// Information about a particular command, shown by `cargo insta review`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CommandInfo {
    bin: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
}

impl CommandInfo {
    fn new(cmd: &process::Command) -> CommandInfo {
        let bin = {
            let path = Path::new(cmd.get_program())
                .file_name()
                .unwrap_or(OsStr::new("{UNKNOWN}"));
            let mut bin =
                <[u8]>::from_os_str(path).expect("valid UTF-8 on Windows");
            if bin.ends_with_str(EXE_SUFFIX) {
                bin = &bin[..bin.len() - EXE_SUFFIX.len()];
            }
            bin
        };
        CommandInfo {
            bin: bytes_to_string(&bin),
            args: cmd.get_args().map(os_str_to_string).collect(),
            env: cmd
                .get_envs()
                .map(|(k, v)| {
                    (
                        os_str_to_string(k),
                        os_str_to_string(v.unwrap_or(OsStr::new(""))),
                    )
                })
                .collect(),
            stdin: None,
        }
    }

    fn set_stdin(&mut self, bytes: &[u8]) {
        self.stdin = Some(bytes_to_string(bytes));
    }
}

/// Return a command prepared to execute the binary with the given name.
///
/// When running under `cross`, the binary is run through an emulator.
pub fn bin(name: &str) -> Command {
    let bin = bin_path(name);
    match cross_runner() {
        None => Command::new(bin),
        Some(runner) => Command::new(runner).arg(bin),
    }
}

/// Returns a path to the Cargo project binary with the given name.
fn bin_path(name: &str) -> PathBuf {
    std::env::current_exe()
        .unwrap()
        .parent()
        .expect("executable's directory")
        .parent()
        .expect("target profile directory")
        .join(format!("{name}{}", EXE_SUFFIX))
}

fn cross_runner() -> Option<String> {
    let runner = std::env::var("CROSS_RUNNER").ok()?;
    if runner.is_empty() || runner == "empty" {
        return None;
    }
    if cfg!(target_arch = "powerpc64") {
        Some("qemu-ppc64".to_string())
    } else if cfg!(target_arch = "x86") {
        Some("i386".to_string())
    } else {
        Some(format!("qemu-{}", std::env::consts::ARCH))
    }
}

/// Turns a slice of bytes into a human readable string.
///
/// When the bytes are valid UTF-8, they are returned as-is. Otherwise, they
/// are escaped into valid UTF-8 using bstr's escaping mechanism.
fn bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(string) => string.to_string(),
        Err(_) => bytes.escape_bytes().to_string(),
    }
}

/// Like `bytes_to_string`, but starts with an OS string.
fn os_str_to_string(os_str: &OsStr) -> String {
    bytes_to_string(&Vec::from_os_str_lossy(os_str))
}
