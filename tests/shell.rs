use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use jobsh::error::ShellError;
use jobsh::executor::{DefaultExecutor, ExecOutcome, ExecStatus, Executor};
use jobsh::job::JobState;
use jobsh::lexer::Lexer;
use jobsh::parser::default::DefaultParser;
use jobsh::parser::{ParseError, Parser};
use jobsh::terminal::Terminal;
use nix::sys::signal::{Signal, killpg};

fn shell() -> DefaultExecutor {
    DefaultExecutor::new(Terminal::detached())
}

fn run(shell: &mut DefaultExecutor, src: &str) -> (ExecStatus, String) {
    let line = DefaultParser::new(src)
        .parse()
        .expect("parse failed")
        .expect("blank line");
    let mut out = Vec::new();
    let status = shell.exec(&line, &mut out);
    (status, String::from_utf8(out).unwrap())
}

fn code(status: ExecStatus) -> i32 {
    match status {
        Ok(ExecOutcome::Code(code)) => code,
        other => panic!("unexpected outcome {other:?}"),
    }
}

/// Runs `jobs` until `done` holds for the table or a few seconds pass.
fn poll_jobs(shell: &mut DefaultExecutor, done: impl Fn(&DefaultExecutor) -> bool) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let (status, out) = run(shell, "jobs");
        assert_eq!(code(status), 0);
        if done(shell) || Instant::now() > deadline {
            return out;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn tokenizer_keeps_quoted_spaces() {
    let words: Vec<String> = Lexer::tokenize(r#"echo "hello world" foo"#)
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(words, vec!["echo", "hello world", "foo"]);
}

#[test]
fn three_stage_pipeline_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = shell();

    let (status, _) = run(
        &mut shell,
        &format!(r#"printf "b\na\nc\n" | sort | cat > {}"#, out.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(out).unwrap(), "a\nb\nc\n");
}

#[test]
fn long_pipeline_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = shell();

    let (status, _) = run(
        &mut shell,
        &format!("echo x | cat | cat | cat | cat | cat | wc -l > {}", out.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(out).unwrap().trim(), "1");
}

#[test]
fn sort_with_input_and_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "pear\napple\nfig\n").unwrap();
    fs::write(&output, "stale contents that should disappear\n").unwrap();
    let mut shell = shell();

    let (status, _) = run(
        &mut shell,
        &format!("sort < {} > {}", input.display(), output.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(output).unwrap(), "apple\nfig\npear\n");
}

#[test]
fn append_twice_keeps_both_lines() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = shell();

    for _ in 0..2 {
        let (status, _) = run(&mut shell, &format!("echo hi >> {}", out.display()));
        assert_eq!(code(status), 0);
    }
    assert_eq!(fs::read_to_string(out).unwrap(), "hi\nhi\n");
}

#[test]
fn file_redirect_overrides_pipe() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let last = dir.path().join("last.txt");
    let input = dir.path().join("in.txt");
    fs::write(&input, "from file\n").unwrap();
    let mut shell = shell();

    // stage 0 writes to its file, so stage 1 sees an empty pipe
    let (status, _) = run(
        &mut shell,
        &format!("echo a > {} | wc -c > {}", first.display(), last.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(&first).unwrap(), "a\n");
    assert_eq!(fs::read_to_string(&last).unwrap().trim(), "0");

    // stage 1 reads its file instead of the pipe
    let (status, _) = run(
        &mut shell,
        &format!("echo ignored | cat < {} > {}", input.display(), last.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(&last).unwrap(), "from file\n");
}

#[test]
fn missing_program_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut shell = shell();

    let (status, _) = run(
        &mut shell,
        &format!("jobsh-no-such-program-xyz | echo ok > {}", out.display()),
    );
    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(out).unwrap(), "ok\n");

    let (status, _) = run(&mut shell, "jobsh-no-such-program-xyz");
    assert_eq!(code(status), 127);
}

#[test]
fn background_job_returns_immediately() {
    let mut shell = shell();
    let started = Instant::now();
    let (status, out) = run(&mut shell, "sleep 2 &");
    assert_eq!(code(status), 0);
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(out.starts_with("[1] "), "{out}");

    assert_eq!(shell.jobs().len(), 1);
    let job = shell.jobs().get(1).unwrap();
    assert_eq!(job.state, JobState::Running);
    assert_eq!(job.command, "sleep 2 &");

    let (_, listing) = run(&mut shell, "jobs");
    assert!(listing.contains("[1] PID: "), "{listing}");
    assert!(listing.contains("Command: sleep 2 & (Running)"), "{listing}");

    let (status, out) = run(&mut shell, "fg 1");
    assert_eq!(code(status), 0);
    assert!(out.contains("Bringing job [1] to foreground"));
    assert!(shell.jobs().is_empty());
}

#[test]
fn fg_unknown_job_leaves_table_alone() {
    let mut shell = shell();
    run(&mut shell, "sleep 1 &");

    let (status, out) = run(&mut shell, "fg 99");
    match status {
        Err(err @ ShellError::NoSuchJob { .. }) => assert_eq!(err.to_string(), "fg: 99: no such job"),
        other => panic!("expected no such job, got {other:?}"),
    }
    assert!(out.is_empty());
    assert_eq!(shell.jobs().len(), 1);
    assert!(shell.jobs().get(1).is_some());

    run(&mut shell, "fg 1");
}

#[test]
fn finished_jobs_disappear_from_listing() {
    let mut shell = shell();
    let (status, _) = run(&mut shell, "true &");
    assert_eq!(code(status), 0);
    assert_eq!(shell.jobs().len(), 1);

    let listing = poll_jobs(&mut shell, |s| s.jobs().is_empty());
    assert!(shell.jobs().is_empty());
    assert!(!listing.contains("true &"), "{listing}");

    // ids keep counting after removal
    let (_, out) = run(&mut shell, "true &");
    assert!(out.starts_with("[2] "), "{out}");
    poll_jobs(&mut shell, |s| s.jobs().is_empty());
}

#[test]
fn stopped_job_resumes_with_bg() {
    let mut shell = shell();
    run(&mut shell, "sleep 5 &");
    let pgid = shell.jobs().get(1).unwrap().handle.pgid();

    killpg(pgid, Signal::SIGSTOP).unwrap();
    let listing = poll_jobs(&mut shell, |s| s.jobs().get(1).unwrap().state == JobState::Stopped);
    assert!(listing.contains("(Stopped)"), "{listing}");

    let (status, out) = run(&mut shell, "bg %1");
    assert_eq!(code(status), 0);
    assert!(out.contains("Resuming job [1] in background"));
    assert_eq!(shell.jobs().get(1).unwrap().state, JobState::Running);

    killpg(pgid, Signal::SIGKILL).unwrap();
    poll_jobs(&mut shell, |s| s.jobs().is_empty());
    assert!(shell.jobs().is_empty());
}

#[test]
fn fg_continues_a_job_stopped_behind_the_shells_back() {
    let mut shell = shell();
    run(&mut shell, "sleep 1 &");
    let pgid = shell.jobs().get(1).unwrap().handle.pgid();

    // no `jobs` in between: the table still believes the job is running
    killpg(pgid, Signal::SIGSTOP).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(shell.jobs().get(1).unwrap().state, JobState::Running);

    let (done, finished) = mpsc::channel::<()>();
    let watchdog = thread::spawn(move || {
        if finished.recv_timeout(Duration::from_secs(10)).is_err() {
            let _ = killpg(pgid, Signal::SIGKILL);
        }
    });

    let started = Instant::now();
    let (status, out) = run(&mut shell, "fg 1");
    let elapsed = started.elapsed();
    let _ = done.send(());
    watchdog.join().unwrap();

    assert_eq!(code(status), 0, "{out}");
    assert!(elapsed < Duration::from_secs(5), "fg took {elapsed:?}");
    assert!(shell.jobs().is_empty());
}

#[test]
fn failed_fg_leaves_the_job_tracked() {
    let mut shell = shell();
    run(&mut shell, "sleep 1 &");

    let (status, _) = run(&mut shell, "fg 1 > /dev/full");
    assert!(matches!(status, Err(ShellError::Io(_))), "{status:?}");
    assert_eq!(shell.jobs().len(), 1);
    let (_, listing) = run(&mut shell, "jobs");
    assert!(listing.contains("[1] PID: "), "{listing}");

    let (status, _) = run(&mut shell, "fg 1");
    assert_eq!(code(status), 0);
    assert!(shell.jobs().is_empty());
}

#[test]
fn dangling_operator_spawns_nothing() {
    assert_eq!(
        DefaultParser::new("echo hi >").parse(),
        Err(ParseError::MissingOperand { operator: ">" })
    );
}

#[test]
fn cd_and_pwd() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    let out = target.join("pwd.txt");
    let original = std::env::current_dir().unwrap();
    let mut shell = shell();

    let (status, _) = run(&mut shell, &format!("cd {}", target.display()));
    assert_eq!(code(status), 0);
    let (status, _) = run(&mut shell, &format!("pwd > {}", out.display()));
    std::env::set_current_dir(original).unwrap();

    assert_eq!(code(status), 0);
    assert_eq!(fs::read_to_string(out).unwrap().trim_end(), target.display().to_string());
}
