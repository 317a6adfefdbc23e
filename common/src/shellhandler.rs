use crate::{Error, Result};
use std::process::{Output, Stdio};
use tokio::{io::AsyncWriteExt, process::Command};

fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<&str>>()
        .join(" ")
}

pub async fn run(program: &str, args: &[String], env: &[(String, String)]) -> Result<Output> {
    tracing::trace!("running {}", command_line(program, args));
    Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(Error::Stdio)
}

/// Same as [`run`] but feeds `input` to the child stdin
pub async fn run_with_input(
    program: &str,
    args: &[String],
    env: &[(String, String)],
    input: &str,
) -> Result<Output> {
    tracing::trace!("running {} with stdin", command_line(program, args));
    let mut child = Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(Error::Stdio)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await.map_err(Error::Stdio)?;
    }
    child.wait_with_output().await.map_err(Error::Stdio)
}

pub fn check(program: &str, args: &[String], out: Output) -> Result<String> {
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).trim().to_string();
        Err(Error::CommandFailed(
            command_line(program, args),
            out.status.code().unwrap_or(-1),
            err,
        ))
    } else {
        String::from_utf8(out.stdout).map_err(Error::UTF8)
    }
}

pub async fn get_stdout(program: &str, args: &[String], env: &[(String, String)]) -> Result<String> {
    let out = run(program, args, env).await?;
    check(program, args, out)
}
