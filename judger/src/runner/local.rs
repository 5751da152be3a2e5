//! Runs harnessed programs as local OS processes.
//!
//! Every invocation gets its own scratch directory, removed on every exit
//! path when the [`tempfile::TempDir`] guard drops. Processes are started in
//! their own process group, so a timeout or an output-limit breach kills the
//! whole tree.

use async_trait::async_trait;
use bytes::BytesMut;
use err_derive::Error;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::Command,
};

use super::{
    model::{CommandRunOptions, Executor, RunOutput, RunStatus},
    util::{kill_process_group, strip_path_noise, strsignal, wait_exit_unreaped},
};
use crate::{config::SandboxConfig, harness::Harness, model::Language};

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error(display = "Failed to prepare scratch directory: {}", _0)]
    Scratch(#[error(source, no_from)] std::io::Error),

    #[error(display = "Failed to launch `{}`: {}", _0, _1)]
    Spawn(String, #[error(source, no_from)] std::io::Error),

    #[error(display = "Failed to wait on `{}`: {}", _0, _1)]
    Wait(String, #[error(source, no_from)] std::io::Error),
}

/// Commands needed to compile (optionally) and run one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
}

macro_rules! command {
    ( $prog:expr $(, $arg:expr )* ) => {
        vec![$prog.to_string() $(, $arg.to_string() )*]
    };
}

impl Toolchain {
    pub fn for_language(language: Language, dir: &Path) -> Toolchain {
        let binary = dir.join("main").display().to_string();
        match language {
            Language::Python => Toolchain {
                compile: None,
                run: command!("python3", "main.py"),
            },
            Language::JavaScript => Toolchain {
                compile: None,
                run: command!("node", "main.js"),
            },
            Language::TypeScript => Toolchain {
                compile: None,
                run: command!("ts-node", "main.ts"),
            },
            Language::Java => Toolchain {
                compile: Some(command!("javac", "-encoding", "UTF-8", "Main.java")),
                run: command!("java", "-cp", dir.display(), "Main"),
            },
            Language::Cpp => Toolchain {
                compile: Some(command!("g++", "-std=c++17", "-O2", "-o", "main", "main.cpp")),
                run: vec![binary],
            },
            Language::Go => Toolchain {
                compile: Some(command!("go", "build", "-o", "main", "main.go")),
                run: vec![binary],
            },
        }
    }
}

/// How a single process ended.
#[derive(Debug)]
enum ProcessEnd {
    Exited(ExitStatus),
    TimedOut,
    OutputLimitExceeded,
    ToolMissing(String),
}

#[derive(Debug)]
struct ProcessOutcome {
    end: ProcessEnd,
    stdout: String,
    stderr: String,
    elapsed: Duration,
}

enum Event {
    Deadline,
    Stdout(std::io::Result<usize>),
    Stderr(std::io::Result<usize>),
    Exit(std::io::Result<()>),
}

async fn read_pipe<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(pipe) => pipe.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the process `pid` has exited, without reaping it.
async fn leader_exited(pid: Option<u32>) -> std::io::Result<()> {
    let pid = match pid {
        Some(pid) => pid,
        None => return Ok(()),
    };
    tokio::task::spawn_blocking(move || wait_exit_unreaped(pid))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

/// Run one command inside `dir`, feeding `stdin`, under a wall-clock timeout
/// and a cap on the combined size of stdout and stderr.
async fn run_process(
    cmd: &[String],
    dir: &Path,
    stdin: &str,
    timeout: Duration,
    output_limit: usize,
) -> Result<ProcessOutcome, SandboxError> {
    let program = cmd.first().cloned().unwrap_or_default();
    let mut command = Command::new(&program);
    command
        .args(cmd.iter().skip(1))
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let start = Instant::now();
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ProcessOutcome {
                end: ProcessEnd::ToolMissing(program),
                stdout: String::new(),
                stderr: String::new(),
                elapsed: Duration::ZERO,
            });
        }
        Err(e) => return Err(SandboxError::Spawn(program, e)),
    };

    // Whatever happens below, nothing of this process tree outlives us.
    // Disarmed once the leader is reaped, as its pid may then be reused.
    let pid = child.id();
    let mut tree_guard = scopeguard::guard(pid, |pid| {
        if let Some(pid) = pid {
            kill_process_group(pid);
        }
    });

    if let Some(mut pipe) = child.stdin.take() {
        let input = stdin.to_owned();
        tokio::spawn(async move {
            // The program may exit without reading its input.
            let _ = pipe.write_all(input.as_bytes()).await;
            let _ = pipe.shutdown().await;
        });
    }

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = BytesMut::new();
    let mut stderr = BytesMut::new();
    let mut out_chunk = [0u8; 8192];
    let mut err_chunk = [0u8; 8192];
    let mut status = None;
    let mut elapsed = None;

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let leader_exit = leader_exited(pid);
    tokio::pin!(leader_exit);

    let end = loop {
        let event = tokio::select! {
            _ = &mut deadline => Event::Deadline,
            res = read_pipe(&mut stdout_pipe, &mut out_chunk), if stdout_pipe.is_some() => {
                Event::Stdout(res)
            }
            res = read_pipe(&mut stderr_pipe, &mut err_chunk), if stderr_pipe.is_some() => {
                Event::Stderr(res)
            }
            res = &mut leader_exit, if status.is_none() => Event::Exit(res),
        };

        match event {
            Event::Deadline => match status {
                // Something that left the process group still holds a pipe
                Some(st) => break ProcessEnd::Exited(st),
                None => break ProcessEnd::TimedOut,
            },
            Event::Stdout(Ok(n)) if n > 0 => stdout.extend_from_slice(&out_chunk[..n]),
            Event::Stdout(_) => stdout_pipe = None,
            Event::Stderr(Ok(n)) if n > 0 => stderr.extend_from_slice(&err_chunk[..n]),
            Event::Stderr(_) => stderr_pipe = None,
            Event::Exit(res) => {
                elapsed = Some(start.elapsed());
                // Background processes left behind would keep the pipes open.
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                let waited = match res {
                    Ok(()) => child.wait().await,
                    Err(e) => Err(e),
                };
                status = Some(waited.map_err(|e| SandboxError::Wait(program.clone(), e))?);
                *tree_guard = None;
            }
        }

        if stdout.len() + stderr.len() > output_limit {
            break ProcessEnd::OutputLimitExceeded;
        }
        if let (Some(st), None, None) = (status, &stdout_pipe, &stderr_pipe) {
            break ProcessEnd::Exited(st);
        }
    };
    let elapsed = elapsed.unwrap_or_else(|| start.elapsed());

    if status.is_none() {
        tracing::debug!(command = %program, ?end, "Killing process tree");
        if let Some(pid) = pid {
            kill_process_group(pid);
        }
        let _ = child.start_kill();
        if child.wait().await.is_ok() {
            *tree_guard = None;
        }
    }

    stdout.truncate(output_limit);
    stderr.truncate(output_limit);
    Ok(ProcessOutcome {
        end,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        elapsed,
    })
}

fn describe_exit(status: &ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return Some(format!("{} (signal {})", strsignal(sig), sig));
        }
    }
    Some(match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "unknown exit status".into(),
    })
}

/// Executes harnessed programs with the interpreters and compilers installed
/// on this host. Meant for the ad-hoc "run" path.
#[derive(Debug, Clone)]
pub struct LocalSandboxExecutor {
    opt: CommandRunOptions,
    temp_root: Option<PathBuf>,
}

impl LocalSandboxExecutor {
    pub fn new(opt: CommandRunOptions, temp_root: Option<PathBuf>) -> Self {
        LocalSandboxExecutor { opt, temp_root }
    }

    pub fn from_config(cfg: &SandboxConfig) -> Self {
        Self::new(cfg.into(), cfg.temp_root.clone())
    }

    fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("judge-");
        match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }

    /// Compile (when needed) and run `harness`.
    pub async fn run(&self, harness: &Harness) -> Result<RunOutput, SandboxError> {
        let scratch = self.scratch_dir().map_err(SandboxError::Scratch)?;
        let dir = scratch.path();
        tokio::fs::write(dir.join(harness.file_name), &harness.source)
            .await
            .map_err(SandboxError::Scratch)?;

        let toolchain = Toolchain::for_language(harness.language, dir);
        tracing::debug!(
            dir = %dir.display(),
            language = %harness.language,
            "Prepared scratch directory"
        );

        if let Some(compile) = &toolchain.compile {
            let out = run_process(
                compile,
                dir,
                "",
                self.opt.compile_timeout,
                self.opt.output_limit,
            )
            .await?;
            let diagnostics = strip_path_noise(&format!("{}{}", out.stderr, out.stdout), dir);
            let failure = match out.end {
                ProcessEnd::ToolMissing(tool) => Some(RunStatus::ToolMissing(tool)),
                ProcessEnd::Exited(status) if status.success() => None,
                ProcessEnd::Exited(_) | ProcessEnd::OutputLimitExceeded => {
                    Some(RunStatus::CompileError)
                }
                ProcessEnd::TimedOut => {
                    return Ok(RunOutput {
                        compile_output: format!(
                            "{}\nCompilation timed out after {} ms",
                            diagnostics,
                            self.opt.compile_timeout.as_millis()
                        )
                        .trim_start()
                        .to_owned(),
                        ..RunOutput::with_status(RunStatus::CompileError)
                    });
                }
            };
            if let Some(status) = failure {
                tracing::debug!(?status, "Compile step failed");
                return Ok(RunOutput {
                    compile_output: diagnostics,
                    ..RunOutput::with_status(status)
                });
            }
        }

        let out = run_process(
            &toolchain.run,
            dir,
            &harness.stdin,
            self.opt.timeout,
            self.opt.output_limit,
        )
        .await?;

        let status = match &out.end {
            ProcessEnd::ToolMissing(tool) => RunStatus::ToolMissing(tool.clone()),
            ProcessEnd::TimedOut => RunStatus::TimeLimitExceeded,
            ProcessEnd::OutputLimitExceeded => RunStatus::OutputLimitExceeded,
            ProcessEnd::Exited(status) => match describe_exit(status) {
                None => RunStatus::Finished,
                Some(detail) => RunStatus::RuntimeError(detail),
            },
        };
        let exit_code = match &out.end {
            ProcessEnd::Exited(status) => status.code(),
            _ => None,
        };
        let time_ms = match out.end {
            ProcessEnd::ToolMissing(_) => None,
            _ => Some(out.elapsed.as_secs_f64() * 1000.0),
        };

        Ok(RunOutput {
            status,
            stdout: out.stdout,
            stderr: strip_path_noise(&out.stderr, dir),
            compile_output: String::new(),
            exit_code,
            time_ms,
            memory_kb: None,
        })
        // `scratch` drops here and removes the directory.
    }
}

#[async_trait]
impl Executor for LocalSandboxExecutor {
    fn name(&self) -> Cow<'static, str> {
        "local sandbox".into()
    }

    async fn execute(
        &self,
        harness: &Harness,
        _expected: Option<&str>,
    ) -> anyhow::Result<RunOutput> {
        Ok(self.run(harness).await?)
    }
}
