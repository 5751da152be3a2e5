use std::{borrow::Cow, path::Path};

#[cfg(unix)]
/// Describe a signal code (>=0).
pub fn strsignal(signal: i32) -> Cow<'static, str> {
    let c_buf = unsafe { libc::strsignal(signal as libc::c_int) };
    if c_buf.is_null() {
        return format!("signal {}", signal).into();
    }
    let c_str = unsafe { std::ffi::CStr::from_ptr(c_buf) };
    c_str.to_string_lossy().into_owned().into()
}

#[cfg(not(unix))]
pub fn strsignal(signal: i32) -> Cow<'static, str> {
    format!("signal {}", signal).into()
}

/// Kill every process in the group led by `pid`.
#[cfg(unix)]
pub fn kill_process_group(pid: u32) {
    // Failing with ESRCH just means the group is already gone.
    unsafe {
        libc::killpg(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
pub fn kill_process_group(_pid: u32) {}

/// Block until child `pid` has exited, leaving it unreaped. While the zombie
/// exists its pid, and with it the process group id, cannot be reused.
#[cfg(unix)]
pub fn wait_exit_unreaped(pid: u32) -> std::io::Result<()> {
    loop {
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
pub fn wait_exit_unreaped(_pid: u32) -> std::io::Result<()> {
    Ok(())
}

/// Remove the scratch directory prefix from compiler diagnostics.
pub fn strip_path_noise(text: &str, dir: &Path) -> String {
    let mut prefixes = vec![dir.to_path_buf()];
    if let Ok(canonical) = dir.canonicalize() {
        if canonical != dir {
            prefixes.push(canonical);
        }
    }
    let mut out = text.to_owned();
    for prefix in prefixes {
        let prefix = prefix.display().to_string();
        out = out.replace(&format!("{}/", prefix), "").replace(&prefix, "");
    }
    out
}
