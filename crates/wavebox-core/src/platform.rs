use std::path::PathBuf;

#[cfg(unix)]
pub fn mpv_socket_path(token: u64) -> String {
    format!("{}/wavebox-mpv-{}.sock", std::env::temp_dir().display(), token)
}

#[cfg(windows)]
pub fn mpv_socket_path(token: u64) -> String {
    format!("wavebox-mpv-{}", token)
}

#[cfg(unix)]
pub fn mpv_socket_arg(token: u64) -> String {
    format!("--input-ipc-server={}", mpv_socket_path(token))
}

#[cfg(windows)]
pub fn mpv_socket_arg(token: u64) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", mpv_socket_path(token))
}

pub fn data_dir() -> PathBuf {
    // Use ~/.local/share/wavebox on all unixes (XDG layout, also on macOS,
    // to avoid the Application Support folder).
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("wavebox")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wavebox")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("wavebox")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wavebox")
    }
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

/// Find the mpv binary: beside the current executable first (bundled
/// distribution), then on PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let exe_name = mpv_binary_name();

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local_mpv = dir.join(exe_name);
            if local_mpv.exists() {
                return Some(local_mpv);
            }
        }
    }

    let path = std::env::var("PATH").ok()?;
    #[cfg(unix)]
    let sep = ":";
    #[cfg(windows)]
    let sep = ";";
    for dir in path.split(sep) {
        let p = PathBuf::from(dir).join(exe_name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}
