use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::process::Command;

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Absolute path of `file`, taken relative to `cwd` or the process working directory.
pub fn resolve_task_file(file: &Path, cwd: Option<&Path>) -> io::Result<PathBuf> {
    if file.is_absolute() {
        return Ok(file.to_path_buf());
    }
    let base = match cwd {
        Some(dir) => std::path::absolute(dir)?,
        None => std::env::current_dir()?,
    };
    Ok(base.join(file))
}

/// `run <file> --json <extra..>`
pub fn invocation_args(file: &Path, extra: &[String]) -> Vec<String> {
    let mut args = Vec::with_capacity(extra.len() + 3);
    args.push("run".to_string());
    args.push(file.to_string_lossy().into_owned());
    args.push("--json".to_string());
    args.extend(extra.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_file_joins_cwd() {
        let p = resolve_task_file(Path::new("main.py"), Some(Path::new("/srv/app"))).unwrap();
        assert_eq!(p, PathBuf::from("/srv/app/main.py"));
    }

    #[test]
    fn absolute_file_is_kept() {
        let p = resolve_task_file(Path::new("/tmp/t.py"), Some(Path::new("/srv"))).unwrap();
        assert_eq!(p, PathBuf::from("/tmp/t.py"));
    }

    #[test]
    fn invocation_shape() {
        let args = invocation_args(Path::new("/a/b.py"), &["--verbose".into()]);
        assert_eq!(args, vec!["run", "/a/b.py", "--json", "--verbose"]);
    }
}
