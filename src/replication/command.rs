//! Argument vectors for the dump and restore tools.
//!
//! Both commands run without a shell. Passwords travel only through the
//! child's `PGPASSWORD` variable.

use std::fmt;
use std::path::Path;

use crate::config::DbParams;

/// A fully resolved external command.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Short tool name used in logs and errors.
    pub tool: String,
    /// Executable to launch.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Extra environment for the child only.
    pub envs: Vec<(String, String)>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.envs.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("CommandSpec")
            .field("tool", &self.tool)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env_keys", &env_keys)
            .finish()
    }
}

fn connection_args(db: &DbParams) -> Vec<String> {
    vec![
        "-h".to_string(),
        db.host.clone(),
        "-p".to_string(),
        db.port.to_string(),
        "-U".to_string(),
        db.user.clone(),
        "-d".to_string(),
        db.dbname.clone(),
    ]
}

fn libpq_env(db: &DbParams) -> Vec<(String, String)> {
    let mut envs = vec![("PGPASSWORD".to_string(), db.password.clone())];
    if let Some(mode) = &db.ssl_mode {
        envs.push(("PGSSLMODE".to_string(), mode.clone()));
    }
    envs
}

/// `pg_dump -h H -p P -U U -d DB -Fc -f FILE` against `source`.
#[must_use]
pub fn dump_command(program: &str, source: &DbParams, dump_file: &Path) -> CommandSpec {
    let mut args = connection_args(source);
    args.push("-Fc".to_string());
    args.push("-f".to_string());
    args.push(dump_file.display().to_string());

    CommandSpec {
        tool: "pg_dump".to_string(),
        program: program.to_string(),
        args,
        envs: libpq_env(source),
    }
}

/// `pg_restore -h H -p P -U U -d DB --clean --if-exists FILE` against
/// `target`.
#[must_use]
pub fn restore_command(program: &str, target: &DbParams, dump_file: &Path) -> CommandSpec {
    let mut args = connection_args(target);
    args.push("--clean".to_string());
    args.push("--if-exists".to_string());
    args.push(dump_file.display().to_string());

    CommandSpec {
        tool: "pg_restore".to_string(),
        program: program.to_string(),
        args,
        envs: libpq_env(target),
    }
}
