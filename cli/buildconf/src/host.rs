//! Facts about the machine running the configure step.

use buildconf_resolve::BuildHost;
use chrono::{DateTime, Local, TimeZone};
use sysinfo::System;

/// Name of the running OS as the metadata spells it.
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Collect the user, host name and time of this run.
pub fn build_host(command_line: String) -> BuildHost {
    BuildHost {
        user: user_name(),
        hostname: host_name(),
        timestamp: ctime(&Local::now()),
        command_line,
    }
}

/// Format a time the way C `ctime` does, without the trailing newline.
pub fn ctime<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%a %b %e %H:%M:%S %Y").to_string()
}

fn user_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn host_name() -> String {
    or_localhost(System::host_name())
}

fn or_localhost(name: Option<String>) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
