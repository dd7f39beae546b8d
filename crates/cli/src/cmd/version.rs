use serde::Serialize;

use crate::output::{print_json, theme, OutputMode};

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    arch: &'static str,
    os: &'static str,
}

pub fn execute(mode: OutputMode) {
    let info = VersionInfo {
        name: "tripwirectl",
        version: env!("CARGO_PKG_VERSION"),
        arch: std::env::consts::ARCH,
        os: std::env::consts::OS,
    };

    match mode {
        OutputMode::Json => {
            let _ = print_json(&info);
        }
        OutputMode::Human => {
            theme::print_header("tripwire");
            theme::print_kv("version", info.version);
            theme::print_kv("target", &format!("{}-{}", info.arch, info.os));
            println!();
        }
    }
}
