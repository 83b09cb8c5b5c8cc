//! `extforge probe` command
//!
//! Shows the host facts a build would use.

use anyhow::Result;

use extforge::util::process::{find_cmake, find_python};
use extforge::util::shell::Shell;
use extforge::HostFacts;

pub fn execute(shell: &Shell) -> Result<()> {
    let host = HostFacts::probe();
    let cmake = find_cmake();
    let python = find_python();

    if shell.is_json() {
        let value = serde_json::json!({
            "reason": "host-facts",
            "os_family": host.os_family,
            "logical_cpus": host.logical_cpus,
            "pointer_width": host.pointer_width,
            "module_suffix": host.os_family.module_suffix(),
            "cmake": cmake,
            "python": python,
        });
        println!("{}", value);
        return Ok(());
    }

    let cpus = host
        .logical_cpus
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let found = |path: Option<std::path::PathBuf>| {
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    };

    println!("os family:     {}", host.os_family);
    println!("logical cpus:  {}", cpus);
    println!("pointer width: {}", host.pointer_width);
    println!("module suffix: {}", host.os_family.module_suffix());
    println!("cmake:         {}", found(cmake));
    println!("python:        {}", found(python));
    Ok(())
}
