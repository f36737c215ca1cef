use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::Path;

pub fn hashsum_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("hashsum");
    cmd.arg("-C").arg(cwd);
    cmd
}

#[allow(dead_code)]
/// Writes `content` to `root/relative`, creating parent directories.
pub fn write_source(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// Each integration test file is compiled as its own crate. Not all of them
// read digests back, so this helper is intentionally unused in some.
#[allow(dead_code)]
pub fn read_digest(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).expect("digest file should exist")
}

#[allow(dead_code)]
pub fn is_hex_of_len(content: &str, len: usize) -> bool {
    content.len() == len && content.bytes().all(|b| b.is_ascii_hexdigit())
}
