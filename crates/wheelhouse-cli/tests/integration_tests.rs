//! End-to-end tests driving the `wheelhouse` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const TV: &str = "torchvision-0.16.0+cu121torch2.1.0-cp310-cp310-win_amd64.whl";

/// Test context with a scratch wheel repository
struct TestContext {
    temp_dir: TempDir,
    root: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().join("repo");
        std::fs::create_dir_all(&root).expect("failed to create repo root");
        Self { temp_dir, root }
    }

    fn add_wheel(&self, library: &str, bucket: &str, filename: &str) {
        let dir = self.root.join(library).join(bucket);
        std::fs::create_dir_all(&dir).expect("failed to create bucket");
        std::fs::write(dir.join(filename), b"").expect("failed to write wheel");
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_wheelhouse");
        let mut cmd = Command::new(bin_path);
        cmd.current_dir(self.temp_dir.path());
        for var in [
            "WHEELHOUSE_REPO_URL",
            "WHEELHOUSE_PLATFORM",
            "WHEELHOUSE_INDEX",
            "WHEELHOUSE_PYTHON",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn build(&self, output: &Path, extra: &[&str]) -> Output {
        self.cmd()
            .arg("build")
            .arg(&self.root)
            .arg("--output")
            .arg(output)
            .arg("--repo-url")
            .arg("https://example.com/repo/")
            .args(extra)
            .output()
            .expect("failed to run wheelhouse build")
    }
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .arg("--help")
        .output()
        .expect("failed to run wheelhouse");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("find"));
}

#[test]
fn test_build_writes_index() {
    let ctx = TestContext::new();
    ctx.add_wheel("torchvision", "0.16.0", TV);
    ctx.add_wheel("torchvision", "0.16.0", "README.txt");
    ctx.add_wheel("torchvision", "0.16.0", "torchvision-0.16.0-py3-none-any.whl");

    let index_path = ctx.path("wheels.json");
    let output = ctx.build(&index_path, &[]);
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let text = std::fs::read_to_string(&index_path).expect("index should exist");
    let json: serde_json::Value = serde_json::from_str(&text).expect("index should be JSON");
    assert_eq!(
        json,
        serde_json::json!([{
            "cuda-version": "12.1",
            "torch-version": "2.1.0",
            "python-version": "3.10.0",
            "download-link": format!("https://example.com/repo/raw/main/torchvision/0.16.0/{TV}"),
        }])
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 entries"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("py3-none-any"), "skipped wheel should be reported");
}

#[test]
fn test_build_is_reproducible() {
    let ctx = TestContext::new();
    ctx.add_wheel("torchvision", "0.16.0", TV);
    ctx.add_wheel(
        "torchvision",
        "0.17.0",
        "torchvision-0.17.0+cu121torch2.2.0-cp311-cp311-win_amd64.whl",
    );
    ctx.add_wheel(
        "flash_attn",
        "2.5.8",
        "flash_attn-2.5.8+cu118torch2.1.0-cp39-cp39-win_amd64.whl",
    );

    let first = ctx.path("first.json");
    let second = ctx.path("second.json");
    assert!(ctx.build(&first, &[]).status.success());
    assert!(ctx.build(&second, &[]).status.success());

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[test]
fn test_build_strict_rejects_duplicates() {
    let ctx = TestContext::new();
    ctx.add_wheel("torchvision", "0.16.0", TV);
    ctx.add_wheel(
        "torchvision",
        "0.16.0.post1",
        "torchvision-0.16.0.post1+cu121torch2.1.0-cp310-cp310-win_amd64.whl",
    );

    let lenient = ctx.path("lenient.json");
    let output = ctx.build(&lenient, &[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("warning:"));

    let strict = ctx.path("strict.json");
    let output = ctx.build(&strict, &["--strict"]);
    assert!(!output.status.success());
    assert!(!strict.exists());
}

#[test]
fn test_build_requires_repo_url() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .arg("build")
        .arg(&ctx.root)
        .output()
        .expect("failed to run wheelhouse build");
    assert!(!output.status.success());
}

#[test]
fn test_find_without_index() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .arg("find")
        .arg("torchvision")
        .arg("--index")
        .arg(ctx.path("missing.json"))
        .output()
        .expect("failed to run wheelhouse find");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("wheelhouse build"),
        "should tell the user to build the index first: {stderr}"
    );
}

#[test]
fn test_find_without_python() {
    let ctx = TestContext::new();
    ctx.add_wheel("torchvision", "0.16.0", TV);
    let index_path = ctx.path("wheels.json");
    assert!(ctx.build(&index_path, &[]).status.success());

    let output = ctx
        .cmd()
        .arg("find")
        .arg("torchvision")
        .arg("--index")
        .arg(&index_path)
        .arg("--python")
        .arg(ctx.path("no-such-python"))
        .output()
        .expect("failed to run wheelhouse find");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No Python interpreter"), "{stderr}");
}

#[test]
fn test_readme_section_is_regenerated() {
    let ctx = TestContext::new();
    ctx.add_wheel("torchvision", "0.16.0", TV);
    let index_path = ctx.path("wheels.json");
    assert!(ctx.build(&index_path, &[]).status.success());

    let readme = ctx.path("README.md");
    std::fs::write(
        &readme,
        "# Wheels\n<!-- BEGIN_WHEELS_SECTION -->\nstale\n<!-- END_WHEELS_SECTION -->\n",
    )
    .unwrap();

    let output = ctx
        .cmd()
        .arg("readme")
        .arg("--readme")
        .arg(&readme)
        .arg("--wheels")
        .arg(&index_path)
        .output()
        .expect("failed to run wheelhouse readme");
    assert!(output.status.success());

    let updated = std::fs::read_to_string(&readme).unwrap();
    assert!(!updated.contains("stale"));
    assert!(updated.contains("| `torchvision` | 3.10.0 | 2.1.0 | 12.1 |"));
    assert!(updated.ends_with("<!-- END_WHEELS_SECTION -->\n"));
}
