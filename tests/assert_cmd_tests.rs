//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These tests invoke the compiled binary against throwaway source trees and
//! check the headers it leaves on disk, what it prints, and how it fails.
#![cfg(unix)]

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use camino::Utf8PathBuf;
use packgen_env::INTERPRETER_ENV;
use predicates::prelude::*;
use rstest::{fixture, rstest};
use test_support::{GeneratorStub, Workspace};

const VERSIONS: [&str; 4] = ["21", "33", "42", "71"];

fn packfile(extra: &str) -> String {
    format!(
        concat!(
            "packgen_version: \"1.0.0\"\n",
            "{}",
            "prebuilt_dir: prebuilt\n",
            "include_dirs: [include]\n",
            "generators:\n",
            "  - name: \"v{{{{ version }}}}\"\n",
            "    script: gen/gen_pack_header.sh\n",
            "    xml: xml/v3d_packet.xml\n",
            "    output: \"cle/v3d_packet_v{{{{ version }}}}_pack.h\"\n",
            "    prebuilt: \"cle/v3d_packet_v{{{{ version }}}}_pack.h\"\n",
            "    versions: [\"21\", \"33\", \"42\", \"71\"]\n",
        ),
        extra
    )
}

fn header(version: &str) -> String {
    format!("build/cle/v3d_packet_v{version}_pack.h")
}

fn prebuilt(version: &str) -> String {
    format!("prebuilt/cle/v3d_packet_v{version}_pack.h")
}

/// A source tree with a generator stub, an XML file and prebuilt fallbacks
/// for every version.
fn tree(stub: GeneratorStub, extra: &str) -> Result<Workspace> {
    let ws = Workspace::new()?;
    ws.stub("gen/gen_pack_header.sh", stub)?;
    ws.write("xml/v3d_packet.xml", "<vcxml/>\n")?;
    for version in VERSIONS {
        ws.write(&prebuilt(version), format!("/* prebuilt v{version} */\n"))?;
    }
    ws.packfile(&packfile(extra))?;
    Ok(ws)
}

#[fixture]
fn generating_tree() -> Workspace {
    tree(GeneratorStub::EchoVersion, "").expect("create source tree")
}

fn packgen(ws: &Workspace) -> Result<Command> {
    let mut cmd = Command::cargo_bin("packgen").context("locate packgen binary")?;
    cmd.current_dir(ws.root()).env_remove(INTERPRETER_ENV);
    Ok(cmd)
}

#[rstest]
fn build_runs_the_generator_for_every_version(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .args(["--interpreter", "/bin/sh", "build"])
        .assert()
        .success();
    for version in VERSIONS {
        let content = generating_tree.read(&header(version))?;
        ensure!(
            content == format!("HEADER-{version}").as_bytes(),
            "unexpected content for v{version}: {content:?}"
        );
    }
    Ok(())
}

#[rstest]
fn build_is_the_default_command(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .args(["--interpreter", "/bin/sh"])
        .assert()
        .success();
    ensure!(generating_tree.exists(&header("42")), "v42 should be built");
    Ok(())
}

#[rstest]
fn build_limits_work_to_named_targets(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .args(["--interpreter", "/bin/sh", "-j", "1", "build", "v42"])
        .assert()
        .success();
    ensure!(generating_tree.exists(&header("42")), "v42 should be built");
    ensure!(!generating_tree.exists(&header("21")), "v21 was not requested");
    Ok(())
}

#[test]
fn prebuilt_mode_copies_fallbacks() -> Result<()> {
    let ws = tree(
        GeneratorStub::Fail {
            code: 9,
            stderr: "generator must not run",
        },
        "mode: prebuilt\n",
    )?;
    packgen(&ws)?
        .args(["--interpreter", "/bin/sh"])
        .assert()
        .success();
    for version in VERSIONS {
        ensure!(
            ws.read(&header(version))? == ws.read(&prebuilt(version))?,
            "v{version} should match its prebuilt copy"
        );
    }
    Ok(())
}

#[rstest]
fn mode_flag_overrides_the_packfile(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .args(["--interpreter", "/bin/sh", "--mode", "prebuilt"])
        .assert()
        .success();
    ensure!(
        generating_tree.read(&header("33"))? == generating_tree.read(&prebuilt("33"))?,
        "--mode prebuilt should copy"
    );
    Ok(())
}

#[rstest]
fn missing_interpreter_falls_back_to_prebuilt(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .env(INTERPRETER_ENV, "/nonexistent/python3")
        .assert()
        .success()
        .stderr(predicate::str::contains("interpreter not found"));
    ensure!(
        generating_tree.read(&header("71"))? == generating_tree.read(&prebuilt("71"))?,
        "v71 should be copied"
    );
    Ok(())
}

#[rstest]
fn interpreter_env_var_is_used(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .env(INTERPRETER_ENV, "/bin/sh")
        .assert()
        .success();
    ensure!(
        generating_tree.read(&header("21"))? == b"HEADER-21",
        "generator should run through the env interpreter"
    );
    Ok(())
}

#[test]
fn failing_generator_exits_non_zero_and_reports_stderr() -> Result<()> {
    let ws = tree(GeneratorStub::PartialThenFail, "")?;
    packgen(&ws)?
        .args(["--interpreter", "/bin/sh"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("boom")
                .and(predicate::str::contains("v42"))
                .and(predicate::str::contains("4 of 4 targets failed")),
        );
    ensure!(!ws.exists("build/cle/v3d_packet_v42_pack.h"), "no partial header");
    Ok(())
}

#[rstest]
fn plan_describes_targets_without_writing(generating_tree: Workspace) -> Result<()> {
    let root = generating_tree.root().canonicalize_utf8()?;
    let expected_output = root.join(header("42"));
    packgen(&generating_tree)?
        .args(["--interpreter", "/bin/sh", "plan"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(format!("v42\tgenerate\t{expected_output}\t/bin/sh "))
                .and(predicate::str::contains("v3d_packet.xml 42")),
        );
    ensure!(!generating_tree.exists("build"), "plan must not write");
    Ok(())
}

#[rstest]
fn plan_reports_copies_in_prebuilt_mode(generating_tree: Workspace) -> Result<()> {
    let root = generating_tree.root().canonicalize_utf8()?;
    let line = format!(
        "v21\tcopy-fallback\t{}\t{}",
        root.join(header("21")),
        root.join(prebuilt("21"))
    );
    packgen(&generating_tree)?
        .args(["--mode", "prebuilt", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains(line));
    Ok(())
}

#[rstest]
fn include_dirs_lists_output_parents_then_static_roots(
    generating_tree: Workspace,
) -> Result<()> {
    let root: Utf8PathBuf = generating_tree.root().canonicalize_utf8()?;
    let expected = format!("{}\n{}\n", root.join("build/cle"), root.join("include"));
    packgen(&generating_tree)?
        .arg("include-dirs")
        .assert()
        .success()
        .stdout(expected);
    ensure!(!generating_tree.exists("build"), "include-dirs must not write");
    Ok(())
}

#[rstest]
fn directory_flag_locates_the_packfile(generating_tree: Workspace) -> Result<()> {
    let mut cmd = Command::cargo_bin("packgen").context("locate packgen binary")?;
    cmd.env_remove(INTERPRETER_ENV)
        .arg("-C")
        .arg(generating_tree.root())
        .args(["--interpreter", "/bin/sh", "build"])
        .assert()
        .success();
    ensure!(generating_tree.exists(&header("21")), "v21 should be built");
    Ok(())
}

#[rstest]
fn directory_flag_keeps_bare_interpreter_on_path(generating_tree: Workspace) -> Result<()> {
    let mut cmd = Command::cargo_bin("packgen").context("locate packgen binary")?;
    cmd.env_remove(INTERPRETER_ENV)
        .arg("-C")
        .arg(generating_tree.root())
        .args(["--interpreter", "sh", "build"])
        .assert()
        .success();
    for version in VERSIONS {
        let content = generating_tree.read(&header(version))?;
        ensure!(
            content == format!("HEADER-{version}").as_bytes(),
            "v{version} should come from the generator, got {content:?}"
        );
    }
    Ok(())
}

#[rstest]
fn unknown_target_is_rejected(generating_tree: Workspace) -> Result<()> {
    packgen(&generating_tree)?
        .args(["build", "v99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target `v99`"));
    Ok(())
}

#[test]
fn missing_packfile_is_reported() -> Result<()> {
    let ws = Workspace::new()?;
    packgen(&ws)?
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Packfile not found in the current directory",
        ));
    Ok(())
}

#[test]
fn malformed_packfile_is_reported() -> Result<()> {
    let ws = Workspace::new()?;
    ws.packfile("packgen_version: \"1.0.0\"\ngenerators: [\n")?;
    packgen(&ws)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
    Ok(())
}

#[rstest]
#[case(&["-j", "0"])]
#[case(&["--mode", "sometimes"])]
fn invalid_flags_are_usage_errors(
    generating_tree: Workspace,
    #[case] args: &[&str],
) -> Result<()> {
    packgen(&generating_tree)?.args(args).assert().code(2);
    Ok(())
}
