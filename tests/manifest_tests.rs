//! Packfile loading, expansion and materialization through the library API.

use anyhow::{Result, bail, ensure};
use packgen::generator::GeneratorInvoker;
use packgen::manifest::{self, ManifestError};
use packgen::node::{BuildGraphNode, MaterializeOptions, TargetState};
use packgen::resolver::ResolverConfig;
use packgen::target::Strategy;
use rstest::rstest;
use test_support::Workspace;

#[rstest]
#[case("packgen_version: \"1.0.0\"\ngeneratorz: []\n", &["YAML error at line", "unknown field `generatorz`"])]
#[case("packgen_version: \"1.0.0\"\n", &["YAML error at line", "missing field `generators`"])]
#[case("packgen_version: \"1.0.0\"\nmode: fast\ngenerators: []\n", &["unknown variant `fast`"])]
#[case("packgen_version: \"1.0.0\"\ngenerators:\n  - output: 'open\n", &["YAML error at line"])]
fn yaml_diagnostics_are_actionable(#[case] yaml: &str, #[case] needles: &[&str]) -> Result<()> {
    let Err(err) = manifest::from_str(yaml) else {
        bail!("parse should fail");
    };
    ensure!(
        matches!(err, ManifestError::Parse { .. }),
        "expected a parse error, got {err}"
    );
    let mut chain = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = current {
        chain.push(e.to_string());
        current = e.source();
    }
    let msg = chain.join("\n");
    for needle in needles {
        ensure!(msg.contains(needle), "missing: {needle}\nmessage: {msg}");
    }
    Ok(())
}

#[test]
fn packfile_drives_a_full_build() -> Result<()> {
    let ws = Workspace::new()?;
    for version in ["33", "42"] {
        ws.write(
            &format!("prebuilt/cle/v3d_packet_v{version}_pack.h"),
            format!("#define V3D_VERSION {version}\n"),
        )?;
    }
    let path = ws.packfile(concat!(
        "packgen_version: \"1.2.0\"\n",
        "output_dir: out\n",
        "prebuilt_dir: prebuilt\n",
        "include_dirs: [include, include]\n",
        "generators:\n",
        "  - output: \"cle/v3d_packet_v{{ version }}_pack.h\"\n",
        "    prebuilt: \"cle/v3d_packet_v{{ version }}_pack.h\"\n",
        "    versions: [33, 42]\n",
    ))?;

    let packfile = manifest::from_path(&path)?;
    let expansion = manifest::expand(&packfile, ws.root())?;
    let mut node = BuildGraphNode::new(
        expansion.targets,
        expansion.include_dirs,
        ResolverConfig::new(expansion.mode, true),
        GeneratorInvoker::default(),
    )?;
    let report = node.materialize(&MaterializeOptions::default())?;

    ensure!(
        report
            .outputs
            .iter()
            .all(|out| out.strategy == Strategy::CopyFallback),
        "every target should copy"
    );
    ensure!(
        ws.read("out/cle/v3d_packet_v42_pack.h")? == b"#define V3D_VERSION 42\n",
        "v42 should be copied verbatim"
    );
    ensure!(
        node.target_state("v3d_packet_v33_pack") == Some(TargetState::Materialized),
        "v33 should be materialized"
    );
    ensure!(
        node.exported_include_dirs() == [ws.path("out/cle"), ws.path("include")],
        "unexpected include dirs {:?}",
        node.exported_include_dirs()
    );
    Ok(())
}

#[test]
fn unsupported_version_is_rejected_before_expansion() {
    let err = manifest::from_str("packgen_version: \"2.0.0\"\ngenerators: []\n")
        .expect_err("version 2 is unsupported");
    assert_eq!(err.to_string(), "unsupported packgen_version 2.0.0");
}
