//! Expands the generator table into concrete targets.
//!
//! Every entry is rendered once per listed version with `version` in the
//! template context. Relative paths are anchored at the Packfile directory,
//! outputs under `output_dir` and fallbacks under `prebuilt_dir`.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use minijinja::{Environment, UndefinedBehavior, context};

use super::{ManifestError, TemplateField};
use crate::ast::{GeneratorEntry, Packfile};
use crate::target::{BuildMode, GenerationTarget};
use crate::toolchain::anchor_program;

/// A Packfile resolved against its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Build mode declared by the Packfile.
    pub mode: BuildMode,
    /// Interpreter for generator scripts. Bare names are left for `PATH`
    /// lookup; relative paths are anchored at the Packfile directory.
    pub interpreter: Option<Utf8PathBuf>,
    /// One target per entry and version, in declaration order.
    pub targets: Vec<GenerationTarget>,
    /// Static include roots.
    pub include_dirs: Vec<Utf8PathBuf>,
}

struct Roots {
    base: Utf8PathBuf,
    output: Utf8PathBuf,
    prebuilt: Utf8PathBuf,
}

/// Expand `packfile`, resolving relative paths against `base_dir`.
///
/// # Errors
///
/// Returns [`ManifestError`] when an entry lists no versions, a template
/// fails to render, a name cannot be derived, or two targets share a name.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use packgen::manifest;
///
/// let packfile = manifest::from_str(concat!(
///     "packgen_version: \"1.0.0\"\n",
///     "generators:\n",
///     "  - prebuilt: \"cle/v{{ version }}.h\"\n",
///     "    output: \"cle/v{{ version }}.h\"\n",
///     "    versions: [\"33\", \"42\"]\n",
/// ))?;
/// let expansion = manifest::expand(&packfile, Utf8Path::new("/src"))?;
/// assert_eq!(expansion.targets[1].output, "/src/build/cle/v42.h");
/// # Ok::<(), packgen::manifest::ManifestError>(())
/// ```
pub fn expand(packfile: &Packfile, base_dir: &Utf8Path) -> Result<Expansion, ManifestError> {
    let env = template_env();
    let roots = Roots {
        base: base_dir.to_owned(),
        output: base_dir.join(&packfile.output_dir),
        prebuilt: packfile
            .prebuilt_dir
            .as_ref()
            .map_or_else(|| base_dir.to_owned(), |dir| base_dir.join(dir)),
    };

    let mut names = IndexSet::new();
    let mut targets = Vec::new();
    for (index, entry) in packfile.generators.iter().enumerate() {
        let versions = entry.versions.as_slice();
        if versions.is_empty() {
            return Err(ManifestError::EmptyVersions { index });
        }
        for tag in versions {
            let target = expand_entry(&env, &roots, index, entry, &tag.to_string())?;
            if !names.insert(target.name.clone()) {
                return Err(ManifestError::DuplicateName { name: target.name });
            }
            targets.push(target);
        }
    }

    Ok(Expansion {
        mode: packfile.mode,
        interpreter: packfile
            .interpreter
            .as_deref()
            .map(|program| anchor_program(&roots.base, program)),
        targets,
        include_dirs: packfile
            .include_dirs
            .iter()
            .map(|dir| roots.base.join(dir))
            .collect(),
    })
}

fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

fn expand_entry(
    env: &Environment<'_>,
    roots: &Roots,
    index: usize,
    entry: &GeneratorEntry,
    version: &str,
) -> Result<GenerationTarget, ManifestError> {
    let render = |field: TemplateField, template: &str| {
        env.render_str(template, context! { version })
            .map_err(|source| ManifestError::Template {
                index,
                field,
                version: version.to_owned(),
                source,
            })
    };

    let output = render(TemplateField::Output, &entry.output)?;
    let name = match &entry.name {
        Some(template) => render(TemplateField::Name, template)?,
        None => Utf8Path::new(&output)
            .file_stem()
            .unwrap_or_default()
            .to_owned(),
    };
    if name.trim().is_empty() {
        return Err(ManifestError::Unnamed { index, output });
    }

    let mut target = GenerationTarget::new(name, roots.output.join(&output), version)
        .with_flags(entry.flags.iter().cloned());
    target.script = entry.script.as_ref().map(|path| roots.base.join(path));
    target.xml = entry.xml.as_ref().map(|path| roots.base.join(path));
    if let Some(template) = &entry.prebuilt {
        target.prebuilt = Some(roots.prebuilt.join(render(TemplateField::Prebuilt, template)?));
    }
    Ok(target)
}
