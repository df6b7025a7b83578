//! Strategy selection for generation targets.
//!
//! The resolver never touches the filesystem or the environment: everything
//! it needs arrives through [`ResolverConfig`], so the same target and
//! configuration always resolve the same way.

use camino::Utf8Path;

use crate::error::TargetError;
use crate::target::{BuildMode, GenerationTarget, Strategy};

/// Build-wide inputs to strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Requested build mode.
    pub mode: BuildMode,
    /// Whether the generator toolchain can be launched on this host.
    pub toolchain_available: bool,
}

impl ResolverConfig {
    /// Bundle a build mode with the toolchain probe result.
    #[must_use]
    pub const fn new(mode: BuildMode, toolchain_available: bool) -> Self {
        Self {
            mode,
            toolchain_available,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(BuildMode::Generate, true)
    }
}

/// A resolved strategy together with the inputs it will read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan<'a> {
    /// Run `script` against `xml`.
    Generate {
        /// Generator script.
        script: &'a Utf8Path,
        /// XML packet description.
        xml: &'a Utf8Path,
    },
    /// Copy `source` into place.
    CopyFallback {
        /// Prebuilt header.
        source: &'a Utf8Path,
    },
}

impl Plan<'_> {
    /// The strategy this plan carries out.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Generate { .. } => Strategy::Generate,
            Self::CopyFallback { .. } => Strategy::CopyFallback,
        }
    }
}

/// Decides between generation and fallback copy for each target.
///
/// ```
/// use packgen::resolver::{ArtifactResolver, ResolverConfig};
/// use packgen::target::{BuildMode, GenerationTarget, Strategy};
///
/// let resolver = ArtifactResolver::new(ResolverConfig::new(BuildMode::Prebuilt, true));
/// let target = GenerationTarget::new("v42", "cle/v42.h", "42")
///     .with_generator("gen.py", "packet.xml")
///     .with_prebuilt("prebuilt/cle/v42.h");
/// assert_eq!(resolver.resolve(&target).ok(), Some(Strategy::CopyFallback));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactResolver {
    config: ResolverConfig,
}

impl ArtifactResolver {
    /// Create a resolver for one build configuration.
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Configuration this resolver applies.
    #[must_use]
    pub const fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Pick the strategy for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Configuration`] when the target has no usable
    /// strategy.
    pub fn resolve(&self, target: &GenerationTarget) -> Result<Strategy, TargetError> {
        self.plan(target).map(|plan| plan.strategy())
    }

    /// Pick the strategy for `target` and borrow the inputs it will read.
    ///
    /// A fallback wins when it is the only option, when the build asks for
    /// prebuilt headers, or when the generator toolchain is missing. A
    /// generator without an XML source is unusable on its own.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Configuration`] when the target has no usable
    /// strategy.
    pub fn plan<'a>(&self, target: &'a GenerationTarget) -> Result<Plan<'a>, TargetError> {
        let generator = target.script.as_deref().zip(target.xml.as_deref());
        let prefer_fallback =
            self.config.mode == BuildMode::Prebuilt || !self.config.toolchain_available;

        match (generator, target.prebuilt.as_deref()) {
            (Some((script, xml)), Some(source)) => Ok(if prefer_fallback {
                Plan::CopyFallback { source }
            } else {
                Plan::Generate { script, xml }
            }),
            (Some((script, xml)), None) => Ok(Plan::Generate { script, xml }),
            (None, Some(source)) => Ok(Plan::CopyFallback { source }),
            (None, None) => Err(TargetError::Configuration {
                target: target.name.clone(),
                reason: if target.script.is_some() {
                    "the generator script has no XML source and no prebuilt fallback exists"
                } else {
                    "neither a generator script nor a prebuilt fallback is configured"
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn both() -> GenerationTarget {
        GenerationTarget::new("both", "out/both.h", "42")
            .with_generator("gen.py", "packet.xml")
            .with_prebuilt("prebuilt/both.h")
    }

    #[rstest]
    #[case(BuildMode::Generate, true, Strategy::Generate)]
    #[case(BuildMode::Generate, false, Strategy::CopyFallback)]
    #[case(BuildMode::Prebuilt, true, Strategy::CopyFallback)]
    #[case(BuildMode::Prebuilt, false, Strategy::CopyFallback)]
    fn both_configured_follows_mode_and_toolchain(
        #[case] mode: BuildMode,
        #[case] toolchain: bool,
        #[case] expected: Strategy,
    ) {
        let resolver = ArtifactResolver::new(ResolverConfig::new(mode, toolchain));
        assert_eq!(resolver.resolve(&both()).ok(), Some(expected));
    }

    #[rstest]
    #[case(BuildMode::Generate)]
    #[case(BuildMode::Prebuilt)]
    fn fallback_only_always_copies(#[case] mode: BuildMode) {
        let resolver = ArtifactResolver::new(ResolverConfig::new(mode, true));
        let target = GenerationTarget::new("fb", "fb.h", "21").with_prebuilt("prebuilt/fb.h");
        assert_eq!(resolver.resolve(&target).ok(), Some(Strategy::CopyFallback));
    }

    #[rstest]
    #[case(BuildMode::Generate, true)]
    #[case(BuildMode::Prebuilt, false)]
    fn generator_only_always_generates(#[case] mode: BuildMode, #[case] toolchain: bool) {
        let resolver = ArtifactResolver::new(ResolverConfig::new(mode, toolchain));
        let target = GenerationTarget::new("gen", "gen.h", "21").with_generator("g.py", "p.xml");
        let plan = resolver.plan(&target).expect("plan");
        assert_eq!(
            plan,
            Plan::Generate {
                script: Utf8Path::new("g.py"),
                xml: Utf8Path::new("p.xml"),
            }
        );
    }

    #[test]
    fn unconfigured_target_is_a_configuration_error() {
        let resolver = ArtifactResolver::default();
        let target = GenerationTarget::new("empty", "empty.h", "21");
        let err = resolver.resolve(&target).expect_err("should fail");
        assert!(matches!(err, TargetError::Configuration { .. }));
        assert_eq!(err.target(), "empty");
    }

    #[test]
    fn script_without_xml_needs_a_fallback() {
        let resolver = ArtifactResolver::default();
        let mut target = GenerationTarget::new("noxml", "noxml.h", "21");
        target.script = Some("gen.py".into());
        let err = resolver.resolve(&target).expect_err("should fail");
        assert!(err.to_string().contains("no XML source"), "{err}");

        let fallback = target.with_prebuilt("prebuilt/noxml.h");
        assert_eq!(resolver.resolve(&fallback).ok(), Some(Strategy::CopyFallback));
    }
}
