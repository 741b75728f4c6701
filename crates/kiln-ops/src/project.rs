//! A loaded project: manifest, registry and resolver settings.

use std::path::{Path, PathBuf};

use kiln_core::config::GlobalConfig;
use kiln_core::manifest::Manifest;
use kiln_core::{LOCKFILE_FILE, MANIFEST_FILE};
use kiln_resolver::{LocalRegistry, Registry, Requirement, Resolution, ResolveOptions, Resolver};
use kiln_util::errors::KilnError;

/// Settings given on the command line, taking precedence over files.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub registry: Option<PathBuf>,
    pub strict: bool,
}

pub struct Project {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub registry: LocalRegistry,
    pub options: ResolveOptions,
}

impl Project {
    /// Find the nearest `Kiln.toml` at or above `start` and load it.
    pub fn discover(start: &Path, overrides: &Overrides) -> miette::Result<Self> {
        let root = kiln_util::fs::find_ancestor_with(start, MANIFEST_FILE).ok_or_else(|| {
            KilnError::Manifest {
                message: format!("No {MANIFEST_FILE} found in {} or any parent", start.display()),
            }
        })?;
        Self::load(&root, overrides, &GlobalConfig::load()?)
    }

    /// Load the project rooted at `root`.
    pub fn load(root: &Path, overrides: &Overrides, config: &GlobalConfig) -> miette::Result<Self> {
        let manifest = Manifest::from_path(&root.join(MANIFEST_FILE))?;
        let index = registry_root(root, &manifest, overrides, config)?;
        tracing::debug!("Using registry index {}", index.display());

        Ok(Self {
            root: root.to_path_buf(),
            registry: LocalRegistry::new(index),
            options: ResolveOptions {
                strict: overrides.strict || config.resolver.strict,
                max_depth: config.resolver.max_depth,
            },
            manifest,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_FILE)
    }

    /// Root requirements, dev-dependencies included.
    pub fn requirements(&self) -> Vec<Requirement> {
        self.manifest
            .requirements(true)
            .into_iter()
            .map(|(name, constraint)| Requirement::new(name, constraint))
            .collect()
    }

    /// Fingerprint stored in `Kiln.lock`: the manifest plus the registry and
    /// resolver settings in effect.
    pub fn lock_hash(&self) -> String {
        let manifest = self.manifest.resolution_hash();
        let strict = self.options.strict.to_string();
        let max_depth = self.options.max_depth.to_string();
        kiln_util::hash::sha256_pairs([
            ("manifest", manifest.as_str()),
            ("registry", self.registry.id()),
            ("strict", strict.as_str()),
            ("max-depth", max_depth.as_str()),
        ])
    }

    /// Resolve the project's dependencies against its registry.
    pub fn resolve(&self) -> miette::Result<Resolution> {
        let package = &self.manifest.package;
        let resolution = Resolver::new(&self.registry)
            .with_options(self.options)
            .resolve_package(&package.name, &package.version, &self.requirements())?;
        Ok(resolution)
    }
}

/// The index directory to use: `--registry`, then the manifest's
/// `[registry]` (relative to the project), then the global config.
fn registry_root(
    root: &Path,
    manifest: &Manifest,
    overrides: &Overrides,
    config: &GlobalConfig,
) -> miette::Result<PathBuf> {
    let chosen = if let Some(path) = &overrides.registry {
        path.clone()
    } else if let Some(index) = manifest.registry.as_ref().and_then(|r| r.index.as_deref()) {
        root.join(index)
    } else if let Some(index) = config.registry.index.as_deref() {
        PathBuf::from(index)
    } else {
        return Err(KilnError::Registry {
            message: "no registry index configured; pass --registry or set [registry] index"
                .to_string(),
        }
        .into());
    };

    if !chosen.is_dir() {
        return Err(KilnError::Registry {
            message: format!("registry index {} is not a directory", chosen.display()),
        }
        .into());
    }
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::config::RegistryConfig;

    fn scratch(manifest: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), manifest).unwrap();
        std::fs::create_dir(tmp.path().join("index")).unwrap();
        tmp
    }

    const PLAIN: &str = "[package]\nname = \"app\"\nversion = \"0.1.0\"\n";

    #[test]
    fn manifest_registry_is_relative_to_project() {
        let tmp = scratch(&format!("{PLAIN}[registry]\nindex = \"index\"\n"));
        let project = Project::load(tmp.path(), &Overrides::default(), &GlobalConfig::default())
            .unwrap();
        assert_eq!(project.registry.root(), tmp.path().join("index"));
        assert!(!project.options.strict);
    }

    #[test]
    fn override_beats_manifest_and_config() {
        let tmp = scratch(&format!("{PLAIN}[registry]\nindex = \"missing\"\n"));
        let overrides = Overrides {
            registry: Some(tmp.path().join("index")),
            strict: true,
        };
        let project = Project::load(tmp.path(), &overrides, &GlobalConfig::default()).unwrap();
        assert_eq!(project.registry.root(), tmp.path().join("index"));
        assert!(project.options.strict);
    }

    #[test]
    fn global_config_is_the_fallback() {
        let tmp = scratch(PLAIN);
        let config = GlobalConfig {
            registry: RegistryConfig {
                index: Some(tmp.path().join("index").display().to_string()),
            },
            ..GlobalConfig::default()
        };
        let project = Project::load(tmp.path(), &Overrides::default(), &config).unwrap();
        assert_eq!(project.options.max_depth, 64);
    }

    #[test]
    fn lock_hash_tracks_resolver_settings() {
        let tmp = scratch(&format!("{PLAIN}[registry]\nindex = \"index\"\n"));
        std::fs::create_dir(tmp.path().join("other")).unwrap();
        let load = |overrides: Overrides| {
            Project::load(tmp.path(), &overrides, &GlobalConfig::default()).unwrap()
        };

        let base = load(Overrides::default()).lock_hash();
        assert_eq!(load(Overrides::default()).lock_hash(), base);
        let strict = load(Overrides {
            strict: true,
            ..Overrides::default()
        });
        assert_ne!(strict.lock_hash(), base);
        let moved = load(Overrides {
            registry: Some(tmp.path().join("other")),
            ..Overrides::default()
        });
        assert_ne!(moved.lock_hash(), base);
    }

    #[test]
    fn no_registry_is_an_error() {
        let tmp = scratch(PLAIN);
        let err = Project::load(tmp.path(), &Overrides::default(), &GlobalConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("no registry index configured"));
    }

    #[test]
    fn discover_walks_up() {
        let tmp = scratch(PLAIN);
        let nested = tmp.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        let overrides = Overrides {
            registry: Some(tmp.path().join("index")),
            strict: false,
        };
        let project = Project::discover(&nested, &overrides).unwrap();
        assert_eq!(project.root, tmp.path());
        assert_eq!(project.manifest.package.name, "app");
    }
}
