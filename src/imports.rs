//! # Import Graph Collection
//!
//! Determines which external packages a project actually uses. The project
//! tree is walked for package directories, each package's imports (including
//! test and external-test imports) are loaded, and every referenced
//! non-standard package is expanded in turn until the closure is complete.
//! The result is the sorted set of repository roots those packages live in,
//! excluding the project's own packages.
//!
//! Only directories holding `.go` files are loaded as project packages.
//! Package metadata comes from a `PackageLoader`. The default loader shells
//! out to `go list`; tests substitute a table. If `go` itself cannot be run
//! the collection fails rather than reporting an empty import set.
//!
//! Expansion proceeds one level at a time, loading every package in a level
//! in parallel with rayon.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::gopath::SourceRoots;
use crate::path::{has_git_dir, is_skipped_dir};

/// Pseudo-import used by cgo.
pub const CGO_PSEUDO_IMPORT: &str = "C";

/// Metadata for one Go package, as reported by `go list -json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GoPackage {
    pub import_path: String,
    /// The GOPATH entry (or GOROOT) containing the package.
    pub root: String,
    pub goroot: bool,
    pub standard: bool,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
    #[serde(rename = "XTestImports")]
    pub xtest_imports: Vec<String>,
    pub error: Option<PackageError>,
}

/// A load error reported by `go list -e`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageError {
    pub err: String,
}

impl GoPackage {
    /// True for packages shipped with the Go distribution.
    pub fn is_standard(&self) -> bool {
        self.goroot || self.standard
    }

    /// The `src` directory the package's import path is relative to.
    fn src_root(&self) -> Option<PathBuf> {
        (!self.root.is_empty()).then(|| Path::new(&self.root).join("src"))
    }
}

/// Loads package metadata.
pub trait PackageLoader: Send + Sync {
    /// Loads the package named by `target` (an import path or a directory),
    /// resolving relative to `src_dir`.
    fn load(&self, target: &str, src_dir: &Path) -> Result<GoPackage>;
}

/// A `PackageLoader` that runs `go list` in GOPATH mode.
#[derive(Debug, Clone)]
pub struct GoListLoader {
    gopath: OsString,
}

impl GoListLoader {
    pub fn new(roots: &SourceRoots) -> Self {
        Self {
            gopath: roots.gopath(),
        }
    }
}

impl PackageLoader for GoListLoader {
    fn load(&self, target: &str, src_dir: &Path) -> Result<GoPackage> {
        let output = Command::new("go")
            .args(["list", "-e", "-json", target])
            .current_dir(src_dir)
            .env("GO111MODULE", "off")
            .env("GOPATH", &self.gopath)
            .output()
            .map_err(|e| Error::Toolchain {
                program: "go".to_string(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Resolution {
                import: target.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let package = serde_json::Deserializer::from_slice(&output.stdout)
            .into_iter::<GoPackage>()
            .next()
            .ok_or_else(|| Error::Resolution {
                import: target.to_string(),
                message: "go list produced no output".to_string(),
            })??;
        match &package.error {
            Some(error) => Err(Error::Resolution {
                import: target.to_string(),
                message: error.err.clone(),
            }),
            None => Ok(package),
        }
    }
}

/// Returns the directories under `dir` that may hold project packages,
/// skipping hidden, underscore-prefixed, and `vendor` directories.
pub fn package_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_skipped_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    dirs.sort();
    dirs
}

/// True if `dir` directly contains a `.go` source file.
pub fn has_go_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|entry| entry.ok()).any(|entry| {
                entry.path().extension().is_some_and(|ext| ext == "go")
                    && entry.file_type().is_ok_and(|t| !t.is_dir())
            })
        })
        .unwrap_or(false)
}

/// Walks upward from `import` to the nearest directory under `src_root` that
/// contains `.git`, returning its import path. Falls back to `import`.
pub fn find_repo_root(src_root: Option<&Path>, import: &str) -> String {
    let Some(src_root) = src_root else {
        return import.to_string();
    };
    let mut candidate = import;
    loop {
        if has_git_dir(&src_root.join(candidate)) {
            return candidate.to_string();
        }
        match candidate.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => candidate = parent,
            _ => return import.to_string(),
        }
    }
}

/// Collects the sorted, de-duplicated repository roots of every external
/// package the project in `dir` depends on, directly or transitively.
pub fn collect_root_package_names(
    roots: &SourceRoots,
    loader: &dyn PackageLoader,
    dir: &Path,
) -> Result<Vec<String>> {
    let dir = std::path::absolute(dir)?;
    let dirs = package_dirs(&dir);
    debug!("found {} package directories under {}", dirs.len(), dir.display());

    // Imports of the project's own packages, tests included. A package that
    // fails to load is skipped; a tool that cannot run fails the collection.
    let loaded: Vec<GoPackage> = dirs
        .par_iter()
        .filter(|one| has_go_files(one))
        .map(|one| match loader.load(&one.to_string_lossy(), &dir) {
            Ok(pkg) => Ok(Some(pkg)),
            Err(e @ Error::Toolchain { .. }) => Err(e),
            Err(e) => {
                warn!("skipping package in {}: {}", one.display(), e);
                Ok(None)
            }
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    let direct: BTreeSet<String> = loaded
        .into_iter()
        .filter(|pkg| !pkg.is_standard())
        .flat_map(|pkg| {
            pkg.imports
                .into_iter()
                .chain(pkg.test_imports)
                .chain(pkg.xtest_imports)
        })
        .collect();

    let mut repo_roots: HashMap<String, String> = HashMap::new();
    let mut seen: HashSet<String> = direct.iter().cloned().collect();
    let mut frontier: Vec<String> = direct.into_iter().collect();

    while !frontier.is_empty() {
        let loaded: Vec<(String, Option<GoPackage>)> = frontier
            .par_iter()
            .map(|name| match loader.load(name, &dir) {
                Ok(pkg) => Ok((name.clone(), Some(pkg))),
                Err(e @ Error::Toolchain { .. }) => Err(e),
                Err(e) => {
                    debug!("{}", e);
                    Ok((name.clone(), None))
                }
            })
            .collect::<Result<_>>()?;

        let mut next = BTreeSet::new();
        for (name, pkg) in loaded {
            match pkg {
                Some(pkg) if pkg.is_standard() => {}
                Some(pkg) => {
                    let root = find_repo_root(pkg.src_root().as_deref(), &name);
                    repo_roots.insert(name, root);
                    next.extend(pkg.imports.into_iter().filter(|i| !seen.contains(i)));
                }
                // Unresolvable: it can't be expanded, but it is still a dependency.
                None => {
                    repo_roots.insert(name.clone(), name);
                }
            }
        }
        seen.extend(next.iter().cloned());
        frontier = next.into_iter().collect();
    }

    for one in &dirs {
        let own = roots
            .import_path_of(one)
            .unwrap_or_else(|| one.to_string_lossy().into_owned());
        repo_roots.remove(&own);
    }
    repo_roots.remove(CGO_PSEUDO_IMPORT);

    let names: BTreeSet<String> = repo_roots
        .into_iter()
        .filter(|(import, root)| {
            !import.is_empty() && !root.is_empty() && !import.ends_with("_test")
        })
        .map(|(_, root)| root)
        .collect();
    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Serves packages from a table keyed by load target.
    #[derive(Default)]
    struct TableLoader {
        packages: HashMap<String, GoPackage>,
    }

    impl TableLoader {
        fn add(&mut self, target: impl Into<String>, pkg: GoPackage) {
            self.packages.insert(target.into(), pkg);
        }
    }

    impl PackageLoader for TableLoader {
        fn load(&self, target: &str, _src_dir: &Path) -> Result<GoPackage> {
            self.packages
                .get(target)
                .cloned()
                .ok_or_else(|| Error::Resolution {
                    import: target.to_string(),
                    message: "cannot find package".to_string(),
                })
        }
    }

    fn pkg(import: &str, root: &Path, imports: &[&str]) -> GoPackage {
        GoPackage {
            import_path: import.to_string(),
            root: root.to_string_lossy().into_owned(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            ..GoPackage::default()
        }
    }

    fn write_go_file(dir: &Path) {
        fs::write(dir.join("main.go"), "package main\n").unwrap();
    }

    /// Fails every load as if `go` were not installed.
    struct NoToolchain;

    impl PackageLoader for NoToolchain {
        fn load(&self, _target: &str, _src_dir: &Path) -> Result<GoPackage> {
            Err(Error::Toolchain {
                program: "go".to_string(),
                message: "No such file or directory (os error 2)".to_string(),
            })
        }
    }

    fn std_pkg(import: &str) -> GoPackage {
        GoPackage {
            import_path: import.to_string(),
            goroot: true,
            standard: true,
            ..GoPackage::default()
        }
    }

    #[test]
    fn test_package_dirs_skips_hidden_underscore_and_vendor() {
        let temp = TempDir::new().unwrap();
        for dir in ["a/b", ".hidden/x", "_old/y", "vendor/z", "c"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let dirs = package_dirs(temp.path());
        let rel: Vec<String> = dirs
            .iter()
            .map(|d| d.strip_prefix(temp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(rel, vec!["", "a", "a/b", "c"]);
    }

    #[test]
    fn test_find_repo_root() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("github.com/user/repo/.git")).unwrap();
        fs::create_dir_all(src.join("github.com/user/repo/sub/pkg")).unwrap();

        assert_eq!(
            find_repo_root(Some(&src), "github.com/user/repo/sub/pkg"),
            "github.com/user/repo"
        );
        assert_eq!(
            find_repo_root(Some(&src), "example.com/none/here"),
            "example.com/none/here"
        );
        assert_eq!(find_repo_root(None, "example.com/x"), "example.com/x");
    }

    #[test]
    fn test_collect_transitive_roots() {
        let gopath = TempDir::new().unwrap();
        let src = gopath.path().join("src");
        let project = src.join("example.com/proj");
        fs::create_dir_all(project.join("cmd")).unwrap();
        fs::create_dir_all(src.join("github.com/a/lib/.git")).unwrap();
        fs::create_dir_all(src.join("github.com/b/util/.git")).unwrap();
        fs::create_dir_all(src.join("github.com/c/testdep/.git")).unwrap();
        write_go_file(&project);
        write_go_file(&project.join("cmd"));

        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();
        let project = std::path::absolute(&project).unwrap();
        let mut loader = TableLoader::default();
        loader.add(
            project.to_string_lossy(),
            GoPackage {
                test_imports: vec!["github.com/c/testdep".to_string()],
                ..pkg(
                    "example.com/proj",
                    gopath.path(),
                    &["fmt", "C", "github.com/a/lib/sub", "example.com/proj/cmd"],
                )
            },
        );
        loader.add(
            project.join("cmd").to_string_lossy(),
            pkg("example.com/proj/cmd", gopath.path(), &["example.com/proj"]),
        );
        loader.add(
            "example.com/proj/cmd",
            pkg("example.com/proj/cmd", gopath.path(), &[]),
        );
        loader.add("fmt", std_pkg("fmt"));
        loader.add(
            "github.com/a/lib/sub",
            pkg("github.com/a/lib/sub", gopath.path(), &["github.com/b/util", "os"]),
        );
        loader.add("os", std_pkg("os"));
        loader.add(
            "github.com/b/util",
            pkg("github.com/b/util", gopath.path(), &["github.com/a/lib/sub"]),
        );
        loader.add(
            "github.com/c/testdep",
            pkg("github.com/c/testdep", gopath.path(), &[]),
        );
        loader.add(
            "example.com/proj",
            pkg("example.com/proj", gopath.path(), &[]),
        );

        let names = collect_root_package_names(&roots, &loader, &project).unwrap();
        assert_eq!(
            names,
            vec!["github.com/a/lib", "github.com/b/util", "github.com/c/testdep"]
        );
    }

    #[test]
    fn test_collect_keeps_unresolvable_imports() {
        let gopath = TempDir::new().unwrap();
        let project = gopath.path().join("src/example.com/proj");
        fs::create_dir_all(&project).unwrap();
        write_go_file(&project);

        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();
        let project = std::path::absolute(&project).unwrap();
        let mut loader = TableLoader::default();
        loader.add(
            project.to_string_lossy(),
            pkg("example.com/proj", gopath.path(), &["example.com/gone/pkg"]),
        );

        let names = collect_root_package_names(&roots, &loader, &project).unwrap();
        assert_eq!(names, vec!["example.com/gone/pkg"]);
    }

    #[test]
    fn test_collect_empty_project() {
        let gopath = TempDir::new().unwrap();
        let project = gopath.path().join("src/example.com/empty");
        fs::create_dir_all(&project).unwrap();
        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();

        let names =
            collect_root_package_names(&roots, &TableLoader::default(), &project).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_collect_fails_when_toolchain_is_missing() {
        let gopath = TempDir::new().unwrap();
        let project = gopath.path().join("src/example.com/proj");
        fs::create_dir_all(&project).unwrap();
        write_go_file(&project);
        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();

        let err = collect_root_package_names(&roots, &NoToolchain, &project).unwrap_err();
        assert!(matches!(err, Error::Toolchain { .. }));
    }

    #[test]
    fn test_collect_skips_broken_project_package() {
        let gopath = TempDir::new().unwrap();
        let project = gopath.path().join("src/example.com/proj");
        fs::create_dir_all(project.join("broken")).unwrap();
        write_go_file(&project);
        write_go_file(&project.join("broken"));

        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();
        let project = std::path::absolute(&project).unwrap();
        let mut loader = TableLoader::default();
        loader.add(
            project.to_string_lossy(),
            pkg("example.com/proj", gopath.path(), &["example.com/gone/pkg"]),
        );

        let names = collect_root_package_names(&roots, &loader, &project).unwrap();
        assert_eq!(names, vec!["example.com/gone/pkg"]);
    }

    #[test]
    fn test_collect_ignores_directories_without_go_files() {
        let gopath = TempDir::new().unwrap();
        let project = gopath.path().join("src/example.com/docs");
        fs::create_dir_all(project.join("notes")).unwrap();
        fs::write(project.join("README.md"), "docs\n").unwrap();
        let roots = SourceRoots::new(vec![gopath.path().to_path_buf()]).unwrap();

        let names = collect_root_package_names(&roots, &NoToolchain, &project).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_has_go_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("pkg.go")).unwrap();
        assert!(!has_go_files(temp.path()));
        write_go_file(temp.path());
        assert!(has_go_files(temp.path()));
        assert!(!has_go_files(&temp.path().join("missing")));
    }

    #[test]
    fn test_go_package_deserializes_go_list_json() {
        let json = r#"{
            "Dir": "/go/src/github.com/a/lib",
            "ImportPath": "github.com/a/lib",
            "Root": "/go",
            "Imports": ["fmt", "github.com/b/util"],
            "TestImports": ["testing"],
            "XTestImports": ["github.com/a/lib"]
        }"#;
        let pkg: GoPackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.import_path, "github.com/a/lib");
        assert_eq!(pkg.root, "/go");
        assert!(!pkg.is_standard());
        assert_eq!(pkg.imports.len(), 2);
        assert_eq!(pkg.test_imports, vec!["testing"]);
        assert_eq!(pkg.xtest_imports, vec!["github.com/a/lib"]);
        assert_eq!(pkg.src_root(), Some(PathBuf::from("/go/src")));

        let std: GoPackage =
            serde_json::from_str(r#"{"ImportPath": "fmt", "Goroot": true, "Standard": true}"#)
                .unwrap();
        assert!(std.is_standard());

        let broken: GoPackage = serde_json::from_str(
            r#"{"ImportPath": "x/y", "Error": {"Err": "cannot find package"}}"#,
        )
        .unwrap();
        assert_eq!(broken.error.unwrap().err, "cannot find package");
    }
}
