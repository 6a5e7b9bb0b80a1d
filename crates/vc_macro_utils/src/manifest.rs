use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's parsed `Cargo.toml`, used to find how a crate is reachable
/// from the code a proc-macro emits.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_mapper"));
/// ```
///
/// # Resolution rules
///
/// For `dependencies`, then `dev-dependencies`:
///
/// 1. A dependency with the requested name returns `::crate_name`.
/// 2. A renamed dependency (`alias = { package = "crate_name" }`) returns `::alias`.
/// 3. If the requested name begins with `vc_` and the caller depends on the
///    umbrella crate `vc_mapping`, return `::vc_mapping::short_name`
///    (e.g. `vc_mapper` -> `::vc_mapping::mapper`).
/// 4. Same as 3. for an umbrella dependency renamed to `vc`.
///
/// Otherwise, fall back to the absolute path `::crate_name`.
///
/// ## Note
///
/// Inside the requested crate itself the fallback is used, so that crate
/// should declare `extern crate self as crate_name;` in its root.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const UMBRELLA_NAME: &str = "vc_mapping";
const SHORT_UMBRELLA_NAME: &str = "vc";
const CRATE_PREFIX: &str = "vc_";

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR should be auto-defined by cargo.");
        let path = PathBuf::from(dir).join("Cargo.toml");
        assert!(
            path.exists(),
            "Cargo manifest does not exist at path {}",
            path.display(),
        );
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Document::parse(text)
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    fn path_of(segments: &[&str]) -> syn::Path {
        let text: String = segments.iter().map(|s| format!("::{s}")).collect();
        syn::parse_str(&text).unwrap_or_else(|_| panic!("`{text}` is not a valid path"))
    }

    /// The key under which `package` is listed, following `package = "..."` renames.
    fn dependency_key<'t>(deps: &'t Table, package: &str) -> Option<&'t str> {
        if deps.contains_key(package) {
            return Some(deps.key(package)?.get());
        }
        deps.iter().find_map(|(key, item)| {
            let renamed = item.get("package").and_then(|p| p.as_str());
            (renamed == Some(package)).then_some(key)
        })
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if let Some(key) = Self::dependency_key(deps, name) {
            return Some(Self::path_of(&[key]));
        }

        let module = name.strip_prefix(CRATE_PREFIX)?;
        if let Some(key) = Self::dependency_key(deps, UMBRELLA_NAME) {
            return Some(Self::path_of(&[key, module]));
        }
        if deps.contains_key(SHORT_UMBRELLA_NAME) {
            return Some(Self::path_of(&[SHORT_UMBRELLA_NAME, module]));
        }
        None
    }

    /// Return a [`syn::Path`] for the package named `name` as resolved from
    /// the caller's Cargo.toml. See the type documentation for the rules.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        ["dependencies", "dev-dependencies"]
            .into_iter()
            .filter_map(|section| match self.manifest.get(section) {
                Some(Item::Table(deps)) => Self::find_in_deps(deps, name),
                _ => None,
            })
            .next()
            .unwrap_or_else(|| Self::path_of(&[name]))
    }

    /// Run `func` with the caller's [`Manifest`].
    ///
    /// Manifests are cached per path and re-read only when the file's
    /// modification time changes. Callers should still resolve paths once per
    /// macro invocation and pass them around.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let manifest_path = Self::manifest_path();
        let modified_time = Self::modified_time(&manifest_path)
            .expect("The Cargo.toml should have a modified time.");

        {
            let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(manifest) = manifests.get(&manifest_path)
                && manifest.modified_time == modified_time
            {
                return func(manifest);
            }
        }

        let manifest = Manifest {
            manifest: Self::read(&manifest_path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_path, manifest);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::Manifest;
    use quote::ToTokens;
    use std::time::SystemTime;
    use toml_edit::Document;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: Document::parse(Box::<str>::from(text)).unwrap(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }

    fn resolve(text: &str, name: &str) -> String {
        manifest(text)
            .get_crate_path(name)
            .to_token_stream()
            .to_string()
            .replace(' ', "")
    }

    #[test]
    fn direct_dependency() {
        let text = "[dependencies]\nvc_mapper = \"0.0.1\"\n";
        assert_eq!(resolve(text, "vc_mapper"), "::vc_mapper");
    }

    #[test]
    fn renamed_dependency() {
        let text = "[dependencies]\nmapping = { package = \"vc_mapper\", version = \"0.0.1\" }\n";
        assert_eq!(resolve(text, "vc_mapper"), "::mapping");
    }

    #[test]
    fn umbrella_dependency() {
        let text = "[dependencies]\nvc_mapping = \"0.0.1\"\n";
        assert_eq!(resolve(text, "vc_mapper"), "::vc_mapping::mapper");

        let text = "[dev-dependencies]\nvc = { package = \"vc_mapping\", path = \"..\" }\n";
        assert_eq!(resolve(text, "vc_mapper"), "::vc::mapper");
    }

    #[test]
    fn fallback() {
        assert_eq!(resolve("[package]\nname = \"demo\"\n", "vc_mapper"), "::vc_mapper");
    }
}
