//! Package identity computation
//!
//! The identity is the reuse key for a packaged artifact. For header-only
//! recipes every build-profile dimension is irrelevant: any two builds that
//! agree on name, version and license collapse to the same identity no
//! matter which compiler, platform or build type asked for them.

use crate::metadata::PackageMetadata;

/// Build settings a consumer might declare. Ignored entirely for
/// header-only packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProfile {
    pub compiler: Option<String>,
    pub platform: Option<String>,
    pub build_type: Option<String>,
}

impl BuildProfile {
    pub fn is_empty(&self) -> bool {
        self.compiler.is_none() && self.platform.is_none() && self.build_type.is_none()
    }
}

/// Compute the identity of a package as a hex digest.
///
/// Pure function of the declared metadata; no failure modes. The canonical
/// encoding is labeled NUL-terminated fields so visually similar metadata
/// cannot collide.
pub fn compute_identity(
    metadata: &PackageMetadata,
    header_only: bool,
    profile: &BuildProfile,
) -> String {
    let mut bytes = Vec::new();

    push_field(&mut bytes, "name", &metadata.name);
    push_field(&mut bytes, "version", &metadata.version);
    push_field(&mut bytes, "license", &metadata.license.id);

    if !header_only {
        push_field(&mut bytes, "compiler", profile.compiler.as_deref().unwrap_or(""));
        push_field(&mut bytes, "platform", profile.platform.as_deref().unwrap_or(""));
        push_field(
            &mut bytes,
            "build_type",
            profile.build_type.as_deref().unwrap_or(""),
        );
    }

    blake3::hash(&bytes).to_hex().to_string()
}

fn push_field(bytes: &mut Vec<u8>, label: &str, value: &str) {
    bytes.extend_from_slice(label.as_bytes());
    bytes.push(b':');
    bytes.extend_from_slice(value.as_bytes());
    bytes.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::License;

    fn meta(name: &str, version: &str) -> PackageMetadata {
        PackageMetadata {
            name: name.to_string(),
            version: version.to_string(),
            license: License {
                id: "MIT".to_string(),
                url: None,
            },
            author: None,
            url: None,
            homepage: None,
            description: None,
            topics: Vec::new(),
        }
    }

    fn profile(compiler: &str, platform: &str, build_type: &str) -> BuildProfile {
        BuildProfile {
            compiler: Some(compiler.to_string()),
            platform: Some(platform.to_string()),
            build_type: Some(build_type.to_string()),
        }
    }

    #[test]
    fn test_header_only_collapses_profiles() {
        let m = meta("fioc", "1.0.0");
        let a = compute_identity(&m, true, &profile("gcc", "linux", "Release"));
        let b = compute_identity(&m, true, &profile("msvc", "windows", "Debug"));
        let c = compute_identity(&m, true, &BuildProfile::default());
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_non_header_only_keeps_profile() {
        let m = meta("fioc", "1.0.0");
        let a = compute_identity(&m, false, &profile("gcc", "linux", "Release"));
        let b = compute_identity(&m, false, &profile("clang", "linux", "Release"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_tracks_metadata() {
        let p = BuildProfile::default();
        let a = compute_identity(&meta("fioc", "1.0.0"), true, &p);
        let b = compute_identity(&meta("fioc", "1.0.1"), true, &p);
        let c = compute_identity(&meta("other", "1.0.0"), true, &p);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_labeled_fields_do_not_collide() {
        let p = BuildProfile::default();
        let a = compute_identity(&meta("ab", "c"), true, &p);
        let b = compute_identity(&meta("a", "bc"), true, &p);
        assert_ne!(a, b);
    }
}
