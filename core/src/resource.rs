//! Classification of endpoints into resource kinds.

use std::fmt;

/// Bucket deciding which response transformer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Auth,
    CustomGrades,
    Grades,
    Batches,
    Boards,
    Bundles,
    Species,
    Thickness,
    Suppliers,
    Graders,
    Markets,
    Default,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Auth => "auth",
            ResourceKind::CustomGrades => "custom-grades",
            ResourceKind::Grades => "grades",
            ResourceKind::Batches => "batches",
            ResourceKind::Boards => "boards",
            ResourceKind::Bundles => "bundles",
            ResourceKind::Species => "species",
            ResourceKind::Thickness => "thickness",
            ResourceKind::Suppliers => "suppliers",
            ResourceKind::Graders => "graders",
            ResourceKind::Markets => "markets",
            ResourceKind::Default => "default",
        }
    }

    /// Kinds served by the shared lookup-data transformer.
    pub fn is_lookup(self) -> bool {
        matches!(
            self,
            ResourceKind::Species
                | ResourceKind::Thickness
                | ResourceKind::Suppliers
                | ResourceKind::Graders
                | ResourceKind::Markets
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path fragments checked in order; the first fragment contained in the
/// endpoint wins.
///
/// `/custom-grades` must stay ahead of `/grades`: the latter is a substring
/// of the former and would shadow it.
const PATTERNS: &[(&str, ResourceKind)] = &[
    ("/auth/", ResourceKind::Auth),
    ("/custom-grades", ResourceKind::CustomGrades),
    ("/grades", ResourceKind::Grades),
    ("/batches", ResourceKind::Batches),
    ("/boards", ResourceKind::Boards),
    ("/bundles", ResourceKind::Bundles),
    ("/species", ResourceKind::Species),
    ("/thickness", ResourceKind::Thickness),
    ("/suppliers", ResourceKind::Suppliers),
    ("/graders", ResourceKind::Graders),
    ("/markets", ResourceKind::Markets),
];

pub fn classify(endpoint: &str) -> ResourceKind {
    PATTERNS
        .iter()
        .find(|(fragment, _)| endpoint.contains(fragment))
        .map(|(_, kind)| *kind)
        .unwrap_or(ResourceKind::Default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_grades_is_never_shadowed_by_grades() {
        for endpoint in [
            "/api/v3/custom-grades",
            "/api/v3/custom-grades/4",
            "/api/v3/custom-grades?deleted=false",
            "/custom-grades",
        ] {
            assert_eq!(classify(endpoint), ResourceKind::CustomGrades, "{endpoint}");
        }
        assert_eq!(classify("/api/v3/grades/1"), ResourceKind::Grades);
    }

    #[test]
    fn first_match_wins() {
        // Boards of a batch are classified by the earlier `/batches` entry.
        assert_eq!(classify("/api/v3/batches/3/boards"), ResourceKind::Batches);
        assert_eq!(classify("/api/v3/auth/login"), ResourceKind::Auth);
    }

    #[test]
    fn auth_needs_trailing_slash() {
        assert_eq!(classify("/api/v3/auth"), ResourceKind::Default);
    }

    #[test]
    fn lookup_kinds() {
        assert_eq!(classify("/api/v3/thickness"), ResourceKind::Thickness);
        assert!(classify("/api/v3/markets").is_lookup());
        assert!(classify("/api/v3/species").is_lookup());
        assert!(!classify("/api/v3/boards").is_lookup());
    }

    #[test]
    fn unknown_is_default() {
        assert_eq!(classify("/api/v3/printers"), ResourceKind::Default);
        assert_eq!(ResourceKind::Default.to_string(), "default");
    }
}
