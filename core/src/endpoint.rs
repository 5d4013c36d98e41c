//! Mapping from normalized `/api/v3/...` paths to legacy backend paths.

/// Prefix of every normalized path.
pub const V3_PREFIX: &str = "/api/v3";

/// Known normalized bases and their legacy counterparts.
const ENDPOINT_MAP: &[(&str, &str)] = &[
    ("/api/v3/grades", "/grades"),
    ("/api/v3/custom-grades", "/custom-grades"),
    ("/api/v3/batches", "/batches"),
    ("/api/v3/batches/open", "/batches/open"),
    ("/api/v3/bundles", "/bundles"),
    ("/api/v3/boards", "/boards"),
    ("/api/v3/species", "/species"),
    ("/api/v3/thickness", "/thicknessValues"),
    ("/api/v3/suppliers", "/suppliers"),
    ("/api/v3/graders", "/graders"),
    ("/api/v3/markets", "/markets"),
    ("/api/v3/auth/login", "/auth/login"),
    ("/api/v3/auth/validate", "/auth/validate-token"),
    ("/api/v3/auth/register", "/auth/register"),
    ("/api/v3/defect-types", "/defect-types"),
    ("/api/v3/attributes", "/attributes"),
    ("/api/v3/system-properties", "/system-properties"),
    ("/api/v3/units", "/units"),
    ("/api/v3/dry-statuses", "/dryStatuses"),
    ("/api/v3/printers", "/printers"),
    ("/api/v3/feedback-categories", "/feedback-categories"),
];

fn lookup(base: &str) -> Option<&'static str> {
    ENDPOINT_MAP
        .iter()
        .find(|(v3, _)| *v3 == base)
        .map(|(_, legacy)| *legacy)
}

/// Translate a normalized path into the legacy path.
///
/// Multi-segment table entries (`/api/v3/auth/validate`) match exactly,
/// ignoring any query string. Otherwise the path is split into
/// `/api/v3/<segment>`, an optional numeric id segment and the remainder;
/// the base goes through the table (or loses its `/api/v3` prefix) and the
/// id and remainder are appended verbatim.
pub fn map_to_legacy_endpoint(path: &str) -> String {
    let (route, query) = match path.find('?') {
        Some(at) => path.split_at(at),
        None => (path, ""),
    };
    if let Some(legacy) = lookup(route) {
        return format!("{legacy}{query}");
    }

    match split_v3_path(path) {
        Some((base, id, rest)) => {
            let mapped = match lookup(base) {
                Some(legacy) => legacy.to_string(),
                None => strip_prefix(base),
            };
            format!("{mapped}{id}{rest}")
        }
        None => strip_prefix(path),
    }
}

/// Split `/api/v3/<segment>(/<digits>)?<rest>` into its three parts.
fn split_v3_path(path: &str) -> Option<(&str, &str, &str)> {
    let after_prefix = path.strip_prefix(V3_PREFIX)?.strip_prefix('/')?;
    let segment_len = after_prefix.find('/').unwrap_or(after_prefix.len());
    if segment_len == 0 {
        return None;
    }
    let base_len = V3_PREFIX.len() + 1 + segment_len;
    let (base, tail) = path.split_at(base_len);

    let id_len = tail
        .strip_prefix('/')
        .map(|rest| rest.bytes().take_while(u8::is_ascii_digit).count())
        .unwrap_or(0);
    // `/12abc` is not an id segment, `/12`, `/12/x` and `/12?q` are.
    let id_end = 1 + id_len;
    let id_is_segment = id_len > 0
        && tail[id_end..]
            .chars()
            .next()
            .map_or(true, |c| c == '/' || c == '?');
    let (id, rest) = if id_is_segment {
        tail.split_at(id_end)
    } else {
        ("", tail)
    };
    Some((base, id, rest))
}

fn strip_prefix(path: &str) -> String {
    path.replacen(V3_PREFIX, "", 1)
}
