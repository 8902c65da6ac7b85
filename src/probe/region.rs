//! Deployment region extraction from the platform routing header.

/// Routing header carrying `{client-region}:{function-region}:...`
pub const DEFAULT_REGION_HEADER: &str = "x-vercel-id";

/// Return the second `:`-separated segment of a routing header value.
///
/// A missing header, a value without `:`, or an empty second segment
/// yields `None`.
pub fn parse_region(header: Option<&str>) -> Option<String> {
    header?
        .split(':')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
