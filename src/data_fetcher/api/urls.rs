//! Endpoint paths and URL building utilities

/// Team search and listing
pub const TEAMS_PATH: &str = "/teams";

/// Match search by date, league and team filters
pub const MATCHES_PATH: &str = "/matches";

/// Head-to-head listing for two team ids
pub const HEAD_TO_HEAD_PATH: &str = "/head-2-head";

/// Path of the match detail endpoint.
///
/// # Example
/// ```
/// use statline::data_fetcher::api::match_detail_path;
///
/// assert_eq!(match_detail_path(1234), "/matches/1234");
/// ```
pub fn match_detail_path(match_id: i64) -> String {
    format!("{MATCHES_PATH}/{match_id}")
}

/// Path of the per-match statistics endpoint.
///
/// # Example
/// ```
/// use statline::data_fetcher::api::statistics_path;
///
/// assert_eq!(statistics_path(1234), "/statistics/1234");
/// ```
pub fn statistics_path(match_id: i64) -> String {
    format!("/statistics/{match_id}")
}

/// Path of the season statistics endpoint for one team.
///
/// # Example
/// ```
/// use statline::data_fetcher::api::team_statistics_path;
///
/// assert_eq!(team_statistics_path(6), "/teams/statistics/6");
/// ```
pub fn team_statistics_path(team_id: i64) -> String {
    format!("{TEAMS_PATH}/statistics/{team_id}")
}

/// Path of the box-score endpoint.
pub fn box_score_path(match_id: i64) -> String {
    format!("/box-score/{match_id}")
}

/// Joins the configured API domain and an endpoint path.
///
/// # Example
/// ```
/// use statline::data_fetcher::api::build_url;
///
/// assert_eq!(build_url("https://api.example.com/", "/teams"), "https://api.example.com/teams");
/// assert_eq!(build_url("https://api.example.com", "teams"), "https://api.example.com/teams");
/// ```
pub fn build_url(api_domain: &str, path: &str) -> String {
    format!(
        "{}/{}",
        api_domain.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
