pub mod endpoints;
pub mod http_client;
pub mod request_client;
pub mod retry;
pub mod urls;

pub use endpoints::MatchQuery;
pub use http_client::create_http_client;
pub use request_client::{RequestClient, is_empty_payload};
pub use retry::{AttemptState, FailureClass, RetryMachine, RetryPolicy};
pub use urls::{
    build_url, box_score_path, match_detail_path, statistics_path, team_statistics_path,
};
