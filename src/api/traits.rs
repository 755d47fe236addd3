use crate::api::types::SearchResponse;
use crate::model::{ApiError, SearchRequest};

#[async_trait::async_trait]
pub trait FlightSearchApi: Send + Sync {
    async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, ApiError>;
}
