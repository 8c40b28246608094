//! Data structures for contact records and the CRM wire contract.

pub mod api;
pub mod contact;

pub use api::{
    BatchCreateRequest, BatchUpdateRequest, BatchUpsertResponse, ContactProperties, PageCursor,
    Paging, SearchFilter, SearchFilterGroup, SearchRequest, SearchResponse, SearchResult,
    UpsertProperties, SEARCH_PROPERTIES,
};
pub use contact::ContactRecord;
