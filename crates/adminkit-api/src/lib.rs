// adminkit-api: the persistence boundary for adminkit (data + auth providers)

pub mod auth;
pub mod error;
pub mod memory;
pub mod params;
pub mod provider;
pub mod types;

pub use auth::{AuthProvider, MemoryAuthProvider, UserIdentity};
pub use error::Error;
pub use memory::MemoryDataProvider;
pub use params::{
    CreateParams, CreateResult, DeleteManyParams, DeleteManyResult, DeleteParams, DeleteResult,
    GetListParams, GetListResult, GetManyParams, GetManyReferenceParams, GetManyReferenceResult,
    GetManyResult, GetOneParams, GetOneResult, UpdateManyParams, UpdateManyResult, UpdateParams,
    UpdateResult, ValidUntil,
};
pub use provider::DataProvider;
pub use types::{FilterPayload, Identifier, PaginationPayload, Record, SortOrder, SortPayload};
