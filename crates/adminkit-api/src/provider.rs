use async_trait::async_trait;

use crate::error::Error;
use crate::params::{
    CreateParams, CreateResult, DeleteManyParams, DeleteManyResult, DeleteParams, DeleteResult,
    GetListParams, GetListResult, GetManyParams, GetManyReferenceParams, GetManyReferenceResult,
    GetManyResult, GetOneParams, GetOneResult, UpdateManyParams, UpdateManyResult, UpdateParams,
    UpdateResult,
};

/// The persistence boundary.
///
/// One async method per verb, each taking the resource name and typed
/// params. Implementations own transport, serialization and auth headers;
/// `adminkit-core` only relies on this contract.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_list(&self, resource: &str, params: GetListParams) -> Result<GetListResult, Error>;

    async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<GetOneResult, Error>;

    async fn get_many(&self, resource: &str, params: GetManyParams)
    -> Result<GetManyResult, Error>;

    async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<GetManyReferenceResult, Error>;

    async fn update(&self, resource: &str, params: UpdateParams) -> Result<UpdateResult, Error>;

    async fn update_many(
        &self,
        resource: &str,
        params: UpdateManyParams,
    ) -> Result<UpdateManyResult, Error>;

    async fn create(&self, resource: &str, params: CreateParams) -> Result<CreateResult, Error>;

    async fn delete(&self, resource: &str, params: DeleteParams) -> Result<DeleteResult, Error>;

    async fn delete_many(
        &self,
        resource: &str,
        params: DeleteManyParams,
    ) -> Result<DeleteManyResult, Error>;
}
