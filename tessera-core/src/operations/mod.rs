pub mod context;
pub mod get_operation;
pub mod kind;
pub mod ordering;
pub mod request;

pub use context::OperationContext;
pub use get_operation::{CompletedOperation, GetOperation, OperationHandle};
pub use kind::{BlobData, BlobInfo, BlobProperties, Payload, PayloadKind};
pub use ordering::order_candidates;
pub use request::{OperationRequest, OperationResponse};
