pub mod context;

pub use context::{
    make_span_with_request_id, request_context_middleware, RequestId, REQUEST_ID_HEADER,
    SESSION_ID_HEADER,
};
