pub mod media;
pub mod request;
pub mod response;
pub mod utils;
pub mod vertex;

pub use media::{Document, DocumentSource, resolve_mime_type};
pub use request::{GenerateContentRequest, GenerationOptions, Part, SafetyThreshold};
pub use response::{GenerateContentResponse, UsageMetadata};
pub use utils::{
    check_response_status, dump_file_name, handle_http_error, read_json_body, write_response_dump,
};
pub use vertex::VertexClient;
