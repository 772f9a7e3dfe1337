pub mod png;
pub mod timeline_json;
