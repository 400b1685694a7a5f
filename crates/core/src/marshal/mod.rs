pub mod arguments;
pub mod host_array;
